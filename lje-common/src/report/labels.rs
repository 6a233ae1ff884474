//! Jukebox label export
//!
//! One page per disc reference, one two-line block per track: artist, then
//! the title in capitals. Text is transliterated to characters every label
//! printer font carries.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{compare_positions, Record};

/// Largest number of discs exported in one document
pub const MAX_LABEL_DISCS: usize = 100;

const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
    ('\u{2022}', "*"),
    ('\u{2122}', "(TM)"),
    ('\u{00AE}', "(R)"),
    ('\u{00A9}', "(C)"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("No rows to print")]
    Empty,
    #[error("Too many discs for one label sheet: {count} (limit {limit})")]
    TooManyDiscs { count: usize, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelBlock {
    pub artist: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelPage {
    pub reference: String,
    pub blocks: Vec<LabelBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelDocument {
    pub pages: Vec<LabelPage>,
}

/// Replace typographic characters with plain equivalents
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out
}

/// Build label pages for `rows`, grouped by reference in ascending order
pub fn build_labels(rows: &[&Record]) -> Result<LabelDocument, LabelError> {
    if rows.is_empty() {
        return Err(LabelError::Empty);
    }

    let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for &row in rows {
        groups.entry(row.reference.as_str()).or_default().push(row);
    }
    if groups.len() > MAX_LABEL_DISCS {
        return Err(LabelError::TooManyDiscs {
            count: groups.len(),
            limit: MAX_LABEL_DISCS,
        });
    }

    let pages = groups
        .into_iter()
        .map(|(reference, mut tracks)| {
            tracks.sort_by(|a, b| compare_positions(a.position.as_deref(), b.position.as_deref()));
            LabelPage {
                reference: reference.to_string(),
                blocks: tracks
                    .iter()
                    .map(|t| LabelBlock {
                        artist: transliterate(&t.artist),
                        title: transliterate(&t.title.to_uppercase()),
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(LabelDocument { pages })
}

impl LabelDocument {
    /// Plain-text rendering: a header per page, form feed between pages
    pub fn render_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| {
                let mut text = format!("{}\n\n", page.reference);
                for block in &page.blocks {
                    text.push_str(&block.artist);
                    text.push('\n');
                    text.push_str(&block.title);
                    text.push_str("\n\n");
                }
                text
            })
            .collect::<Vec<_>>()
            .join("\u{000C}")
    }
}
