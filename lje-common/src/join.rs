//! Discs/titles join and membership column attachment

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::model::{Record, Table};
use crate::source::{dedup_rows, DiscRow, TitleRow};

/// Inner join of discs and titles on reference
///
/// Exact-duplicate rows are removed from each side first. Rows without a
/// partner are dropped. When both sides carry a position they must agree.
pub fn join(discs: &[DiscRow], titles: &[TitleRow]) -> Table {
    let discs = dedup_rows(discs);
    let titles = dedup_rows(titles);

    let mut by_reference: HashMap<&str, Vec<&TitleRow>> = HashMap::new();
    for title in &titles {
        by_reference
            .entry(title.reference.as_str())
            .or_default()
            .push(title);
    }

    let mut rows = Vec::new();
    let mut unmatched_discs = 0usize;
    for disc in &discs {
        let Some(matches) = by_reference.get(disc.reference.as_str()) else {
            unmatched_discs += 1;
            continue;
        };
        for title in matches {
            if let (Some(a), Some(b)) = (&disc.position, &title.position) {
                if a != b {
                    continue;
                }
            }
            rows.push(Record {
                reference: disc.reference.clone(),
                series: disc.series.clone(),
                country: disc.country.clone(),
                year: disc.year,
                month: disc.month,
                position: title.position.clone().or_else(|| disc.position.clone()),
                artist: title.artist.clone(),
                title: title.title.clone(),
                memberships: BTreeMap::new(),
            });
        }
    }

    debug!(
        discs = discs.len(),
        titles = titles.len(),
        joined = rows.len(),
        unmatched_discs,
        "joined discs with titles"
    );

    Table {
        rows,
        list_columns: Vec::new(),
    }
}

/// Attach one boolean column per set; replaces previously attached columns
///
/// Existence test only: never adds or removes rows.
pub fn attach_memberships(table: &mut Table, sets: &BTreeMap<String, &BTreeSet<String>>) {
    table.list_columns = sets.keys().cloned().collect();
    for row in &mut table.rows {
        row.memberships = sets
            .iter()
            .map(|(name, set)| (name.clone(), set.contains(&row.reference)))
            .collect();
    }
}
