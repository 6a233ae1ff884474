//! Reference identifier normalization against the disc catalog
//!
//! References are date coded: three groups of ASCII digits, `YY.NN.MMxx`, where
//! the first group is the year, the second a running number and the third
//! starts with the month and may run longer. An optional suffix tells apart
//! units sharing a date code, e.g. `88.01.05A`.
//! User input may drop the separators or mistype the suffix. The catalog is
//! authoritative for suffixes, the input is trusted for the numeric prefix.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static DATE_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]{2})[.\-/ ]?([0-9]{2})[.\-/ ]?([0-9]{2,})(.*)$").expect("valid date-code regex")
});

/// Split a raw reference into its canonical numeric prefix and trimmed suffix
pub fn split_reference(raw: &str) -> Option<(String, String)> {
    let caps = DATE_CODE.captures(raw)?;
    let prefix = format!("{}.{}.{}", &caps[1], &caps[2], &caps[3]);
    let suffix = caps[4].trim().to_string();
    Some((prefix, suffix))
}

/// Month encoded in the leading two digits of the third date-code group
///
/// Returns `None` when the reference is not date coded or the digits fall
/// outside 1–12.
pub fn month_from_reference(reference: &str) -> Option<u32> {
    let caps = DATE_CODE.captures(reference)?;
    let month: u32 = caps[3].get(..2)?.parse().ok()?;
    (1..=12).contains(&month).then_some(month)
}

/// How the caller wants unmatched input reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Only catalog references are returned; anything else is `None`
    Strict,
    /// Unmatched input comes back in its own (rebuilt or raw) form
    Permissive,
}

/// Outcome of resolving one raw reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Resolved to a reference present in the catalog
    Catalog(String),
    /// Date code parsed but no catalog entry shares the prefix
    Unmatched(String),
    /// Input is not date coded
    Invalid,
}

/// Immutable snapshot of catalog references indexed by numeric prefix
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    /// prefix -> (reference, suffix) in catalog order
    by_prefix: HashMap<String, Vec<(String, String)>>,
    known: HashSet<String>,
}

impl Normalizer {
    /// Build from catalog references in catalog order
    pub fn new<I, S>(catalog: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_prefix: HashMap<String, Vec<(String, String)>> = HashMap::new();
        let mut known = HashSet::new();
        for reference in catalog {
            let reference = reference.as_ref().trim();
            if reference.is_empty() || !known.insert(reference.to_string()) {
                continue;
            }
            if let Some((prefix, suffix)) = split_reference(reference) {
                by_prefix
                    .entry(prefix)
                    .or_default()
                    .push((reference.to_string(), suffix));
            }
        }
        Self { by_prefix, known }
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.known.contains(reference)
    }

    pub fn catalog_len(&self) -> usize {
        self.known.len()
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        let trimmed = raw.trim();
        if self.known.contains(trimmed) {
            return Resolution::Catalog(trimmed.to_string());
        }
        let Some((prefix, suffix)) = split_reference(raw) else {
            return Resolution::Invalid;
        };
        let rebuilt = format!("{}{}", prefix, suffix);
        if self.known.contains(&rebuilt) {
            return Resolution::Catalog(rebuilt);
        }

        match self.by_prefix.get(&prefix) {
            Some(candidates) => {
                let same_suffix = candidates
                    .iter()
                    .find(|(_, own)| own.eq_ignore_ascii_case(&suffix));
                // Catalog wins on the suffix; first entry when nothing lines up
                match same_suffix.or_else(|| candidates.first()) {
                    Some((reference, _)) => Resolution::Catalog(reference.clone()),
                    None => Resolution::Unmatched(rebuilt),
                }
            }
            None => Resolution::Unmatched(rebuilt),
        }
    }

    pub fn normalize(&self, raw: &str, strictness: Strictness) -> Option<String> {
        match (self.resolve(raw), strictness) {
            (Resolution::Catalog(reference), _) => Some(reference),
            (_, Strictness::Strict) => None,
            (Resolution::Unmatched(own), Strictness::Permissive) => Some(own),
            (Resolution::Invalid, Strictness::Permissive) => Some(raw.to_string()),
        }
    }
}
