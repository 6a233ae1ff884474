//! Joined catalog records and the fields the explorer filters on

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// One row of the joined discs/titles table
///
/// A reference may appear on many rows (one per track position), so
/// `reference` alone is not a row key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub reference: String,
    pub series: Option<String>,
    pub country: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub position: Option<String>,
    pub artist: String,
    pub title: String,
    /// Derived membership columns, one per attached list
    #[serde(default)]
    pub memberships: BTreeMap<String, bool>,
}

impl Record {
    /// String value of `field` as offered in filter options, `None` when missing
    pub fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::Reference => non_empty(&self.reference),
            Field::Series => self.series.as_deref().and_then(non_empty),
            Field::Country => self.country.as_deref().and_then(non_empty),
            Field::Year => self.year.map(|y| y.to_string()),
            Field::Month => self.month.map(|m| m.to_string()),
            Field::Position => self.position.as_deref().and_then(non_empty),
            Field::Artist => non_empty(&self.artist),
            Field::Title => non_empty(&self.title),
        }
    }

    /// First day of the release month (January when the month is unknown)
    pub fn release_date(&self) -> Option<NaiveDate> {
        let year = self.year?;
        NaiveDate::from_ymd_opt(year, self.month.unwrap_or(1), 1)
    }

    /// Whether this row belongs to the attached list `name`
    pub fn in_list(&self, name: &str) -> bool {
        self.memberships.get(name).copied().unwrap_or(false)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Filterable record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Reference,
    Series,
    Country,
    Year,
    Month,
    Position,
    Artist,
    Title,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Reference,
        Field::Series,
        Field::Country,
        Field::Year,
        Field::Month,
        Field::Position,
        Field::Artist,
        Field::Title,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Reference => "reference",
            Field::Series => "series",
            Field::Country => "country",
            Field::Year => "year",
            Field::Month => "month",
            Field::Position => "position",
            Field::Artist => "artist",
            Field::Title => "title",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown field: {}", s)))
    }
}

/// Working table: joined rows plus the names of attached membership columns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub rows: Vec<Record>,
    pub list_columns: Vec<String>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only rows whose reference passes `keep`
    pub fn retain_references<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.rows.retain(|row| keep(&row.reference));
    }
}

/// Final row ordering of a view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowOrder {
    /// Year desc, month desc, reference asc, position asc
    #[default]
    Date,
    /// Year desc, reference asc, position asc
    Disc,
}

impl RowOrder {
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let by_year = desc_nulls_last(a.year, b.year);
        let rest = || {
            a.reference
                .cmp(&b.reference)
                .then_with(|| compare_positions(a.position.as_deref(), b.position.as_deref()))
        };
        match self {
            RowOrder::Date => by_year
                .then_with(|| desc_nulls_last(a.month, b.month))
                .then_with(rest),
            RowOrder::Disc => by_year.then_with(rest),
        }
    }

    /// Stable sort of `rows` in this order
    pub fn sort(&self, rows: &mut [&Record]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }
}

fn desc_nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Numeric comparison when both positions are integers, text otherwise; missing last
pub fn compare_positions(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.cmp(b),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Disc-level view: first row per reference, input order preserved
pub fn discs_only<'a>(rows: &[&'a Record]) -> Vec<&'a Record> {
    let mut seen = HashSet::new();
    rows.iter()
        .copied()
        .filter(|row| seen.insert(row.reference.as_str()))
        .collect()
}
