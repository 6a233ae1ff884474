//! CSV source tables: discs, titles and custom list files
//!
//! Headers are matched case-insensitively; spaces and hyphens count as
//! underscores, and `REFERENCE NUMBER` is accepted for `REFERENCE`.
//! Only the columns needed to join and normalize are required.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::hash::Hash;

use crate::{Error, Result};

/// Row of the discs table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscRow {
    pub reference: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub series: Option<String>,
    pub country: Option<String>,
    pub position: Option<String>,
}

/// Row of the titles table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TitleRow {
    pub reference: String,
    pub artist: String,
    pub title: String,
    pub position: Option<String>,
}

struct Columns {
    headers: Vec<String>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self {
            headers: headers.iter().map(canonical_header).collect(),
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        let aliases: &[&str] = match name {
            "REFERENCE" => &["REFERENCE", "REFERENCE_NUMBER"],
            other => return self.headers.iter().position(|h| h == other),
        };
        aliases
            .iter()
            .find_map(|alias| self.headers.iter().position(|h| h == alias))
    }

    fn require(&self, name: &str, table: &str) -> Result<usize> {
        self.find(name).ok_or_else(|| {
            Error::InvalidInput(format!("{} table is missing the {} column", table, name))
        })
    }
}

fn canonical_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .to_ascii_uppercase()
        .replace([' ', '-'], "_")
}

fn cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    let value = record.get(index?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Integer cell that tolerates float formatting such as `1988.0`
fn int_cell(record: &StringRecord, index: Option<usize>) -> Option<i64> {
    let raw = cell(record, index)?;
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(bytes)
}

/// Parse the discs table
///
/// `MONTH` falls back to the month encoded in the reference when the column
/// is absent or blank. Out-of-range months become `None`.
pub fn read_discs(bytes: &[u8]) -> Result<Vec<DiscRow>> {
    let mut rdr = reader(bytes);
    let columns = Columns::new(rdr.headers()?);
    let reference = columns.require("REFERENCE", "discs")?;
    let year = columns.find("YEAR");
    let month = columns.find("MONTH");
    let series = columns.find("SERIES");
    let country = columns.find("COUNTRY");
    let position = columns.find("POSITION");

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let Some(reference) = cell(&record, Some(reference)) else {
            continue;
        };
        let month = int_cell(&record, month)
            .and_then(|m| u32::try_from(m).ok())
            .or_else(|| crate::normalize::month_from_reference(&reference))
            .filter(|m| (1..=12).contains(m));
        rows.push(DiscRow {
            year: int_cell(&record, year).and_then(|y| i32::try_from(y).ok()),
            month,
            series: cell(&record, series),
            country: cell(&record, country),
            position: cell(&record, position),
            reference,
        });
    }
    Ok(rows)
}

/// Parse the titles table
pub fn read_titles(bytes: &[u8]) -> Result<Vec<TitleRow>> {
    let mut rdr = reader(bytes);
    let columns = Columns::new(rdr.headers()?);
    let reference = columns.require("REFERENCE", "titles")?;
    let artist = columns.require("ARTIST", "titles")?;
    let title = columns.require("TITLE", "titles")?;
    let position = columns.find("POSITION");

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let Some(reference) = cell(&record, Some(reference)) else {
            continue;
        };
        rows.push(TitleRow {
            reference,
            artist: cell(&record, Some(artist)).unwrap_or_default(),
            title: cell(&record, Some(title)).unwrap_or_default(),
            position: cell(&record, position),
        });
    }
    Ok(rows)
}

/// Parse the raw `REFERENCE` values of a list file, in file order
pub fn read_list_references(bytes: &[u8]) -> Result<Vec<String>> {
    let mut rdr = reader(bytes);
    let columns = Columns::new(rdr.headers()?);
    let reference = columns.require("REFERENCE", "list")?;

    let mut values = Vec::new();
    for record in rdr.records() {
        if let Some(value) = cell(&record?, Some(reference)) {
            values.push(value);
        }
    }
    Ok(values)
}

/// Write a single-column `REFERENCE` table
pub fn write_references<W, I, S>(writer: W, references: I) -> Result<()>
where
    W: std::io::Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["REFERENCE"])?;
    for reference in references {
        wtr.write_record([reference.as_ref()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Drop exact duplicates, keeping the first occurrence
pub fn dedup_rows<T: Clone + Eq + Hash>(rows: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter()
        .filter(|row| seen.insert(*row))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_discs_tolerant_headers_and_values() {
        let csv = "Reference Number,year,Month,SERIES,country,Position\n\
                   88.01.05A,1988.0,,Gold,US,1\n\
                   88.01.13B,,,,,\n\
                   ,1990,1,,,\n";
        let rows = read_discs(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].reference, "88.01.05A");
        assert_eq!(rows[0].year, Some(1988));
        // Month derived from the reference
        assert_eq!(rows[0].month, Some(5));
        assert_eq!(rows[0].series.as_deref(), Some("Gold"));
        assert_eq!(rows[0].position.as_deref(), Some("1"));
        assert_eq!(rows[1].year, None);
        assert_eq!(rows[1].month, None);
        assert_eq!(rows[1].country, None);
    }

    #[test]
    fn test_read_discs_explicit_month_wins() {
        let csv = "REFERENCE,MONTH\n88.01.05A,11\n88.01.05B,13\n";
        let rows = read_discs(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].month, Some(11));
        // 13 is not a month and the reference-encoded fallback is not used
        assert_eq!(rows[1].month, None);
    }

    #[test]
    fn test_read_discs_non_ascii_digits_in_reference() {
        let csv = "REFERENCE,YEAR\n88.01.\u{0966}\u{096B}A,1988\n88.01.05A,1988\n";
        let rows = read_discs(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, None);
        assert_eq!(rows[1].month, Some(5));
    }

    #[test]
    fn test_read_titles_requires_columns() {
        let err = read_titles("REFERENCE,ARTIST\nR1,A\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("TITLE"));
    }

    #[test]
    fn test_read_list_references_skips_blank() {
        let values = read_list_references("REFERENCE\nR1\n\nR2\n".as_bytes()).unwrap();
        assert_eq!(values, vec!["R1", "R2"]);
    }

    #[test]
    fn test_write_references_header() {
        let mut out = Vec::new();
        write_references(&mut out, ["R1", "R2"]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "REFERENCE\nR1\nR2\n");
    }

    #[test]
    fn test_dedup_rows_keeps_first() {
        let rows = vec![1, 2, 1, 3, 2];
        assert_eq!(dedup_rows(&rows), vec![1, 2, 3]);
    }
}
