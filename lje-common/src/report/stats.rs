//! Statistics over a filtered view
//!
//! Counts are computed for the whole view and for each attached list's
//! subset (rows whose membership column is true).

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::Record;

/// Default length of the ranked tables
pub const DEFAULT_TOP_N: usize = 25;

/// The four headline counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub unique_artists: usize,
    /// Distinct (artist, title) pairs
    pub unique_songs: usize,
    /// Rows
    pub total_songs: usize,
    /// Distinct references
    pub total_discs: usize,
}

impl Counts {
    pub fn of<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut artists = HashSet::new();
        let mut songs = HashSet::new();
        let mut discs = HashSet::new();
        let mut total_songs = 0;
        for row in rows {
            artists.insert(row.artist.as_str());
            songs.insert((row.artist.as_str(), row.title.as_str()));
            discs.insert(row.reference.as_str());
            total_songs += 1;
        }
        Self {
            unique_artists: artists.len(),
            unique_songs: songs.len(),
            total_songs,
            total_discs: discs.len(),
        }
    }
}

/// One summary line, e.g. "Unique Artists"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub statistic: &'static str,
    pub total: usize,
    pub lists: BTreeMap<String, usize>,
}

/// Counts for one group key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub total: Counts,
    pub lists: BTreeMap<String, Counts>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedArtist {
    pub rank: usize,
    pub artist: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedSong {
    pub rank: usize,
    pub artist: String,
    pub title: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsReport {
    pub summary: Vec<SummaryRow>,
    pub by_country: Vec<GroupCounts>,
    pub by_year: Vec<GroupCounts>,
    pub by_country_year: Vec<GroupCounts>,
    pub top_artists: Vec<RankedArtist>,
    pub top_songs: Vec<RankedSong>,
}

fn summary(rows: &[&Record], lists: &[String]) -> Vec<SummaryRow> {
    let total = Counts::of(rows.iter().copied());
    let per_list: Vec<(String, Counts)> = lists
        .iter()
        .map(|name| {
            let counts = Counts::of(rows.iter().copied().filter(|r| r.in_list(name)));
            (name.clone(), counts)
        })
        .collect();

    let line = |statistic: &'static str, pick: fn(&Counts) -> usize| SummaryRow {
        statistic,
        total: pick(&total),
        lists: per_list
            .iter()
            .map(|(name, counts)| (name.clone(), pick(counts)))
            .collect(),
    };

    vec![
        line("Unique Artists", |c| c.unique_artists),
        line("Unique Songs", |c| c.unique_songs),
        line("Total Songs", |c| c.total_songs),
        line("Total Discs", |c| c.total_discs),
    ]
}

fn grouped<K, F>(rows: &[&Record], lists: &[String], key: F) -> BTreeMap<K, GroupCounts>
where
    K: Ord + Clone,
    F: Fn(&Record) -> (K, Option<String>, Option<i32>),
{
    let mut members: BTreeMap<K, (Option<String>, Option<i32>, Vec<&Record>)> = BTreeMap::new();
    for &row in rows {
        let (k, country, year) = key(row);
        members
            .entry(k)
            .or_insert_with(|| (country, year, Vec::new()))
            .2
            .push(row);
    }

    members
        .into_iter()
        .map(|(k, (country, year, group))| {
            let lists = lists
                .iter()
                .map(|name| {
                    let counts = Counts::of(group.iter().copied().filter(|r| r.in_list(name)));
                    (name.clone(), counts)
                })
                .collect();
            let counts = GroupCounts {
                country,
                year,
                total: Counts::of(group.iter().copied()),
                lists,
            };
            (k, counts)
        })
        .collect()
}

fn year_desc_nulls_last(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Count occurrences and assign competition ("min") ranks
///
/// Ties share the lowest rank of the tie group and are ordered by key.
fn ranked<K: Ord + Clone + std::hash::Hash>(keys: impl Iterator<Item = K>, limit: usize) -> Vec<(usize, K, usize)> {
    let mut counts: HashMap<K, usize> = HashMap::new();
    for k in keys {
        *counts.entry(k).or_default() += 1;
    }
    let mut entries: Vec<(K, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut out = Vec::with_capacity(entries.len().min(limit));
    let mut rank = 0;
    let mut previous = None;
    for (position, (key, count)) in entries.into_iter().enumerate().take(limit) {
        if previous != Some(count) {
            rank = position + 1;
            previous = Some(count);
        }
        out.push((rank, key, count));
    }
    out
}

/// Build the full report for `rows` with the attached `lists`
pub fn build_statistics(rows: &[&Record], lists: &[String], top_n: usize) -> StatisticsReport {
    let by_country: Vec<GroupCounts> = grouped(rows, lists, |r| {
        (r.country.clone(), r.country.clone(), None)
    })
    .into_values()
    .collect();

    let mut by_year: Vec<GroupCounts> = grouped(rows, lists, |r| (r.year, None, r.year))
        .into_values()
        .collect();
    by_year.sort_by(|a, b| year_desc_nulls_last(a.year, b.year));

    let mut by_country_year: Vec<GroupCounts> = grouped(rows, lists, |r| {
        ((r.country.clone(), r.year), r.country.clone(), r.year)
    })
    .into_values()
    .collect();
    by_country_year.sort_by(|a, b| {
        year_desc_nulls_last(a.year, b.year).then_with(|| a.country.cmp(&b.country))
    });

    let top_artists = ranked(rows.iter().map(|r| r.artist.clone()), top_n)
        .into_iter()
        .map(|(rank, artist, count)| RankedArtist { rank, artist, count })
        .collect();

    let top_songs = ranked(
        rows.iter().map(|r| (r.artist.clone(), r.title.clone())),
        top_n,
    )
    .into_iter()
    .map(|(rank, (artist, title), count)| RankedSong {
        rank,
        artist,
        title,
        count,
    })
    .collect();

    StatisticsReport {
        summary: summary(rows, lists),
        by_country,
        by_year,
        by_country_year,
        top_artists,
        top_songs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::record;

    fn sample() -> Vec<Record> {
        let mut rows = vec![
            record("R1", "Abba", "Waterloo", Some(1974)),
            record("R1", "Abba", "SOS", Some(1974)),
            record("R2", "Abba", "Waterloo", Some(1975)),
            record("R3", "Blondie", "Atomic", Some(1975)),
            record("R4", "Cher", "Believe", None),
        ];
        let countries = ["SE", "SE", "UK", "US", "US"];
        for (row, country) in rows.iter_mut().zip(countries) {
            row.country = Some(country.to_string());
        }
        rows[0].memberships.insert("Owned".into(), true);
        rows[1].memberships.insert("Owned".into(), true);
        rows[3].memberships.insert("Owned".into(), true);
        rows
    }

    #[test]
    fn test_summary_totals_and_list_columns() {
        let data = sample();
        let rows: Vec<&Record> = data.iter().collect();
        let report = build_statistics(&rows, &["Owned".to_string()], DEFAULT_TOP_N);

        let values: Vec<(&str, usize, usize)> = report
            .summary
            .iter()
            .map(|s| (s.statistic, s.total, s.lists["Owned"]))
            .collect();
        assert_eq!(
            values,
            vec![
                ("Unique Artists", 3, 2),
                ("Unique Songs", 4, 3),
                ("Total Songs", 5, 3),
                ("Total Discs", 4, 2),
            ]
        );
    }

    #[test]
    fn test_grouped_ordering() {
        let data = sample();
        let rows: Vec<&Record> = data.iter().collect();
        let report = build_statistics(&rows, &[], DEFAULT_TOP_N);

        let countries: Vec<_> = report.by_country.iter().map(|g| g.country.clone().unwrap()).collect();
        assert_eq!(countries, vec!["SE", "UK", "US"]);
        assert_eq!(report.by_country[0].total.total_discs, 1);

        let years: Vec<_> = report.by_year.iter().map(|g| g.year).collect();
        assert_eq!(years, vec![Some(1975), Some(1974), None]);
        assert_eq!(report.by_year[0].total.total_discs, 2);

        let pairs: Vec<_> = report
            .by_country_year
            .iter()
            .map(|g| (g.year, g.country.as_deref().unwrap()))
            .collect();
        assert_eq!(
            pairs,
            vec![(Some(1975), "UK"), (Some(1975), "US"), (Some(1974), "SE"), (None, "US")]
        );
    }

    #[test]
    fn test_ranks_share_minimum_on_ties() {
        let data = sample();
        let rows: Vec<&Record> = data.iter().collect();
        let report = build_statistics(&rows, &[], DEFAULT_TOP_N);

        let artists: Vec<_> = report
            .top_artists
            .iter()
            .map(|r| (r.rank, r.artist.as_str(), r.count))
            .collect();
        assert_eq!(artists, vec![(1, "Abba", 3), (2, "Blondie", 1), (2, "Cher", 1)]);

        let songs: Vec<_> = report
            .top_songs
            .iter()
            .map(|r| (r.rank, r.title.as_str()))
            .collect();
        assert_eq!(songs, vec![(1, "Waterloo"), (2, "SOS"), (2, "Atomic"), (2, "Believe")]);
    }

    #[test]
    fn test_top_n_limit() {
        let data = sample();
        let rows: Vec<&Record> = data.iter().collect();
        let report = build_statistics(&rows, &[], 2);
        assert_eq!(report.top_artists.len(), 2);
        assert_eq!(report.top_songs.len(), 2);
    }

    #[test]
    fn test_empty_view() {
        let report = build_statistics(&[], &["Owned".to_string()], DEFAULT_TOP_N);
        assert!(report.summary.iter().all(|s| s.total == 0 && s.lists["Owned"] == 0));
        assert!(report.by_year.is_empty());
        assert!(report.top_artists.is_empty());
    }
}
