//! Explorer session controller
//!
//! One session is one user's working state: its own source cache, list
//! store, attached and restricting lists, and filter chain. Every command is
//! explicit; a view is always computed as prune, then offer, then apply.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::SourceCache;
use crate::config::{DataSources, TomlConfig};
use crate::filter::{FilterChain, StageView};
use crate::join::{attach_memberships, join};
use crate::lists::{Backing, LoadIssue, MembershipEdit, MembershipStore, PasteReport, CUSTOM_LIST};
use crate::model::{discs_only, Field, Record, RowOrder, Table};
use crate::normalize::Normalizer;
use crate::report::{build_labels, build_statistics, LabelDocument, LabelError, StatisticsReport};
use crate::source::{read_discs, read_titles, DiscRow, TitleRow};
use crate::{Error, Result};

/// Per-session behavior taken from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub filters: Vec<Field>,
    pub rotate: Option<Field>,
    pub top_n: usize,
}

impl SessionSettings {
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        Ok(Self {
            filters: config.filter_fields()?,
            rotate: config.rotation_field()?,
            top_n: config.top_n,
        })
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            filters: vec![Field::Country, Field::Year, Field::Artist, Field::Title, Field::Reference],
            rotate: Some(Field::Artist),
            top_n: crate::report::DEFAULT_TOP_N,
        }
    }
}

/// How the rows of a view are presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    pub order: RowOrder,
    /// One row per reference
    pub discs_only: bool,
}

/// A displayed row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    #[serde(flatten)]
    pub record: Record,
    pub date: Option<NaiveDate>,
}

impl From<&Record> for ViewRow {
    fn from(record: &Record) -> Self {
        Self {
            date: record.release_date(),
            record: record.clone(),
        }
    }
}

/// Everything the table page shows after one evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplorerView {
    pub stages: Vec<StageView>,
    pub list_columns: Vec<String>,
    pub rows: Vec<ViewRow>,
}

/// Membership checkbox change for one reference
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditEvent {
    pub reference: String,
    pub list: String,
    pub included: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditOutcome {
    Applied,
    Unchanged,
    /// The reference is not in the current view or the list is gone;
    /// nothing was changed
    Stale,
}

/// List overview for the list picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSummary {
    pub name: String,
    pub size: usize,
    pub backing: Backing,
    pub attached: bool,
    pub restricting: bool,
}

pub struct ExplorerSession {
    sources: DataSources,
    settings: SessionSettings,
    cache: SourceCache,
    normalizer: Normalizer,
    base: Table,
    lists: MembershipStore,
    load_issues: Vec<LoadIssue>,
    attached: Vec<String>,
    restriction: Vec<String>,
    chain: FilterChain,
}

fn clean_names(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_string();
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

fn load_tables(
    cache: &mut SourceCache,
    sources: &DataSources,
) -> Result<(Arc<Vec<DiscRow>>, Arc<Vec<TitleRow>>)> {
    for path in [&sources.discs, &sources.titles] {
        if !path.is_file() {
            return Err(Error::NotFound(format!("Source file {}", path.display())));
        }
    }
    let discs = cache.load(&sources.discs, read_discs)?;
    let titles = cache.load(&sources.titles, read_titles)?;
    Ok((discs, titles))
}

impl ExplorerSession {
    /// Load the sources and lists and start with no selections
    pub fn open(sources: DataSources, settings: SessionSettings) -> Result<Self> {
        let mut cache = SourceCache::new();
        let (discs, titles) = load_tables(&mut cache, &sources)?;
        let normalizer = Normalizer::new(discs.iter().map(|d| d.reference.as_str()));
        let base = join(&discs, &titles);
        let (lists, load_issues) = MembershipStore::load_all(&sources.lists_dir, &normalizer, &mut cache);

        info!(
            rows = base.len(),
            catalog = normalizer.catalog_len(),
            lists = lists.names().len(),
            "explorer session opened"
        );

        Ok(Self {
            chain: FilterChain::with_fields(&settings.filters, settings.rotate),
            sources,
            settings,
            cache,
            normalizer,
            base,
            lists,
            load_issues,
            attached: Vec::new(),
            restriction: Vec::new(),
        })
    }

    /// Re-read sources and list files
    ///
    /// Unchanged files come from the cache. Selections are kept and pruned
    /// against the new data on the next view. The `Custom` list survives;
    /// unsaved edits to file lists are replaced by the file contents.
    pub fn reload(&mut self) -> Result<()> {
        let (discs, titles) = load_tables(&mut self.cache, &self.sources)?;
        let normalizer = Normalizer::new(discs.iter().map(|d| d.reference.as_str()));
        let base = join(&discs, &titles);
        let (mut lists, load_issues) =
            MembershipStore::load_all(&self.sources.lists_dir, &normalizer, &mut self.cache);
        if let Some(custom) = self.lists.get(CUSTOM_LIST) {
            lists.insert(custom.clone());
        }

        self.normalizer = normalizer;
        self.base = base;
        self.lists = lists;
        self.load_issues = load_issues;

        debug!(
            hits = self.cache.hits(),
            misses = self.cache.misses(),
            rows = self.base.len(),
            "explorer session reloaded"
        );
        Ok(())
    }

    pub fn set_selection(&mut self, field: Field, values: Vec<String>) -> Result<()> {
        self.chain.select(field, values)
    }

    /// Lists shown as membership columns
    pub fn set_attached_lists(&mut self, names: Vec<String>) {
        self.attached = clean_names(names);
    }

    /// Lists whose union bounds the working table; empty means everything
    pub fn set_restriction(&mut self, names: Vec<String>) {
        self.restriction = clean_names(names);
    }

    pub fn attached_lists(&self) -> &[String] {
        &self.attached
    }

    pub fn restriction(&self) -> &[String] {
        &self.restriction
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn load_issues(&self) -> &[LoadIssue] {
        &self.load_issues
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    pub fn lists(&self) -> Vec<ListSummary> {
        self.lists
            .sets()
            .map(|set| ListSummary {
                name: set.name.clone(),
                size: set.references.len(),
                backing: set.backing.clone(),
                attached: self.attached.contains(&set.name),
                restricting: self.restriction.contains(&set.name),
            })
            .collect()
    }

    /// Joined rows, restricted and with the attached membership columns
    fn working_table(&self) -> Table {
        let mut table = self.base.clone();
        if !self.restriction.is_empty() {
            let allowed = self.lists.combine_union(&self.restriction);
            table.retain_references(|reference| allowed.contains(reference));
        }
        attach_memberships(&mut table, &self.lists.select(&self.attached));
        table
    }

    /// Filtered rows of `table` in `order`
    fn filtered<'a>(&mut self, table: &'a Table, order: RowOrder) -> (Vec<StageView>, Vec<&'a Record>) {
        let outcome = self.chain.evaluate(&table.rows);
        let mut rows: Vec<&Record> = outcome.rows.iter().map(|&i| &table.rows[i]).collect();
        order.sort(&mut rows);
        (outcome.stages, rows)
    }

    pub fn view(&mut self, options: ViewOptions) -> ExplorerView {
        let table = self.working_table();
        let (stages, mut rows) = self.filtered(&table, options.order);
        if options.discs_only {
            rows = discs_only(&rows);
        }

        ExplorerView {
            stages,
            list_columns: table.list_columns.clone(),
            rows: rows.into_iter().map(ViewRow::from).collect(),
        }
    }

    /// Apply checkbox edits in order
    ///
    /// Only references in the current filtered table can be edited; anything
    /// else is stale and leaves every list untouched.
    pub fn apply_edits(&mut self, events: Vec<EditEvent>) -> Vec<EditOutcome> {
        let table = self.working_table();
        let (_, rows) = self.filtered(&table, RowOrder::Disc);
        let visible: HashSet<&str> = rows.iter().map(|r| r.reference.as_str()).collect();

        let mut outcomes = vec![EditOutcome::Stale; events.len()];
        let mut edits = Vec::new();
        let mut slots = Vec::new();

        for (slot, event) in events.into_iter().enumerate() {
            if visible.contains(event.reference.trim()) {
                slots.push(slot);
                edits.push(MembershipEdit {
                    list: event.list,
                    reference: event.reference.trim().to_string(),
                    included: event.included,
                });
            } else {
                debug!(reference = %event.reference, "stale edit, reference not in view");
            }
        }

        for (slot, result) in slots.into_iter().zip(self.lists.apply_edits(&edits)) {
            outcomes[slot] = match result {
                Ok(true) => EditOutcome::Applied,
                Ok(false) => EditOutcome::Unchanged,
                Err(e) => {
                    debug!(error = %e, "stale edit");
                    EditOutcome::Stale
                }
            };
        }
        outcomes
    }

    /// Replace the `Custom` list with pasted references
    pub fn paste_custom(&mut self, text: &str) -> PasteReport {
        self.lists.replace_ephemeral(text, &self.normalizer)
    }

    pub fn save_list(&mut self, name: &str) -> Result<PathBuf> {
        self.lists.save(name)
    }

    /// Statistics over the current filtered rows
    pub fn statistics(&mut self) -> StatisticsReport {
        let table = self.working_table();
        let (_, rows) = self.filtered(&table, RowOrder::Date);
        build_statistics(&rows, &table.list_columns, self.settings.top_n)
    }

    /// Label sheet for the current filtered rows
    pub fn labels(&mut self) -> std::result::Result<LabelDocument, LabelError> {
        let table = self.working_table();
        let (_, rows) = self.filtered(&table, RowOrder::Disc);
        build_labels(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DISCS: &str = "REFERENCE,YEAR,COUNTRY,SERIES\n\
        88.01.05A,1988,US,Gold\n\
        89.07.30B,1989,UK,Gold\n\
        90.02.11,1990,US,Silver\n";

    const TITLES: &str = "REFERENCE,POSITION,ARTIST,TITLE\n\
        88.01.05A,1,Abba,Waterloo\n\
        88.01.05A,2,Blondie,Atomic\n\
        89.07.30B,1,Abba,SOS\n\
        90.02.11,1,Cher,Believe\n";

    fn fixture() -> (TempDir, DataSources) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("discs.csv"), DISCS).unwrap();
        fs::write(dir.path().join("titles.csv"), TITLES).unwrap();
        fs::create_dir(dir.path().join("lists")).unwrap();
        fs::write(dir.path().join("lists").join("owned.csv"), "REFERENCE\n88.01.05\n").unwrap();
        let sources = DataSources::in_folder(dir.path());
        (dir, sources)
    }

    fn references(view: &ExplorerView) -> Vec<&str> {
        view.rows.iter().map(|r| r.record.reference.as_str()).collect()
    }

    #[test]
    fn test_open_and_default_view() {
        let (_dir, sources) = fixture();
        let mut session = ExplorerSession::open(sources, SessionSettings::default()).unwrap();
        let view = session.view(ViewOptions::default());

        assert_eq!(references(&view), vec!["90.02.11", "89.07.30B", "88.01.05A", "88.01.05A"]);
        assert_eq!(view.stages.len(), 5);
        // Month comes from the third reference group when the column is absent
        assert_eq!(view.rows[0].date, NaiveDate::from_ymd_opt(1990, 11, 1));

        let names: Vec<_> = session.lists().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Custom", "Owned"]);
    }

    #[test]
    fn test_open_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = ExplorerSession::open(DataSources::in_folder(dir.path()), SessionSettings::default());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_discs_only_view() {
        let (_dir, sources) = fixture();
        let mut session = ExplorerSession::open(sources, SessionSettings::default()).unwrap();
        let view = session.view(ViewOptions {
            order: RowOrder::Disc,
            discs_only: true,
        });
        assert_eq!(references(&view), vec!["90.02.11", "89.07.30B", "88.01.05A"]);
    }

    #[test]
    fn test_restriction_and_attached_columns() {
        let (_dir, sources) = fixture();
        let mut session = ExplorerSession::open(sources, SessionSettings::default()).unwrap();
        session.set_attached_lists(vec!["Owned".into(), "Owned".into()]);
        session.set_restriction(vec!["Owned".into()]);
        let view = session.view(ViewOptions::default());

        assert_eq!(view.list_columns, vec!["Owned"]);
        assert_eq!(references(&view), vec!["88.01.05A", "88.01.05A"]);
        assert!(view.rows.iter().all(|r| r.record.in_list("Owned")));

        session.set_restriction(Vec::new());
        assert_eq!(session.view(ViewOptions::default()).rows.len(), 4);
    }

    fn edit(reference: &str, list: &str) -> EditEvent {
        EditEvent {
            reference: reference.into(),
            list: list.into(),
            included: true,
        }
    }

    #[test]
    fn test_edits_target_references_in_view() {
        let (_dir, sources) = fixture();
        let mut session = ExplorerSession::open(sources, SessionSettings::default()).unwrap();
        session.set_attached_lists(vec![CUSTOM_LIST.into()]);

        let outcomes = session.apply_edits(vec![
            edit("90.02.11", CUSTOM_LIST),
            edit(" 90.02.11 ", CUSTOM_LIST),
            edit("99.99.99", CUSTOM_LIST),
            edit("89.07.30B", "Nope"),
        ]);
        assert_eq!(
            outcomes,
            vec![EditOutcome::Applied, EditOutcome::Unchanged, EditOutcome::Stale, EditOutcome::Stale]
        );

        let view = session.view(ViewOptions::default());
        assert!(view.rows[0].record.in_list(CUSTOM_LIST));
        assert!(!view.rows[1].record.in_list(CUSTOM_LIST));
    }

    #[test]
    fn test_edit_after_refilter_is_stale() {
        let (_dir, sources) = fixture();
        let mut session = ExplorerSession::open(sources, SessionSettings::default()).unwrap();
        let first = session.view(ViewOptions::default());
        let clicked = first.rows[0].record.reference.clone();
        assert_eq!(clicked, "90.02.11");

        session.set_selection(Field::Country, vec!["UK".into()]).unwrap();
        let second = session.view(ViewOptions::default());
        assert_eq!(references(&second), vec!["89.07.30B"]);

        let outcomes = session.apply_edits(vec![edit(&clicked, CUSTOM_LIST)]);
        assert_eq!(outcomes, vec![EditOutcome::Stale]);
        assert!(session.lists.get(CUSTOM_LIST).unwrap().references.is_empty());

        let outcomes = session.apply_edits(vec![edit("89.07.30B", CUSTOM_LIST)]);
        assert_eq!(outcomes, vec![EditOutcome::Applied]);
        let custom: Vec<_> = session.lists.get(CUSTOM_LIST).unwrap().references.iter().cloned().collect();
        assert_eq!(custom, vec!["89.07.30B"]);
    }

    #[test]
    fn test_paste_and_selection() {
        let (_dir, sources) = fixture();
        let mut session = ExplorerSession::open(sources, SessionSettings::default()).unwrap();
        let report = session.paste_custom("890730b\nbogus\n");
        assert_eq!(report.accepted, 1);
        assert_eq!(report.errors.len(), 1);

        session.set_restriction(vec![CUSTOM_LIST.into()]);
        session.set_selection(Field::Artist, vec!["Abba".into()]).unwrap();
        let view = session.view(ViewOptions::default());
        assert_eq!(references(&view), vec!["89.07.30B"]);

        assert!(session.set_selection(Field::Month, vec!["1".into()]).is_err());
    }

    #[test]
    fn test_statistics_and_labels_use_filtered_rows() {
        let (_dir, sources) = fixture();
        let mut session = ExplorerSession::open(sources, SessionSettings::default()).unwrap();
        session.set_selection(Field::Country, vec!["US".into()]).unwrap();

        let stats = session.statistics();
        assert_eq!(stats.summary[3].total, 2);

        let labels = session.labels().unwrap();
        let pages: Vec<_> = labels.pages.iter().map(|p| p.reference.as_str()).collect();
        assert_eq!(pages, vec!["88.01.05A", "90.02.11"]);

        session.set_restriction(vec![CUSTOM_LIST.into()]);
        assert_eq!(session.labels(), Err(LabelError::Empty));
    }

    #[test]
    fn test_save_list_round_trip() {
        let (dir, sources) = fixture();
        let mut session = ExplorerSession::open(sources, SessionSettings::default()).unwrap();
        session.apply_edits(vec![edit("90.02.11", "Owned")]);
        session.save_list("Owned").unwrap();

        let written = fs::read_to_string(dir.path().join("lists").join("owned.csv")).unwrap();
        assert_eq!(written, "REFERENCE\n88.01.05A\n90.02.11\n");
        assert!(matches!(session.save_list(CUSTOM_LIST), Err(Error::InvalidInput(_))));
    }
}
