//! Custom lists: named sets of catalog references
//!
//! File-backed lists are discovered from a directory of CSV files, each with a
//! `REFERENCE` column. One ephemeral list (`Custom`) holds pasted references
//! for the current session only.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::cache::SourceCache;
use crate::normalize::{Normalizer, Strictness};
use crate::source::{read_list_references, write_references};
use crate::{Error, Result};

/// Name of the session-only list fed by paste and inline edits
pub const CUSTOM_LIST: &str = "Custom";

/// OS metadata files that are never lists
const IGNORED_FILES: &[&str] = &["thumbs.db", "desktop.ini"];

/// Where a list is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Backing {
    File(PathBuf),
    Ephemeral,
}

/// A named set of references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSet {
    pub name: String,
    pub references: BTreeSet<String>,
    pub backing: Backing,
}

impl MembershipSet {
    pub fn ephemeral(name: &str) -> Self {
        Self {
            name: name.to_string(),
            references: BTreeSet::new(),
            backing: Backing::Ephemeral,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        self.backing == Backing::Ephemeral
    }
}

/// A list file that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadIssue {
    pub path: PathBuf,
    pub message: String,
}

/// Pasted line that did not normalize to a catalog reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasteLineError {
    /// 1-based line number in the pasted text
    pub line_number: usize,
    pub input: String,
}

/// Result of replacing the ephemeral list from pasted text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PasteReport {
    /// Distinct references now in the list
    pub accepted: usize,
    pub errors: Vec<PasteLineError>,
}

/// One membership change for a concrete reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEdit {
    pub list: String,
    pub reference: String,
    pub included: bool,
}

/// In-memory collection of lists, owned by one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipStore {
    sets: BTreeMap<String, MembershipSet>,
}

impl Default for MembershipStore {
    fn default() -> Self {
        let mut sets = BTreeMap::new();
        sets.insert(CUSTOM_LIST.to_string(), MembershipSet::ephemeral(CUSTOM_LIST));
        Self { sets }
    }
}

/// Display name from a list file stem: `owned_discs` becomes `Owned Discs`
pub fn display_name(stem: &str) -> String {
    stem.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn is_list_file(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if file_name.starts_with('.') || IGNORED_FILES.contains(&file_name.to_ascii_lowercase().as_str()) {
        return false;
    }
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

impl MembershipStore {
    /// Discover and load every list file in `directory`
    ///
    /// File contents go through `cache`; only the normalization is redone
    /// for unchanged files. Unreadable or malformed files are skipped and
    /// reported. The `Custom` list is always present and starts empty. A
    /// missing directory yields only `Custom`.
    pub fn load_all(
        directory: &Path,
        normalizer: &Normalizer,
        cache: &mut SourceCache,
    ) -> (Self, Vec<LoadIssue>) {
        let mut store = Self::default();
        let mut issues = Vec::new();

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %directory.display(), error = %e, "list directory not readable, no file lists loaded");
                return (store, issues);
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_list_file(p))
            .collect();
        paths.sort();

        for path in paths {
            match Self::load_file(&path, normalizer, cache) {
                Ok(set) => {
                    debug!(list = %set.name, references = set.references.len(), "loaded list");
                    if store.sets.contains_key(&set.name) {
                        warn!(list = %set.name, path = %path.display(), "duplicate list name, keeping the first");
                        issues.push(LoadIssue {
                            path,
                            message: format!("List name '{}' already loaded", set.name),
                        });
                        continue;
                    }
                    store.sets.insert(set.name.clone(), set);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping list file");
                    issues.push(LoadIssue {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        (store, issues)
    }

    fn load_file(path: &Path, normalizer: &Normalizer, cache: &mut SourceCache) -> Result<MembershipSet> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidInput(format!("Bad list file name: {}", path.display())))?;
        let references = cache
            .load(path, read_list_references)?
            .iter()
            .filter_map(|raw| normalizer.normalize(raw, Strictness::Permissive))
            .collect();
        Ok(MembershipSet {
            name: display_name(stem),
            references,
            backing: Backing::File(path.to_path_buf()),
        })
    }

    /// Insert or replace a list
    pub fn insert(&mut self, set: MembershipSet) {
        self.sets.insert(set.name.clone(), set);
    }

    pub fn get(&self, name: &str) -> Option<&MembershipSet> {
        self.sets.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.sets.keys().cloned().collect()
    }

    pub fn sets(&self) -> impl Iterator<Item = &MembershipSet> {
        self.sets.values()
    }

    /// The chosen lists by name; unknown names are skipped
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> BTreeMap<String, &BTreeSet<String>> {
        let mut chosen = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            match self.sets.get(name) {
                Some(set) => {
                    chosen.insert(set.name.clone(), &set.references);
                }
                None => warn!(list = %name, "ignoring unknown list"),
            }
        }
        chosen
    }

    /// Union of the chosen lists
    pub fn combine_union<S: AsRef<str>>(&self, names: &[S]) -> BTreeSet<String> {
        self.select(names)
            .into_values()
            .flat_map(|set| set.iter().cloned())
            .collect()
    }

    /// Replace the `Custom` list with the references pasted in `text`
    ///
    /// One reference per line, blank lines ignored. Lines that do not resolve
    /// to a catalog reference are reported and skipped.
    pub fn replace_ephemeral(&mut self, text: &str, normalizer: &Normalizer) -> PasteReport {
        let mut references = BTreeSet::new();
        let mut errors = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match normalizer.normalize(line, Strictness::Strict) {
                Some(reference) => {
                    references.insert(reference);
                }
                None => errors.push(PasteLineError {
                    line_number: index + 1,
                    input: line.to_string(),
                }),
            }
        }

        let accepted = references.len();
        let custom = self
            .sets
            .entry(CUSTOM_LIST.to_string())
            .or_insert_with(|| MembershipSet::ephemeral(CUSTOM_LIST));
        custom.references = references;

        info!(accepted, rejected = errors.len(), "replaced custom list from paste");
        PasteReport { accepted, errors }
    }

    /// Add or remove one reference; returns whether the list changed
    pub fn toggle(&mut self, name: &str, reference: &str, included: bool) -> Result<bool> {
        let set = self
            .sets
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("List '{}'", name)))?;
        let changed = if included {
            set.references.insert(reference.to_string())
        } else {
            set.references.remove(reference)
        };
        Ok(changed)
    }

    /// Apply every edit once, in order; per-edit results in the same order
    pub fn apply_edits(&mut self, edits: &[MembershipEdit]) -> Vec<Result<bool>> {
        edits
            .iter()
            .map(|edit| self.toggle(&edit.list, &edit.reference, edit.included))
            .collect()
    }

    /// Write a file-backed list back to its CSV
    ///
    /// The file is replaced through a temporary sibling so a failed write
    /// leaves the previous contents intact.
    pub fn save(&self, name: &str) -> Result<PathBuf> {
        let set = self
            .sets
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("List '{}'", name)))?;
        let Backing::File(path) = &set.backing else {
            return Err(Error::InvalidInput(format!("List '{}' is not file backed", name)));
        };

        let tmp_path = path.with_extension("csv.tmp");
        let result = (|| -> Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            write_references(&mut file, &set.references)?;
            file.flush()?;
            file.sync_all()?;
            fs::rename(&tmp_path, path)?;
            Ok(())
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            warn!(list = %name, path = %path.display(), error = %e, "list save failed");
            return Err(e);
        }

        info!(list = %name, path = %path.display(), references = set.references.len(), "list saved");
        Ok(path.clone())
    }
}
