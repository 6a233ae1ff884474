//! Cascading multi-select filter chain
//!
//! Stages are evaluated in declaration order. The options offered for stage
//! `i` are the distinct values of its field among rows that pass stages
//! `0..i`; a stage never constrains the stages before it. On every
//! evaluation each remembered selection is pruned to its fresh options, so a
//! value that is no longer offered can neither stay selected nor stay active.
//!
//! An empty selection imposes no constraint.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::model::{Field, Record};
use crate::{Error, Result};

/// One stage of the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStage {
    field: Field,
    remembered: BTreeSet<String>,
    last_added: Option<String>,
    rotate: bool,
}

impl FilterStage {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            remembered: BTreeSet::new(),
            last_added: None,
            rotate: false,
        }
    }

    /// Enable option rotation around the most recently added value
    pub fn rotating(mut self) -> Self {
        self.rotate = true;
        self
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn remembered(&self) -> &BTreeSet<String> {
        &self.remembered
    }

    pub fn last_added(&self) -> Option<&str> {
        self.last_added.as_deref()
    }

    fn matches(&self, row: &Record) -> bool {
        self.remembered.is_empty()
            || row
                .value(self.field)
                .is_some_and(|v| self.remembered.contains(&v))
    }
}

/// Options and active selection of one stage after evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageView {
    pub field: Field,
    pub options: Vec<String>,
    pub selected: Vec<String>,
}

/// Result of evaluating the chain against a set of rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOutcome {
    pub stages: Vec<StageView>,
    /// Indices into the evaluated rows that pass every stage
    pub rows: Vec<usize>,
}

/// Ordered chain of dependent filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
}

impl FilterChain {
    pub fn new(stages: Vec<FilterStage>) -> Self {
        Self { stages }
    }

    /// Chain over `fields`, rotating the options of `rotate` if present
    pub fn with_fields(fields: &[Field], rotate: Option<Field>) -> Self {
        let stages = fields
            .iter()
            .map(|&field| {
                let stage = FilterStage::new(field);
                if Some(field) == rotate {
                    stage.rotating()
                } else {
                    stage
                }
            })
            .collect();
        Self { stages }
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn fields(&self) -> Vec<Field> {
        self.stages.iter().map(|s| s.field).collect()
    }

    /// Replace the remembered selection of `field`
    ///
    /// The last value of `values` that was not selected before becomes the
    /// rotation anchor. Deselecting the anchor clears it.
    pub fn select<I, S>(&mut self, field: Field, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stage = self
            .stages
            .iter_mut()
            .find(|s| s.field == field)
            .ok_or_else(|| Error::InvalidInput(format!("Field {} is not in the filter chain", field)))?;

        let values: Vec<String> = values
            .into_iter()
            .map(Into::into)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        if let Some(added) = values
            .iter()
            .rev()
            .find(|v| !stage.remembered.contains(*v))
        {
            stage.last_added = Some(added.clone());
        }

        stage.remembered = values.into_iter().collect();
        if let Some(anchor) = &stage.last_added {
            if !stage.remembered.contains(anchor) {
                stage.last_added = None;
            }
        }
        Ok(())
    }

    /// Prune, offer and apply in one pass
    pub fn evaluate(&mut self, rows: &[Record]) -> FilterOutcome {
        let mut passing: Vec<usize> = (0..rows.len()).collect();
        let mut views = Vec::with_capacity(self.stages.len());

        for stage in &mut self.stages {
            let options: BTreeSet<String> = passing
                .iter()
                .filter_map(|&i| rows[i].value(stage.field))
                .collect();

            stage.remembered.retain(|v| options.contains(v));
            if stage
                .last_added
                .as_ref()
                .is_some_and(|anchor| !stage.remembered.contains(anchor))
            {
                stage.last_added = None;
            }

            let mut offered: Vec<String> = options.into_iter().collect();
            if stage.rotate {
                if let Some(anchor) = stage.last_added.as_deref() {
                    offered = rotate_after(offered, anchor);
                }
            }

            views.push(StageView {
                field: stage.field,
                options: offered,
                selected: stage.remembered.iter().cloned().collect(),
            });

            passing.retain(|&i| stage.matches(&rows[i]));
        }

        FilterOutcome {
            stages: views,
            rows: passing,
        }
    }
}

/// Cyclic rotation so that the element after `anchor` comes first
///
/// `["A","B","C","D"]` around `"B"` gives `["C","D","A","B"]`. Unchanged when
/// `anchor` is not among the options.
pub fn rotate_after(mut options: Vec<String>, anchor: &str) -> Vec<String> {
    if let Some(k) = options.iter().position(|o| o == anchor) {
        options.rotate_left(k + 1);
    }
    options
}
