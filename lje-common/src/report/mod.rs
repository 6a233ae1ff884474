//! Outputs derived from a filtered view: statistics tables and label sheets

pub mod labels;
pub mod stats;

pub use labels::{build_labels, LabelDocument, LabelError, MAX_LABEL_DISCS};
pub use stats::{build_statistics, StatisticsReport, DEFAULT_TOP_N};
