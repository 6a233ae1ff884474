//! # Laser Juke Explorer Common Library
//!
//! Data layer shared by the explorer service and its tools:
//! - Reference normalization against the disc catalog
//! - Source loading, caching and the discs/titles join
//! - Cascading filters and custom membership lists
//! - Statistics and label reports
//! - Configuration loading and per-user sessions

pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod join;
pub mod lists;
pub mod model;
pub mod normalize;
pub mod report;
pub mod session;
pub mod source;

pub use error::{Error, Result};
pub use model::{Field, Record, RowOrder, Table};
pub use session::{ExplorerSession, SessionSettings};
