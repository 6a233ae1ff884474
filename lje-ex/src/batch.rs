//! Batch reference normalization (the `normalize-refs` tool)

use lje_common::normalize::{Normalizer, Resolution, Strictness};
use lje_common::source::{read_discs, read_list_references, write_references};
use lje_common::Result;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Counts reported after a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub unmatched: usize,
}

/// Rewrite every `REFERENCE` of `input` against the catalog in `discs`
///
/// Input order and duplicates are preserved. References that do not resolve
/// to the catalog are kept (rebuilt or verbatim) and logged.
pub fn normalize_file(discs: &Path, input: &Path, output: &Path) -> Result<BatchSummary> {
    let catalog = read_discs(&fs::read(discs)?)?;
    let normalizer = Normalizer::new(catalog.iter().map(|d| d.reference.as_str()));
    let references = read_list_references(&fs::read(input)?)?;

    let mut unmatched = 0;
    let mut normalized = Vec::with_capacity(references.len());
    for raw in &references {
        if !matches!(normalizer.resolve(raw), Resolution::Catalog(_)) {
            unmatched += 1;
            warn!("No catalog match for: {}", raw);
        }
        normalized.push(
            normalizer
                .normalize(raw, Strictness::Permissive)
                .unwrap_or_else(|| raw.clone()),
        );
    }

    let file = fs::File::create(output)?;
    write_references(file, &normalized)?;

    info!(total = normalized.len(), unmatched, output = %output.display(), "normalization complete");
    Ok(BatchSummary {
        total: normalized.len(),
        unmatched,
    })
}
