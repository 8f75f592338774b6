pub mod extractor;
pub mod parser;

pub use extractor::ConceptExtractor;

use serde::{Deserialize, Serialize};

/// A term/definition pair parsed from one LLM response
///
/// Accepts `"concept"` as an alias for `"term"` since models drift between
/// the two key names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRecord {
    #[serde(alias = "concept")]
    pub term: String,
    pub definition: String,
}

/// Aggregated outcome of extraction across all batches
///
/// Records appear in batch-submission order, each batch's records in the
/// order the LLM listed them. Failed batches contribute nothing but are
/// counted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionResult {
    pub records: Vec<ConceptRecord>,
    pub batches_processed: usize,
    pub batches_failed: usize,
}
