/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Request-fatal errors surfaced to the API boundary
///
/// Everything else (a single batch's bad LLM output, a timed-out completion)
/// is absorbed inside the concept extractor and only degrades result
/// completeness.
#[derive(thiserror::Error, Debug)]
pub enum AnalyzerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("quality threshold exceeded: {0}")]
    QualityThresholdExceeded(String),

    #[error("transcript unavailable: {0}")]
    TranscriptUnavailable(String),
}
