//! API data models

use serde::{Deserialize, Serialize};

use crate::concepts::ConceptRecord;

/// Body of an analyze request
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub youtube_link: String,
}

/// Successful analyze response
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub key_concepts: Vec<ConceptRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Error envelope returned for any failed request
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}
