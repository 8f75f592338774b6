//! DynamoCards - YouTube transcript key-concept extraction
//!
//! Fetches a video's transcript, splits it into bounded chunks, groups the
//! chunks into LLM-sized batches and asks a language model for term/definition
//! pairs, tolerating the messy free-text replies models actually produce.

pub mod analyzer;
pub mod api;
pub mod batching;
pub mod chunking;
pub mod concepts;
pub mod config;
pub mod error;
pub mod llm;
pub mod transcript;

// Re-export main types for easy access
pub use crate::analyzer::{AnalysisResult, VideoAnalyzer};
pub use crate::batching::{Batch, BatchPlanner};
pub use crate::chunking::{SegmentChunker, TranscriptChunk};
pub use crate::concepts::{ConceptExtractor, ConceptRecord, ExtractionResult};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{AnalyzerError, Result};
pub use crate::llm::{create_llm, CompletionResponse, LLMConfig, LLMProvider, LLM};
pub use crate::transcript::{
    Transcript, TranscriptSegment, VideoMetadata, YouTubeTranscriptClient,
};
