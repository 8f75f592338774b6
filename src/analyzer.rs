//! End-to-end video analysis pipeline
//!
//! Wires the transcript client, chunker, planner and extractor together:
//! URL -> segments -> chunks -> batches -> concept records. One analyzer is
//! built at startup and shared read-only across requests.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::batching::{Batch, BatchPlanner};
use crate::chunking::SegmentChunker;
use crate::concepts::{ConceptExtractor, ConceptRecord};
use crate::config::Config;
use crate::error::Result;
use crate::llm::{create_llm, LLM};
use crate::transcript::{Transcript, VideoMetadata, YouTubeTranscriptClient};

/// Chunk count up to which the summary is one single LLM call
const SUMMARY_STUFF_LIMIT: usize = 10;

const SUMMARY_INSTRUCTION: &str =
    "Write a concise summary of the following video transcript text.";

const SUMMARY_COMBINE_INSTRUCTION: &str =
    "Combine the following partial summaries into one coherent summary of the whole video.";

/// Outcome of analyzing one video
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub metadata: VideoMetadata,
    pub key_concepts: Vec<ConceptRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub batches_processed: usize,
    pub batches_failed: usize,
    /// Wall-clock analysis time in seconds
    pub processing_time: f64,
}

/// Orchestrates transcript fetch, chunking, batching and extraction
pub struct VideoAnalyzer {
    config: Config,
    transcript_client: YouTubeTranscriptClient,
    chunker: SegmentChunker,
    planner: BatchPlanner,
    extractor: ConceptExtractor,
    llm: Arc<dyn LLM>,
}

impl VideoAnalyzer {
    /// Build an analyzer, constructing the LLM provider from config
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let llm: Arc<dyn LLM> = Arc::from(create_llm(&config.llm)?);
        Ok(Self::with_llm(config, llm))
    }

    /// Build an analyzer around an existing LLM instance
    pub fn with_llm(config: Config, llm: Arc<dyn LLM>) -> Self {
        let transcript_client = YouTubeTranscriptClient::new(
            config.transcript.timeout_seconds,
            &config.transcript.language,
        );
        let chunker = SegmentChunker::new(config.chunking.max_chunk_size);
        let planner = BatchPlanner::new(
            config.extraction.quality_threshold,
            config.extraction.warn_threshold,
        );
        let extractor = ConceptExtractor::new(
            Arc::clone(&llm),
            config.extraction.max_concurrent_requests,
        );

        Self {
            config,
            transcript_client,
            chunker,
            planner,
            extractor,
            llm,
        }
    }

    /// Analyze one video URL end to end
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        info!("🚀 Analyzing video: {}", url);
        let transcript = self.transcript_client.fetch_transcript(url).await?;
        self.analyze_transcript(transcript).await
    }

    /// Run the pipeline over an already-fetched transcript
    pub async fn analyze_transcript(&self, transcript: Transcript) -> Result<AnalysisResult> {
        let start = Instant::now();

        info!(
            "📝 Transcript: \"{}\" by {} ({} segments, {} chars)",
            transcript.metadata.title,
            transcript.metadata.author,
            transcript.segments.len(),
            transcript.text_len()
        );

        let chunks = self.chunker.chunk(&transcript.segments)?;
        let batches = self
            .planner
            .plan(chunks, self.config.extraction.sample_count)?;

        // Summary failure is non-fatal; the field is just omitted
        let summary = if self.config.extraction.enable_summary {
            match self.summarize(&batches).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!("⚠️ Summary generation failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let extraction = self.extractor.extract(&batches).await;
        let processing_time = start.elapsed().as_secs_f64();

        info!(
            "✅ Analysis complete: {} concepts in {:.1}s",
            extraction.records.len(),
            processing_time
        );

        Ok(AnalysisResult {
            metadata: transcript.metadata,
            key_concepts: extraction.records,
            summary,
            batches_processed: extraction.batches_processed,
            batches_failed: extraction.batches_failed,
            processing_time,
        })
    }

    /// Summarize the transcript: one call for small inputs, map-reduce over
    /// batches for larger ones.
    async fn summarize(&self, batches: &[Batch]) -> anyhow::Result<String> {
        let total_chunks: usize = batches.iter().map(Batch::len).sum();

        if total_chunks <= SUMMARY_STUFF_LIMIT {
            let content = batches
                .iter()
                .map(Batch::content)
                .collect::<Vec<_>>()
                .join(" ");
            let prompt = format!("{}\n\n{}", SUMMARY_INSTRUCTION, content);
            let response = self.llm.complete(&prompt).await?;
            return Ok(response.content.trim().to_string());
        }

        info!(
            "📋 Summarizing {} batches map-reduce style",
            batches.len()
        );

        let requests: Vec<_> = batches
            .iter()
            .map(|batch| {
                let llm = Arc::clone(&self.llm);
                let prompt = format!("{}\n\n{}", SUMMARY_INSTRUCTION, batch.content());
                async move {
                    let response = llm.complete(&prompt).await?;
                    Ok(response.content.trim().to_string())
                }
            })
            .collect();

        let partials: Vec<anyhow::Result<String>> = stream::iter(requests)
            .buffered(self.config.extraction.max_concurrent_requests.max(1))
            .collect()
            .await;

        let partials: Vec<String> = partials.into_iter().collect::<anyhow::Result<_>>()?;

        let prompt = format!("{}\n\n{}", SUMMARY_COMBINE_INSTRUCTION, partials.join("\n\n"));
        let response = self.llm.complete(&prompt).await?;
        Ok(response.content.trim().to_string())
    }

    /// Probe whether the configured LLM endpoint is reachable
    pub async fn llm_available(&self) -> bool {
        self.llm.is_available().await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
