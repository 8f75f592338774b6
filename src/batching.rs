//! Batch planning
//!
//! Groups the ordered chunk sequence into contiguous batches sized for one
//! LLM request each. Batch size is derived from the caller's target batch
//! count and checked against a quality threshold: past it, responses get
//! unreliable enough that the request is rejected outright.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chunking::TranscriptChunk;
use crate::error::{AnalyzerError, Result};

/// Chunks-per-batch count at which extraction is refused
pub const DEFAULT_QUALITY_THRESHOLD: usize = 10;
/// Chunks-per-batch count above which a degradation warning is logged
pub const DEFAULT_WARN_THRESHOLD: usize = 5;
/// Auto mode targets one batch per this many chunks
const AUTO_SAMPLE_DIVISOR: usize = 5;

/// A contiguous run of chunks destined for a single LLM request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub chunks: Vec<TranscriptChunk>,
}

impl Batch {
    /// Concatenate chunk texts with single-space separators into one LLM payload
    pub fn content(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Slices chunk sequences into bounded contiguous batches
pub struct BatchPlanner {
    quality_threshold: usize,
    warn_threshold: usize,
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY_THRESHOLD, DEFAULT_WARN_THRESHOLD)
    }
}

impl BatchPlanner {
    pub fn new(quality_threshold: usize, warn_threshold: usize) -> Self {
        Self {
            quality_threshold,
            warn_threshold,
        }
    }

    /// Partition `chunks` into at most `sample_count` contiguous batches.
    ///
    /// `sample_count = 0` picks a target automatically (one batch per five
    /// chunks, rounded, minimum one). The final batch may be shorter than the
    /// rest; every chunk lands in exactly one batch, in original order.
    pub fn plan(&self, chunks: Vec<TranscriptChunk>, sample_count: usize) -> Result<Vec<Batch>> {
        let total = chunks.len();
        let sample_count = if sample_count == 0 {
            auto_sample_count(total)
        } else {
            sample_count
        };

        if sample_count > total {
            return Err(AnalyzerError::Configuration(format!(
                "sample_count {} exceeds chunk count {}",
                sample_count, total
            )));
        }

        let chunks_per_batch = (total + sample_count - 1) / sample_count;
        if chunks_per_batch >= self.quality_threshold {
            return Err(AnalyzerError::QualityThresholdExceeded(format!(
                "{} chunks per batch (threshold {}); increase sample_count to shrink batches",
                chunks_per_batch, self.quality_threshold
            )));
        }
        if chunks_per_batch > self.warn_threshold {
            warn!(
                "⚠️ {} chunks per batch exceeds {}; extraction quality may degrade",
                chunks_per_batch, self.warn_threshold
            );
        }

        let mut batches = Vec::with_capacity(sample_count);
        let mut remaining = chunks.into_iter();
        loop {
            let slice: Vec<TranscriptChunk> = remaining.by_ref().take(chunks_per_batch).collect();
            if slice.is_empty() {
                break;
            }
            batches.push(Batch { chunks: slice });
        }

        debug!(
            "Planned {} batches of up to {} chunks ({} chunks total)",
            batches.len(),
            chunks_per_batch,
            total
        );
        Ok(batches)
    }
}

/// One batch per five chunks, rounded to nearest, never zero
fn auto_sample_count(total: usize) -> usize {
    let rounded = (total as f64 / AUTO_SAMPLE_DIVISOR as f64).round() as usize;
    rounded.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(n: usize) -> Vec<TranscriptChunk> {
        (0..n)
            .map(|order| TranscriptChunk {
                text: format!("chunk {}", order),
                order,
            })
            .collect()
    }

    #[test]
    fn test_batches_partition_chunks_exactly() {
        let planner = BatchPlanner::default();
        let batches = planner.plan(chunks(23), 5).unwrap();

        let orders: Vec<usize> = batches
            .iter()
            .flat_map(|b| b.chunks.iter().map(|c| c.order))
            .collect();
        assert_eq!(orders, (0..23).collect::<Vec<_>>());
    }

    #[test]
    fn test_twenty_three_chunks_five_samples() {
        let planner = BatchPlanner::default();
        let batches = planner.plan(chunks(23), 5).unwrap();

        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![5, 5, 5, 5, 3]);
    }

    #[test]
    fn test_sample_count_larger_than_chunks_is_rejected() {
        let planner = BatchPlanner::default();
        let err = planner.plan(chunks(3), 4).unwrap_err();
        assert!(matches!(err, AnalyzerError::Configuration(_)));
    }

    #[test]
    fn test_empty_chunk_sequence_is_rejected() {
        let planner = BatchPlanner::default();
        let err = planner.plan(Vec::new(), 0).unwrap_err();
        assert!(matches!(err, AnalyzerError::Configuration(_)));
    }

    #[test]
    fn test_oversized_batches_are_refused() {
        let planner = BatchPlanner::default();
        // ceil(100 / 10) = 10, at the refusal threshold
        let err = planner.plan(chunks(100), 10).unwrap_err();
        assert!(matches!(err, AnalyzerError::QualityThresholdExceeded(_)));
    }

    #[test]
    fn test_just_under_threshold_is_allowed() {
        let planner = BatchPlanner::default();
        // ceil(90 / 10) = 9, one under the refusal threshold
        let batches = planner.plan(chunks(90), 10).unwrap();
        assert_eq!(batches.len(), 10);
        assert!(batches.iter().all(|b| b.len() == 9));
    }

    #[test]
    fn test_slicing_can_yield_fewer_batches_than_requested() {
        let planner = BatchPlanner::default();
        // ceil(40 / 9) = 5 chunks per batch, which packs 40 chunks into 8
        // batches rather than the requested 9
        let batches = planner.plan(chunks(40), 9).unwrap();

        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![5; 8]);

        let orders: Vec<usize> = batches
            .iter()
            .flat_map(|b| b.chunks.iter().map(|c| c.order))
            .collect();
        assert_eq!(orders, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn test_auto_sample_count_rounds() {
        assert_eq!(auto_sample_count(23), 5);
        assert_eq!(auto_sample_count(25), 5);
        assert_eq!(auto_sample_count(12), 2);
        assert_eq!(auto_sample_count(13), 3);
        // Small inputs still get one batch
        assert_eq!(auto_sample_count(2), 1);
        assert_eq!(auto_sample_count(1), 1);
    }

    #[test]
    fn test_zero_sample_count_uses_auto_target() {
        let planner = BatchPlanner::default();
        let batches = planner.plan(chunks(23), 0).unwrap();
        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![5, 5, 5, 5, 3]);
    }

    #[test]
    fn test_single_chunk() {
        let planner = BatchPlanner::default();
        let batches = planner.plan(chunks(1), 0).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
    }

    #[test]
    fn test_batch_content_joins_with_single_spaces() {
        let batch = Batch {
            chunks: vec![
                TranscriptChunk {
                    text: "first piece".to_string(),
                    order: 0,
                },
                TranscriptChunk {
                    text: "second piece".to_string(),
                    order: 1,
                },
            ],
        };
        assert_eq!(batch.content(), "first piece second piece");
    }
}
