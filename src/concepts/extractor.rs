//! Concept extraction over planned batches
//!
//! Each batch is one LLM round-trip: concatenate chunk texts, submit under a
//! fixed instruction, parse the reply. Batches are independent, so they run
//! concurrently up to a bounded width; a failed batch (transport error or
//! unparsable reply) is logged and skipped without touching the others.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::batching::Batch;
use crate::concepts::{parser, ConceptRecord, ExtractionResult};
use crate::llm::LLM;

const CONCEPT_INSTRUCTION: &str = r#"Find and define the key concepts or terms in the text below.

Respond with only a JSON array of objects of the form [{"term": "<term>", "definition": "<definition>"}], with no surrounding prose and no markdown code fences."#;

/// Terminal outcome of one batch's round-trip
enum BatchOutcome {
    Parsed(Vec<ConceptRecord>),
    Failed,
}

/// Runs the per-batch extract/parse pipeline against an LLM
pub struct ConceptExtractor {
    llm: Arc<dyn LLM>,
    max_concurrent_requests: usize,
}

impl ConceptExtractor {
    pub fn new(llm: Arc<dyn LLM>, max_concurrent_requests: usize) -> Self {
        Self {
            llm,
            max_concurrent_requests: max_concurrent_requests.max(1),
        }
    }

    /// Extract concept records from every batch.
    ///
    /// Batches run concurrently but merged records keep batch-submission
    /// order. Failures degrade completeness, never availability: the result
    /// carries whatever the successful batches produced.
    pub async fn extract(&self, batches: &[Batch]) -> ExtractionResult {
        let total = batches.len();
        info!(
            "🧠 Extracting concepts from {} batches (up to {} in flight)",
            total, self.max_concurrent_requests
        );

        // Request futures are built up front; a lazily mapped stream of
        // borrowing async blocks fails the server handler's higher-ranked
        // lifetime bounds.
        let requests: Vec<_> = batches
            .iter()
            .enumerate()
            .map(|(index, batch)| extract_batch(Arc::clone(&self.llm), index, total, batch))
            .collect();

        let outcomes: Vec<BatchOutcome> = stream::iter(requests)
            .buffered(self.max_concurrent_requests)
            .collect()
            .await;

        let mut result = ExtractionResult::default();
        for outcome in outcomes {
            match outcome {
                BatchOutcome::Parsed(records) => {
                    result.batches_processed += 1;
                    result.records.extend(records);
                }
                BatchOutcome::Failed => result.batches_failed += 1,
            }
        }

        info!(
            "✅ Extraction complete: {} concepts from {}/{} batches",
            result.records.len(),
            result.batches_processed,
            total
        );
        result
    }
}

async fn extract_batch(
    llm: Arc<dyn LLM>,
    index: usize,
    total: usize,
    batch: &Batch,
) -> BatchOutcome {
    let content = batch.content();
    let prompt = format!("{}\n\nText:\n{}", CONCEPT_INSTRUCTION, content);

    debug!(
        "Submitting batch {}/{} ({} chunks, {} chars)",
        index + 1,
        total,
        batch.len(),
        content.chars().count()
    );

    let response = match llm.complete(&prompt).await {
        Ok(response) => response,
        Err(e) => {
            warn!(
                "⚠️ Batch {}/{} LLM request failed, skipping: {}",
                index + 1,
                total,
                e
            );
            return BatchOutcome::Failed;
        }
    };

    match parser::parse_concepts(&response.content) {
        Ok(records) => {
            debug!(
                "Batch {}/{} parsed: {} concepts (tokens: {:?})",
                index + 1,
                total,
                records.len(),
                response.tokens_used
            );
            BatchOutcome::Parsed(records)
        }
        Err(failure) => {
            warn!(
                "⚠️ Batch {}/{} response unparsable ({}), skipping. Raw response: {}",
                index + 1,
                total,
                failure,
                response.content
            );
            BatchOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::TranscriptChunk;
    use crate::llm::{CompletionResponse, LLMProvider};
    use anyhow::anyhow;
    use async_trait::async_trait;

    /// Replies with the first canned response whose needle appears in the
    /// prompt; a needle of "!error" simulates a transport failure instead.
    struct ScriptedLLM {
        replies: Vec<(&'static str, &'static str)>,
    }

    #[async_trait]
    impl LLM for ScriptedLLM {
        async fn complete(&self, prompt: &str) -> anyhow::Result<CompletionResponse> {
            for (needle, reply) in &self.replies {
                if prompt.contains(needle) {
                    if *reply == "!error" {
                        return Err(anyhow!("simulated transport failure"));
                    }
                    return Ok(CompletionResponse {
                        content: reply.to_string(),
                        tokens_used: Some(42),
                    });
                }
            }
            Err(anyhow!("no scripted reply for prompt"))
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn provider_type(&self) -> LLMProvider {
            LLMProvider::OpenAICompatible
        }
    }

    fn batch(text: &str, order: usize) -> Batch {
        Batch {
            chunks: vec![TranscriptChunk {
                text: text.to_string(),
                order,
            }],
        }
    }

    fn extractor(replies: Vec<(&'static str, &'static str)>) -> ConceptExtractor {
        ConceptExtractor::new(Arc::new(ScriptedLLM { replies }), 4)
    }

    #[tokio::test]
    async fn test_merges_records_in_batch_order() {
        let extractor = extractor(vec![
            ("alpha", r#"[{"term":"A","definition":"1"}]"#),
            ("bravo", r#"[{"term":"B","definition":"2"}]"#),
            ("charlie", r#"[{"term":"C","definition":"3"}]"#),
        ]);
        let batches = vec![batch("alpha", 0), batch("bravo", 1), batch("charlie", 2)];

        let result = extractor.extract(&batches).await;

        let terms: Vec<&str> = result.records.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(terms, vec!["A", "B", "C"]);
        assert_eq!(result.batches_processed, 3);
        assert_eq!(result.batches_failed, 0);
    }

    #[tokio::test]
    async fn test_malformed_middle_batch_is_skipped() {
        let extractor = extractor(vec![
            ("alpha", r#"[{"term":"A","definition":"1"}]"#),
            ("bravo", "I cannot find any concepts."),
            ("charlie", r#"[{"term":"C","definition":"3"}]"#),
        ]);
        let batches = vec![batch("alpha", 0), batch("bravo", 1), batch("charlie", 2)];

        let result = extractor.extract(&batches).await;

        let terms: Vec<&str> = result.records.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(terms, vec!["A", "C"]);
        assert_eq!(result.batches_processed, 2);
        assert_eq!(result.batches_failed, 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_isolated() {
        let extractor = extractor(vec![
            ("alpha", "!error"),
            ("bravo", r#"[{"term":"B","definition":"2"}]"#),
        ]);
        let batches = vec![batch("alpha", 0), batch("bravo", 1)];

        let result = extractor.extract(&batches).await;

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].term, "B");
        assert_eq!(result.batches_failed, 1);
    }

    #[tokio::test]
    async fn test_prose_wrapped_responses_still_parse() {
        let extractor = extractor(vec![(
            "alpha",
            r#"Sure! Here are the concepts: [{"term":"A","definition":"1"}] Enjoy!"#,
        )]);

        let result = extractor.extract(&[batch("alpha", 0)]).await;

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].term, "A");
    }

    #[tokio::test]
    async fn test_no_batches_yields_empty_result() {
        let extractor = extractor(Vec::new());
        let result = extractor.extract(&[]).await;

        assert!(result.records.is_empty());
        assert_eq!(result.batches_processed, 0);
        assert_eq!(result.batches_failed, 0);
    }

    #[tokio::test]
    async fn test_intra_batch_record_order_preserved() {
        let extractor = extractor(vec![(
            "alpha",
            r#"[{"term":"first","definition":"1"},{"term":"second","definition":"2"}]"#,
        )]);

        let result = extractor.extract(&[batch("alpha", 0)]).await;

        let terms: Vec<&str> = result.records.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(terms, vec!["first", "second"]);
    }

    /// Replies after a needle-specific delay so earlier batches finish later.
    struct StaggeredLLM;

    #[async_trait]
    impl LLM for StaggeredLLM {
        async fn complete(&self, prompt: &str) -> anyhow::Result<CompletionResponse> {
            let schedule = [
                ("alpha", 80u64, "A"),
                ("bravo", 60, "B"),
                ("charlie", 40, "C"),
                ("delta", 5, "D"),
            ];
            for (needle, delay_ms, term) in schedule {
                if prompt.contains(needle) {
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    return Ok(CompletionResponse {
                        content: format!(r#"[{{"term":"{}","definition":"d"}}]"#, term),
                        tokens_used: None,
                    });
                }
            }
            Err(anyhow!("no scripted reply for prompt"))
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn provider_type(&self) -> LLMProvider {
            LLMProvider::OpenAICompatible
        }
    }

    #[tokio::test]
    async fn test_slow_early_batches_do_not_reorder_records() {
        let extractor = ConceptExtractor::new(Arc::new(StaggeredLLM), 4);
        let batches = vec![
            batch("alpha", 0),
            batch("bravo", 1),
            batch("charlie", 2),
            batch("delta", 3),
        ];

        let result = extractor.extract(&batches).await;

        let terms: Vec<&str> = result.records.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(terms, vec!["A", "B", "C", "D"]);
        assert_eq!(result.batches_processed, 4);
        assert_eq!(result.batches_failed, 0);
    }
}
