use std::time::Duration;

use ai_client::{extract_json_object, truncate_to_char_boundary, OpenAi};
use async_trait::async_trait;
use moodscan_common::ClassificationError;
use tracing::{debug, info};

use crate::types::{ClassificationResult, ContentBatch};

/// Longest excerpt of a bad response carried into an error message.
const SNIPPET_BYTES: usize = 200;

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Sentiment counts for a non-empty batch.
    async fn classify(
        &self,
        batch: &ContentBatch,
    ) -> Result<ClassificationResult, ClassificationError>;
}

/// Sentiment classification over an OpenAI-compatible chat endpoint.
pub struct SentimentClassifier {
    ai: OpenAi,
    max_output_tokens: u32,
    timeout: Duration,
}

impl SentimentClassifier {
    pub fn new(ai: OpenAi, max_output_tokens: u32, timeout: Duration) -> Self {
        Self {
            ai,
            max_output_tokens,
            timeout,
        }
    }
}

#[async_trait]
impl Classifier for SentimentClassifier {
    async fn classify(
        &self,
        batch: &ContentBatch,
    ) -> Result<ClassificationResult, ClassificationError> {
        let prompt = build_prompt(batch);
        debug!(
            model = self.ai.model(),
            items = batch.len(),
            prompt_bytes = prompt.len(),
            "Submitting batch for classification"
        );

        let call = self.ai.complete_bounded(&prompt, self.max_output_tokens);
        let raw = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ClassificationError::Timeout(self.timeout))?
            .map_err(|e| ClassificationError::Request(e.to_string()))?;

        let result = parse_classification(&raw)?;
        info!(items = batch.len(), %result, "Batch classified");
        Ok(result)
    }
}

/// Prompt asking for JSON sentiment counts over the newline-joined batch.
pub fn build_prompt(batch: &ContentBatch) -> String {
    format!(
        "Analyze Discord chat messages.\n\
         Return ONLY valid JSON.\n\
         \n\
         Messages count: {count}\n\
         \n\
         Classify sentiment:\n\
         - positive\n\
         - neutral\n\
         - negative\n\
         \n\
         Return format:\n\
         {{\n  \"positive\": number,\n  \"neutral\": number,\n  \"negative\": number\n}}\n\
         \n\
         Messages:\n{messages}",
        count = batch.len(),
        messages = batch.items().join("\n"),
    )
}

/// Parse a model reply into counts.
///
/// Accepts a single JSON object, optionally fenced or surrounded by prose.
/// Counts must be non-negative integers; missing counts are zero.
pub fn parse_classification(raw: &str) -> Result<ClassificationResult, ClassificationError> {
    let malformed = |reason: String| {
        ClassificationError::Malformed(format!(
            "{reason} (response: {:?})",
            truncate_to_char_boundary(raw.trim(), SNIPPET_BYTES)
        ))
    };

    let object = extract_json_object(raw).ok_or_else(|| malformed("no JSON object".into()))?;
    let value: serde_json::Value =
        serde_json::from_str(object).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(malformed("expected a JSON object".into()));
    }

    serde_json::from_value(value).map_err(|e| malformed(format!("invalid counts: {e}")))
}
