// No model transport is wired into the binary yet, so `TextModel` implementations
// only come from tests until one is carried in `AppState`.
#![allow(dead_code)]

//! Model collaborator seam — every generative-model call goes through `TextModel`.
//!
//! The transport (which vendor, which endpoint, retries) lives behind the trait.
//! `request_structured` is the one place a reply is turned into a typed payload,
//! and it never fails past its boundary: a broken call or an unreadable reply
//! both come back as `StructuredResult::Failure`.
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::structured::{extract_structured, FailureKind, StructuredResult, StructuredShape};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Model request failed: {0}")]
    Request(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Model returned empty content")]
    EmptyContent,
}

/// A generative model: prompt in, free-form text out.
///
/// Carried as `Arc<dyn TextModel>` by callers that need one.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Sends `prompt` and decodes the reply as `T`.
pub async fn request_structured<T: StructuredShape>(
    model: &dyn TextModel,
    prompt: &str,
) -> StructuredResult<T> {
    let text = match model.generate(prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Model call failed: {e}");
            return StructuredResult::Failure {
                kind: FailureKind::ModelUnavailable,
                raw_text: String::new(),
            };
        }
    };

    debug!(chars = text.chars().count(), "model replied");
    extract_structured::<T>(&text)
}

/// Sends `prompt` and returns the trimmed reply, or an empty string when the
/// call fails. For plain-text conventions such as the job-description split.
pub async fn request_text(model: &dyn TextModel, prompt: &str) -> String {
    match model.generate(prompt).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("Model call failed: {e}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::shapes::{
        parse_skill_list, CandidateAnalysis, JobDescriptionDrafts, OutreachOption,
    };

    struct CannedModel(&'static str);

    #[async_trait]
    impl TextModel for CannedModel {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    struct DownModel;

    #[async_trait]
    impl TextModel for DownModel {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::RateLimited { retries: 3 })
        }
    }

    #[tokio::test]
    async fn test_request_structured_decodes_reply() {
        let model = CannedModel(
            "```json\n[{\"type\":\"Short & Punchy\",\"subject\":\"Hi\",\"content\":\"Hello\"}]\n```",
        );
        let options = request_structured::<Vec<OutreachOption>>(&model, "write outreach")
            .await
            .into_value()
            .unwrap();
        assert_eq!(options[0].subject, "Hi");
    }

    #[tokio::test]
    async fn test_request_structured_model_down() {
        let result = request_structured::<CandidateAnalysis>(&DownModel, "analyze").await;
        assert_eq!(
            result,
            StructuredResult::Failure {
                kind: FailureKind::ModelUnavailable,
                raw_text: String::new(),
            }
        );
    }

    #[tokio::test]
    async fn test_request_structured_refusal() {
        let model = CannedModel("I'm unable to comply with that request.");
        let result = request_structured::<CandidateAnalysis>(&model, "analyze").await;
        assert_eq!(
            result.raw_text(),
            Some("I'm unable to comply with that request.")
        );
    }

    #[tokio::test]
    async fn test_request_text_feeds_plain_conventions() {
        let model = CannedModel("  Rust, Tokio, Axum  ");
        assert_eq!(
            parse_skill_list(&request_text(&model, "skills for backend").await),
            vec!["Rust", "Tokio", "Axum"]
        );

        let drafts = JobDescriptionDrafts::from_model_text(&request_text(&DownModel, "jd").await);
        assert_eq!(drafts.platform, "Generation failed for Platform version.");
    }
}
