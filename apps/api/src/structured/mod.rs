//! Structured response extraction — recovers a typed JSON payload from whatever
//! text a generative model actually returned.
//!
//! Models are asked by prompt convention to emit a JSON object or array, but they
//! wrap it in fences, prepend chatter, append apologies, or refuse outright.
//! `extract_structured` never panics and never returns `Err`: every failure becomes
//! `StructuredResult::Failure` carrying the untouched input so the caller can show
//! it, retry, or substitute a default.

pub mod handlers;
pub mod shapes;
pub mod span;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The top-level JSON shape a call site expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Object,
    Array,
}

impl Shape {
    pub fn delimiters(self) -> (char, char) {
        match self {
            Shape::Object => ('{', '}'),
            Shape::Array => ('[', ']'),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The text held no payload that decoded into the expected shape.
    MalformedStructuredOutput,
    /// The model call itself failed, so there was no text to decode.
    ModelUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StructuredResult<T> {
    Success { value: T },
    Failure { kind: FailureKind, raw_text: String },
}

impl<T> StructuredResult<T> {
    pub fn malformed(raw_text: &str) -> Self {
        StructuredResult::Failure {
            kind: FailureKind::MalformedStructuredOutput,
            raw_text: raw_text.to_string(),
        }
    }

    /// The original model text, present only on failure.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            StructuredResult::Success { .. } => None,
            StructuredResult::Failure { raw_text, .. } => Some(raw_text),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StructuredResult<U> {
        match self {
            StructuredResult::Success { value } => StructuredResult::Success { value: f(value) },
            StructuredResult::Failure { kind, raw_text } => {
                StructuredResult::Failure { kind, raw_text }
            }
        }
    }
}

// Typed accessors for callers of the model seam; the HTTP layer only serializes.
#[allow(dead_code)]
impl<T> StructuredResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, StructuredResult::Success { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            StructuredResult::Success { value } => Some(value),
            StructuredResult::Failure { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            StructuredResult::Success { value } => Some(value),
            StructuredResult::Failure { .. } => None,
        }
    }

    /// Substitutes a default built from the raw text on failure.
    pub fn unwrap_or_else(self, fallback: impl FnOnce(FailureKind, &str) -> T) -> T {
        match self {
            StructuredResult::Success { value } => value,
            StructuredResult::Failure { kind, raw_text } => fallback(kind, &raw_text),
        }
    }
}

/// A payload type a call site expects back from the model.
///
/// `validate` runs after decoding; a rejection is reported exactly like a decode
/// error, so an implicitly wrong shape never reaches the caller as a success.
pub trait StructuredShape: DeserializeOwned {
    const SHAPE: Shape;

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl<T: StructuredShape> StructuredShape for Vec<T> {
    const SHAPE: Shape = Shape::Array;

    fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("expected at least one item".to_string());
        }
        self.iter()
            .enumerate()
            .try_for_each(|(i, item)| item.validate().map_err(|e| format!("item {i}: {e}")))
    }
}

/// Decodes `raw` into `T`, validating the result.
pub fn extract_structured<T: StructuredShape>(raw: &str) -> StructuredResult<T> {
    decode_with(raw, T::SHAPE, T::validate)
}

/// Decodes `raw` into an untyped JSON value of the given top-level shape.
pub fn extract_value(raw: &str, shape: Shape) -> StructuredResult<serde_json::Value> {
    decode_with(raw, shape, |_| Ok(()))
}

/// Search order: inside the preferred fenced block first (if any), then the full
/// text. Within each region the balanced span is tried before the
/// first-open/last-close span.
fn decode_with<T, V>(raw: &str, shape: Shape, validate: V) -> StructuredResult<T>
where
    T: DeserializeOwned,
    V: Fn(&T) -> Result<(), String>,
{
    let mut regions = Vec::with_capacity(2);
    if let Some(fenced) = span::fenced_region(raw) {
        regions.push(fenced);
    }
    regions.push(raw);

    let mut last_error: Option<String> = None;
    let mut tried: Vec<&str> = Vec::new();

    for region in regions {
        for candidate in span::candidate_spans(region, shape) {
            if tried.contains(&candidate) {
                continue;
            }
            tried.push(candidate);

            match serde_json::from_str::<T>(candidate) {
                Ok(value) => match validate(&value) {
                    Ok(()) => {
                        debug!(bytes = candidate.len(), "decoded structured payload");
                        return StructuredResult::Success { value };
                    }
                    Err(reason) => last_error = Some(format!("shape validation: {reason}")),
                },
                Err(e) => last_error = Some(format!("decode: {e}")),
            }
        }
    }

    warn!(
        candidates = tried.len(),
        error = last_error.as_deref().unwrap_or("no JSON payload found"),
        "model output did not contain a usable structured payload"
    );
    StructuredResult::malformed(raw)
}
