use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::structured::shapes::{
    parse_skill_list, CandidateAnalysis, CandidatePersona, InterviewQuestions,
    JobDescriptionDrafts, OutreachOption, TalentStrategy,
};
use crate::structured::{
    extract_structured, extract_value, Shape, StructuredResult, StructuredShape,
};

/// Which payload the caller asked the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    InterviewQuestions,
    CandidateAnalysis,
    CandidatePersona,
    TalentStrategy,
    OutreachOptions,
    JobDescriptionDrafts,
    SkillList,
    /// Any JSON of the requested `shape`, no schema.
    Generic,
}

#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    pub kind: ResponseKind,
    pub text: String,
    #[serde(default)]
    pub shape: Option<Shape>,
}

#[derive(Debug, Serialize)]
pub struct DecodeResponse {
    pub kind: ResponseKind,
    pub result: StructuredResult<Value>,
    /// Default value to display when `result` is a failure, for kinds that have one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Value>,
}

/// POST /api/v1/responses/decode
pub async fn handle_decode(
    Json(req): Json<DecodeRequest>,
) -> Result<Json<DecodeResponse>, AppError> {
    Ok(Json(decode_response(req.kind, &req.text, req.shape)?))
}

pub fn decode_response(
    kind: ResponseKind,
    text: &str,
    shape: Option<Shape>,
) -> Result<DecodeResponse, AppError> {
    let result = match kind {
        ResponseKind::InterviewQuestions => typed::<InterviewQuestions>(text),
        ResponseKind::CandidateAnalysis => typed::<CandidateAnalysis>(text),
        ResponseKind::CandidatePersona => typed::<CandidatePersona>(text),
        ResponseKind::TalentStrategy => typed::<TalentStrategy>(text),
        ResponseKind::OutreachOptions => typed::<Vec<OutreachOption>>(text),
        ResponseKind::JobDescriptionDrafts => {
            to_success(JobDescriptionDrafts::from_model_text(text), text)
        }
        ResponseKind::SkillList => to_success(parse_skill_list(text), text),
        ResponseKind::Generic => {
            let shape = shape.ok_or_else(|| {
                AppError::Validation("'shape' is required when kind is 'generic'".to_string())
            })?;
            extract_value(text, shape)
        }
    };

    let fallback = result.raw_text().and_then(|raw| fallback_value(kind, raw));

    Ok(DecodeResponse {
        kind,
        result,
        fallback,
    })
}

/// Default value shown beside a failed decode, for kinds that define one.
fn fallback_value(kind: ResponseKind, raw_text: &str) -> Option<Value> {
    match kind {
        ResponseKind::CandidateAnalysis => serde_json::to_value(CandidateAnalysis::fallback(
            "the model reply could not be read",
        ))
        .ok(),
        ResponseKind::OutreachOptions => {
            serde_json::to_value(OutreachOption::parse_error(raw_text)).ok()
        }
        ResponseKind::TalentStrategy => {
            serde_json::to_value(TalentStrategy::fallback(Vec::new())).ok()
        }
        _ => None,
    }
}

fn typed<T: StructuredShape + Serialize>(text: &str) -> StructuredResult<Value> {
    match extract_structured::<T>(text).map(serde_json::to_value) {
        StructuredResult::Success { value: Ok(value) } => StructuredResult::Success { value },
        StructuredResult::Success { value: Err(_) } => StructuredResult::malformed(text),
        StructuredResult::Failure { kind, raw_text } => {
            StructuredResult::Failure { kind, raw_text }
        }
    }
}

fn to_success<T: Serialize>(value: T, text: &str) -> StructuredResult<Value> {
    match serde_json::to_value(value) {
        Ok(value) => StructuredResult::Success { value },
        Err(_) => StructuredResult::malformed(text),
    }
}
