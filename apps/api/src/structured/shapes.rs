//! Recruiting payloads the assistant asks the model for.
//!
//! Field names follow the JSON the prompts request (camelCase). Each type declares
//! its top-level shape and rejects decodes that parse but are implicitly wrong.

use serde::{Deserialize, Deserializer, Serialize};

use crate::structured::{Shape, StructuredShape};

/// Separator the job-description prompt asks the model to put between versions.
pub const JD_SPLIT_MARKER: &str = "|||SPLIT|||";

fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is empty"));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Interview guide
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQuestions {
    pub resume_deep_dive: Vec<String>,
    pub gap_analysis: Vec<String>,
    pub behavioral_questions: Vec<String>,
}

impl StructuredShape for InterviewQuestions {
    const SHAPE: Shape = Shape::Object;

    fn validate(&self) -> Result<(), String> {
        let total =
            self.resume_deep_dive.len() + self.gap_analysis.len() + self.behavioral_questions.len();
        if total == 0 {
            return Err("interview guide has no questions".to_string());
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Hire")]
    StrongHire,
    Hire,
    Hold,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateAnalysis {
    /// Fit score in 0..=100.
    pub score: f64,
    pub summary: String,
    pub recommendation: Recommendation,
    pub reasoning: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub interview_questions: Vec<String>,
}

impl CandidateAnalysis {
    /// Neutral placeholder shown when no usable analysis came back.
    pub fn fallback(reason: &str) -> Self {
        Self {
            score: 0.0,
            summary: format!(
                "Analysis failed: {reason}. Please try again with shorter text or check the content."
            ),
            recommendation: Recommendation::Hold,
            reasoning: "No usable analysis was returned.".to_string(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            interview_questions: Vec::new(),
        }
    }
}

impl StructuredShape for CandidateAnalysis {
    const SHAPE: Shape = Shape::Object;

    fn validate(&self) -> Result<(), String> {
        if !self.score.is_finite() || !(0.0..=100.0).contains(&self.score) {
            return Err(format!("score {} is outside 0..=100", self.score));
        }
        require_non_empty("summary", &self.summary)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate persona
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaBackground {
    pub education: String,
    pub experience: String,
    #[serde(default)]
    pub industries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePersona {
    pub archetype: String,
    pub quote: String,
    pub bio: String,
    #[serde(default)]
    pub work_type: Vec<String>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    pub background: PersonaBackground,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frustrations: Option<Vec<String>>,
}

impl StructuredShape for CandidatePersona {
    const SHAPE: Shape = Shape::Object;

    fn validate(&self) -> Result<(), String> {
        require_non_empty("archetype", &self.archetype)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Talent search strategy
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCompany {
    pub name: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanSearch {
    pub label: String,
    pub query: String,
}

/// A web page the model cited while building the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// Every list is optional in the model's answer: absent or `null` reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TalentStrategy {
    #[serde(deserialize_with = "null_as_default")]
    pub channel_strategy: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub company_hunting_list: Vec<TargetCompany>,
    #[serde(deserialize_with = "null_as_default")]
    pub boolean_strings: Vec<BooleanSearch>,
    #[serde(deserialize_with = "null_as_default")]
    pub sources: Vec<Source>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl TalentStrategy {
    /// Placeholder shown when the strategy reply could not be read. Citations
    /// that arrived beside the reply are still kept.
    pub fn fallback(sources: impl IntoIterator<Item = Source>) -> Self {
        Self {
            channel_strategy: vec![
                "Parse error: the model reply was not in the expected format. Please try again."
                    .to_string(),
            ],
            ..Self::default()
        }
        .with_sources(sources)
    }

    /// Attaches citations that arrive beside the model text rather than inside it.
    /// Entries without a usable link are dropped.
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.sources = sources
            .into_iter()
            .filter(|s| !s.uri.trim().is_empty() && s.uri != "#")
            .collect();
        self
    }
}

impl StructuredShape for TalentStrategy {
    const SHAPE: Shape = Shape::Object;
}

// ────────────────────────────────────────────────────────────────────────────
// Outreach messages
// ────────────────────────────────────────────────────────────────────────────

/// One candidate outreach draft. The model returns these as a JSON array, so
/// call sites decode `Vec<OutreachOption>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachOption {
    #[serde(rename = "type")]
    pub kind: String,
    pub subject: String,
    pub content: String,
}

impl OutreachOption {
    /// Single-entry list that surfaces the unparsed reply so the recruiter can
    /// still copy from it.
    pub fn parse_error(raw_text: &str) -> Vec<Self> {
        vec![Self {
            kind: "Error".to_string(),
            subject: "Error parsing response".to_string(),
            content: raw_text.to_string(),
        }]
    }
}

impl StructuredShape for OutreachOption {
    const SHAPE: Shape = Shape::Object;

    fn validate(&self) -> Result<(), String> {
        require_non_empty("content", &self.content)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Plain-text conventions
// ────────────────────────────────────────────────────────────────────────────

/// Two job-description versions returned in one reply, separated by
/// [`JD_SPLIT_MARKER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptionDrafts {
    pub platform: String,
    pub social: String,
}

impl JobDescriptionDrafts {
    pub fn from_model_text(text: &str) -> Self {
        let mut parts = text.split(JD_SPLIT_MARKER).map(str::trim);
        let platform = parts.next().filter(|p| !p.is_empty());
        let social = parts.next().filter(|p| !p.is_empty());
        Self {
            platform: platform
                .unwrap_or("Generation failed for Platform version.")
                .to_string(),
            social: social
                .unwrap_or("Generation failed for Social Media version.")
                .to_string(),
        }
    }
}

/// Splits a comma-separated skill suggestion. Accepts the full-width comma too.
pub fn parse_skill_list(text: &str) -> Vec<String> {
    text.split([',', '，', '\n'])
        .map(|s| s.trim().trim_matches(|c| c == '*' || c == '-').trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::{extract_structured, StructuredResult};

    #[test]
    fn test_candidate_analysis_from_fenced_reply() {
        let raw = r#"Here is my assessment:
```json
{
  "score": 82,
  "summary": "Strong backend fit",
  "recommendation": "Strong Hire",
  "reasoning": "Five years of Rust in production",
  "strengths": ["Rust", "Distributed systems"],
  "weaknesses": ["No frontend"],
  "interviewQuestions": ["Describe your largest Tokio service"]
}
```"#;
        let analysis = extract_structured::<CandidateAnalysis>(raw).into_value().unwrap();
        assert_eq!(analysis.score, 82.0);
        assert_eq!(analysis.recommendation, Recommendation::StrongHire);
        assert_eq!(analysis.interview_questions.len(), 1);
    }

    #[test]
    fn test_candidate_analysis_rejects_out_of_range_score() {
        let raw = r#"{"score": 140, "summary": "x", "recommendation": "Hire", "reasoning": "y"}"#;
        assert!(!extract_structured::<CandidateAnalysis>(raw).is_success());
    }

    #[test]
    fn test_candidate_analysis_rejects_unknown_recommendation() {
        let raw = r#"{"score": 50, "summary": "x", "recommendation": "Maybe", "reasoning": "y"}"#;
        assert!(!extract_structured::<CandidateAnalysis>(raw).is_success());
    }

    #[test]
    fn test_candidate_analysis_fallback_on_refusal() {
        let raw = "I cannot evaluate candidates.";
        let analysis = extract_structured::<CandidateAnalysis>(raw)
            .unwrap_or_else(|_, _| CandidateAnalysis::fallback("unreadable reply"));
        assert_eq!(analysis.score, 0.0);
        assert_eq!(analysis.recommendation, Recommendation::Hold);
        assert!(analysis.strengths.is_empty());
        assert!(analysis.summary.contains("unreadable reply"));
    }

    #[test]
    fn test_interview_questions_camel_case() {
        let raw = r#"{"resumeDeepDive":["a"],"gapAnalysis":["b"],"behavioralQuestions":["c","d"]}"#;
        let q = extract_structured::<InterviewQuestions>(raw).into_value().unwrap();
        assert_eq!(q.resume_deep_dive, vec!["a"]);
        assert_eq!(q.behavioral_questions.len(), 2);
    }

    #[test]
    fn test_interview_questions_all_empty_is_rejected() {
        let raw = r#"{"resumeDeepDive":[],"gapAnalysis":[],"behavioralQuestions":[]}"#;
        assert!(!extract_structured::<InterviewQuestions>(raw).is_success());
    }

    #[test]
    fn test_persona_with_optional_frustrations() {
        let raw = r#"```json
{"archetype":"程式魔法師","quote":"Ship it","bio":"Builds things.",
 "workType":["Remote"],"traits":["Curious"],"skills":["Rust"],"values":["Growth"],
 "background":{"education":"BSc","experience":"5y","industries":["Fintech"]},
 "channels":["GitHub"],"keywords":["rust"]}
```"#;
        let persona = extract_structured::<CandidatePersona>(raw).into_value().unwrap();
        assert_eq!(persona.archetype, "程式魔法師");
        assert_eq!(persona.background.industries, vec!["Fintech"]);
        assert!(persona.frustrations.is_none());
    }

    #[test]
    fn test_talent_strategy_missing_lists_default_empty() {
        let raw = r#"Based on my search: {"channelStrategy": ["LinkedIn", "PTT Soft_Job"]}"#;
        let strategy = extract_structured::<TalentStrategy>(raw).into_value().unwrap();
        assert_eq!(strategy.channel_strategy.len(), 2);
        assert!(strategy.company_hunting_list.is_empty());
        assert!(strategy.boolean_strings.is_empty());
    }

    #[test]
    fn test_talent_strategy_null_lists_read_as_empty() {
        let raw = r#"{"channelStrategy":["LinkedIn"],"companyHuntingList":null,"booleanStrings":[],"sources":null}"#;
        let strategy = extract_structured::<TalentStrategy>(raw).into_value().unwrap();
        assert_eq!(strategy.channel_strategy, vec!["LinkedIn"]);
        assert!(strategy.company_hunting_list.is_empty());
        assert!(strategy.sources.is_empty());
    }

    #[test]
    fn test_talent_strategy_fallback_keeps_sources() {
        let strategy = TalentStrategy::fallback(vec![Source {
            title: "Jobs".into(),
            uri: "https://example.com/jobs".into(),
        }]);
        assert_eq!(strategy.channel_strategy.len(), 1);
        assert!(strategy.channel_strategy[0].starts_with("Parse error"));
        assert!(strategy.company_hunting_list.is_empty());
        assert_eq!(strategy.sources.len(), 1);
    }

    #[test]
    fn test_talent_strategy_with_sources_drops_placeholders() {
        let strategy = TalentStrategy::default().with_sources(vec![
            Source {
                title: "Jobs".into(),
                uri: "https://example.com/jobs".into(),
            },
            Source {
                title: "Source".into(),
                uri: "#".into(),
            },
        ]);
        assert_eq!(strategy.sources.len(), 1);
    }

    #[test]
    fn test_outreach_options_array() {
        let raw = r#"Sure! Here are three drafts:
[
  {"type": "Short & Punchy", "subject": "Quick chat?", "content": "Hi Alice"},
  {"type": "Question-Based", "subject": "Your Tokio work", "content": "Hi again"}
]
Good luck!"#;
        let options = extract_structured::<Vec<OutreachOption>>(raw).into_value().unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].kind, "Short & Punchy");
    }

    #[test]
    fn test_outreach_parse_error_keeps_raw_reply() {
        let raw = "Dear candidate, I would love to chat.";
        let result = extract_structured::<Vec<OutreachOption>>(raw);
        let options = match result {
            StructuredResult::Success { value } => value,
            StructuredResult::Failure { raw_text, .. } => OutreachOption::parse_error(&raw_text),
        };
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].kind, "Error");
        assert_eq!(options[0].content, raw);
    }

    #[test]
    fn test_outreach_serializes_type_field() {
        let json = serde_json::to_value(&OutreachOption::parse_error("x")[0]).unwrap();
        assert_eq!(json["type"], "Error");
    }

    #[test]
    fn test_jd_drafts_split() {
        let drafts = JobDescriptionDrafts::from_model_text(
            "## Backend Engineer\nDetails\n|||SPLIT|||\n🚀 We're hiring!",
        );
        assert_eq!(drafts.platform, "## Backend Engineer\nDetails");
        assert_eq!(drafts.social, "🚀 We're hiring!");
    }

    #[test]
    fn test_jd_drafts_missing_social_part() {
        let drafts = JobDescriptionDrafts::from_model_text("Only one version");
        assert_eq!(drafts.platform, "Only one version");
        assert_eq!(drafts.social, "Generation failed for Social Media version.");

        let empty = JobDescriptionDrafts::from_model_text("   ");
        assert_eq!(empty.platform, "Generation failed for Platform version.");
    }

    #[test]
    fn test_parse_skill_list() {
        assert_eq!(
            parse_skill_list("React, TypeScript，Node.js,, AWS\n- CI/CD"),
            vec!["React", "TypeScript", "Node.js", "AWS", "CI/CD"]
        );
        assert!(parse_skill_list("  ").is_empty());
    }
}
