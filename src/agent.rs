// Narrative Agent - turns visa and stage data into readable guidance
//
// The agent is either Unavailable (no credential at startup, permanent for the
// process lifetime) or Available, in which case every call makes exactly one
// upstream round trip. Nothing is retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::entities::{CurrentVisa, StageInput};
use crate::error::{AppError, Result};
use crate::prompts;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

// ============================================================================
// Generation seam
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GenerationFailure {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Opaque text-completion collaborator
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationFailure>;
}

// ============================================================================
// Gemini REST client
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl GeminiConfig {
    pub fn new(api_key: &str) -> Self {
        GeminiConfig {
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default()
    }
}

pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> std::result::Result<Self, GenerationFailure> {
        let client = Client::builder()
            .build()
            .map_err(|e| GenerationFailure::Network(e.to_string()))?;

        Ok(GeminiClient { client, config })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationFailure> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationFailure::Api {
                status: status.as_u16(),
                body,
            });
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationFailure::InvalidResponse(e.to_string()))?;

        Ok(data.text())
    }
}

// ============================================================================
// Next-stage resolution
// ============================================================================

/// Where the current stage sits in the remaining path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStage<'a> {
    /// Found, followed by this stage
    Next(&'a str),

    /// Found as the last entry
    Final,

    /// Not in the path at all; `first` is where the path begins, if anywhere
    NotInPath { first: Option<&'a str> },
}

pub fn next_stage<'a>(current: &str, remaining: &'a [String]) -> NextStage<'a> {
    match remaining.iter().position(|s| s == current) {
        Some(index) => match remaining.get(index + 1) {
            Some(next) => NextStage::Next(next),
            None => NextStage::Final,
        },
        None => NextStage::NotInPath {
            first: remaining.first().map(String::as_str),
        },
    }
}

// ============================================================================
// Agent
// ============================================================================

#[derive(Clone)]
pub enum NarrativeAgent {
    Unavailable,
    Available { client: Arc<dyn TextGenerator> },
}

impl NarrativeAgent {
    pub fn available(client: Arc<dyn TextGenerator>) -> Self {
        NarrativeAgent::Available { client }
    }

    /// Gemini-backed agent, or Unavailable when there is no credential
    pub fn from_config(config: Option<GeminiConfig>) -> Self {
        let Some(config) = config else {
            warn!("GOOGLE_API_KEY not set, AI features disabled");
            return NarrativeAgent::Unavailable;
        };

        let model = config.model.clone();
        match GeminiClient::new(config) {
            Ok(client) => {
                info!(%model, "AI agent ready");
                NarrativeAgent::available(Arc::new(client))
            }
            Err(e) => {
                warn!("AI agent not initialized: {e}");
                NarrativeAgent::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, NarrativeAgent::Available { .. })
    }

    fn client(&self) -> Result<&dyn TextGenerator> {
        match self {
            NarrativeAgent::Available { client } => Ok(client.as_ref()),
            NarrativeAgent::Unavailable => Err(AppError::UpstreamUnavailable),
        }
    }

    /// Explain the user's current status at `stage`
    pub async fn explain(&self, visa: &CurrentVisa, stage: &StageInput) -> Result<String> {
        let client = self.client()?;
        let prompt = prompts::explanation_prompt(visa, stage);

        let text = client.generate(&prompt).await.map_err(|e| {
            error!("Error calling generation API: {e}");
            AppError::Generation(format!("Failed to generate explanation: {e}"))
        })?;

        Ok(non_empty_or(text, prompts::EMPTY_EXPLANATION.to_string()))
    }

    /// Guidance toward whatever follows `stage` in `remaining`.
    ///
    /// A stage that is not in the path gets guidance toward the first remaining
    /// stage. The final stage, or an empty path, returns a fixed message with
    /// no upstream call.
    pub async fn next_steps(&self, stage: &StageInput, remaining: &[String]) -> Result<String> {
        let client = self.client()?;

        let target = match next_stage(&stage.stage_name, remaining) {
            NextStage::Next(next) => next,
            NextStage::NotInPath { first: Some(first) } => first,
            NextStage::Final | NextStage::NotInPath { first: None } => {
                return Ok(prompts::FINAL_STAGE_MESSAGE.to_string());
            }
        };

        let prompt = prompts::next_steps_prompt(&stage.stage_name, target);
        let text = client.generate(&prompt).await.map_err(|e| {
            error!("Error calling generation API: {e}");
            AppError::Generation(format!("Failed to generate next steps: {e}"))
        })?;

        Ok(non_empty_or(text, prompts::empty_next_steps(target)))
    }
}

fn non_empty_or(text: String, fallback: String) -> String {
    if text.is_empty() {
        fallback
    } else {
        text
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingGenerator;
    use super::*;
    use crate::entities::VisaStatus;

    fn path() -> Vec<String> {
        vec!["PERM".into(), "I-140".into(), "I-485".into()]
    }

    fn visa() -> CurrentVisa {
        CurrentVisa {
            visa_type: "H1B".to_string(),
            country: None,
            start_date: "2024-01-15".to_string(),
            expiration_date: "2027-01-14".to_string(),
            status: VisaStatus::Active,
        }
    }

    #[test]
    fn test_next_stage_resolution() {
        let remaining = path();

        assert_eq!(next_stage("PERM", &remaining), NextStage::Next("I-140"));
        assert_eq!(next_stage("I-140", &remaining), NextStage::Next("I-485"));
        assert_eq!(next_stage("I-485", &remaining), NextStage::Final);
        assert_eq!(
            next_stage("H1B", &remaining),
            NextStage::NotInPath { first: Some("PERM") }
        );
        assert_eq!(next_stage("H1B", &[]), NextStage::NotInPath { first: None });
    }

    #[test]
    fn test_gemini_endpoint() {
        let mut config = GeminiConfig::new("key");
        config.base_url = "http://localhost:8080/".to_string();

        assert_eq!(
            config.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), "Hello, world");

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");
    }

    #[tokio::test]
    async fn test_unavailable_agent() {
        let agent = NarrativeAgent::from_config(None);
        assert!(!agent.is_available());

        let stage = StageInput::default_current();
        assert!(matches!(
            agent.explain(&visa(), &stage).await,
            Err(AppError::UpstreamUnavailable)
        ));
        assert!(matches!(
            agent.next_steps(&stage, &path()).await,
            Err(AppError::UpstreamUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_explain_returns_generated_text_verbatim() {
        let generator = RecordingGenerator::replying("  Your H1B is active.\n");
        let agent = NarrativeAgent::available(generator.clone());

        let text = agent
            .explain(&visa(), &StageInput::default_current())
            .await
            .unwrap();

        assert_eq!(text, "  Your H1B is active.\n");
        assert_eq!(generator.calls(), 1);
        assert!(generator.prompts.lock().unwrap()[0].contains("Current Stage: H1B"));
    }

    #[tokio::test]
    async fn test_explain_empty_reply_falls_back() {
        let agent = NarrativeAgent::available(RecordingGenerator::replying(""));
        let text = agent
            .explain(&visa(), &StageInput::default_current())
            .await
            .unwrap();

        assert_eq!(text, prompts::EMPTY_EXPLANATION);
    }

    #[tokio::test]
    async fn test_whitespace_reply_is_returned_verbatim() {
        let agent = NarrativeAgent::available(RecordingGenerator::replying(" \n"));

        let text = agent
            .explain(&visa(), &StageInput::default_current())
            .await
            .unwrap();
        assert_eq!(text, " \n");

        let text = agent
            .next_steps(&StageInput::named("PERM"), &path())
            .await
            .unwrap();
        assert_eq!(text, " \n");
    }

    #[tokio::test]
    async fn test_explain_generation_error_carries_upstream_message() {
        let agent = NarrativeAgent::available(RecordingGenerator::failing("quota exceeded"));

        let err = agent
            .explain(&visa(), &StageInput::default_current())
            .await
            .unwrap_err();

        match err {
            AppError::Generation(message) => {
                assert!(message.starts_with("Failed to generate explanation:"));
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_next_steps_final_stage_skips_upstream() {
        let generator = RecordingGenerator::replying("unused");
        let agent = NarrativeAgent::available(generator.clone());
        let last = StageInput::named("I-485");

        let text = agent.next_steps(&last, &path()).await.unwrap();

        assert_eq!(text, prompts::FINAL_STAGE_MESSAGE);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_next_steps_prompts_for_following_stage() {
        let generator = RecordingGenerator::replying("Gather your I-140 evidence.");
        let agent = NarrativeAgent::available(generator.clone());
        let perm = StageInput::named("PERM");

        let text = agent.next_steps(&perm, &path()).await.unwrap();

        assert_eq!(text, "Gather your I-140 evidence.");
        assert!(generator.prompts.lock().unwrap()[0].contains("next stage: I-140"));
    }

    #[tokio::test]
    async fn test_next_steps_outside_path_targets_first_stage() {
        let generator = RecordingGenerator::replying("");
        let agent = NarrativeAgent::available(generator.clone());

        let text = agent
            .next_steps(&StageInput::default_current(), &path())
            .await
            .unwrap();

        assert_eq!(text, "Prepare for the PERM stage.");
        assert!(generator.prompts.lock().unwrap()[0].contains("currently at the H1B stage"));

        let text = agent
            .next_steps(&StageInput::default_current(), &[])
            .await
            .unwrap();
        assert_eq!(text, prompts::FINAL_STAGE_MESSAGE);
        assert_eq!(generator.calls(), 1);
    }
}
