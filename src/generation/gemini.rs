use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::{build_prompt, caption_or_fallback, CaptionGenerator, GenerationError, SamplingParams};
use crate::config::GeminiConfig;
use crate::logging::{record_generation, GenerationOutcome, GenerationRecord};
use crate::model::CopyInputs;

const PROVIDER_NAME: &str = "gemini";
const MAX_ERROR_BODY: usize = 512;

/// Gemini `generateContent` client. The API key is handed in by the caller;
/// nothing here reads the environment.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    sampling: SamplingParams,
    request_timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        config: &GeminiConfig,
        request_timeout: Duration,
    ) -> Result<Self, GenerationError> {
        if config.model.trim().is_empty() {
            return Err(GenerationError::Configuration(
                "Gemini model name cannot be empty".to_string(),
            ));
        }

        let trimmed_endpoint = config.endpoint.trim_end_matches('/');
        let endpoint = Url::parse(&format!(
            "{}/{}:generateContent",
            trimmed_endpoint, config.model
        ))
        .map_err(|err| {
            GenerationError::Configuration(format!(
                "invalid Gemini endpoint {}: {}",
                config.endpoint, err
            ))
        })?;

        let client = Client::builder()
            .user_agent("reelscopy-rs (gemini)")
            .connect_timeout(Duration::from_secs(10))
            .timeout(request_timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| {
                GenerationError::Configuration(format!("failed to build HTTP client: {}", err))
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            sampling: config.sampling(),
            model: config.model.clone(),
            request_timeout,
        })
    }

    pub fn initialize(&self) -> Result<(), GenerationError> {
        if self.api_key.trim().is_empty() {
            return Err(GenerationError::Configuration(
                "an API key is required to use the Gemini backend".to_string(),
            ));
        }

        info!(
            "✅ Gemini ready (model: {}, timeout: {:?})",
            self.model, self.request_timeout
        );
        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_once(&self, prompt: &str) -> Result<Option<String>, GenerationError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.sampling.temperature,
                top_p: self.sampling.top_p,
                top_k: self.sampling.top_k,
            },
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending Gemini request");

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| GenerationError::http(PROVIDER_NAME, err))?;

        let status = response.status();
        if status.is_success() {
            let payload: GeminiResponse = response
                .json()
                .await
                .map_err(|err| {
                    GenerationError::response(PROVIDER_NAME, err.without_url().to_string())
                })?;
            return Ok(payload.primary_text());
        }

        let raw = response
            .text()
            .await
            .unwrap_or_else(|_| "<unavailable>".to_string());
        let message = serde_json::from_str::<GeminiErrorResponse>(&raw)
            .ok()
            .and_then(|body| body.error)
            .and_then(|err| err.message)
            .unwrap_or_else(|| truncate(&raw));

        Err(GenerationError::status(PROVIDER_NAME, status, message))
    }
}

#[async_trait]
impl CaptionGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn generate_caption(&self, inputs: &CopyInputs) -> Result<String, GenerationError> {
        let prompt = build_prompt(inputs);
        let started = Instant::now();
        let result = self.send_once(&prompt).await;

        let (outcome, result) = match result {
            Ok(Some(text)) if !text.trim().is_empty() => {
                (GenerationOutcome::Text(text.clone()), Ok(text))
            }
            Ok(_) => (GenerationOutcome::Fallback, Ok(caption_or_fallback(None))),
            Err(err) => {
                error!(
                    provider = PROVIDER_NAME,
                    timeout = err.is_timeout(),
                    "Gemini API error: {}",
                    err
                );
                (GenerationOutcome::Failed(err.to_string()), Err(err))
            }
        };

        record_generation(&GenerationRecord {
            provider: PROVIDER_NAME.to_string(),
            model: self.model.clone(),
            subject: inputs.subject.clone(),
            keyword: inputs.keyword.clone(),
            prompt_chars: prompt.chars().count(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            outcome,
        });

        result
    }
}

fn truncate(input: &str) -> String {
    if input.len() <= MAX_ERROR_BODY {
        return input.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &input[..end])
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
}

#[derive(Debug, Deserialize, Default)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

impl GeminiResponse {
    /// Concatenates the text parts of the first candidate that has any.
    fn primary_text(self) -> Option<String> {
        self.candidates?.into_iter().find_map(|candidate| {
            let parts: Vec<String> = candidate
                .content?
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.concat())
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct GeminiErrorResponse {
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_generate_content_url_from_endpoint_and_model() {
        let config = GeminiConfig {
            endpoint: "https://example.test/v1beta/models/".into(),
            ..GeminiConfig::default()
        };
        let client =
            GeminiClient::new("key".into(), &config, Duration::from_secs(30)).expect("client");
        assert_eq!(
            client.endpoint.as_str(),
            "https://example.test/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn rejects_blank_model_and_blank_key() {
        let config = GeminiConfig {
            model: " ".into(),
            ..GeminiConfig::default()
        };
        assert!(GeminiClient::new("key".into(), &config, Duration::from_secs(30)).is_err());

        let client =
            GeminiClient::new(String::new(), &GeminiConfig::default(), Duration::from_secs(30))
                .expect("client");
        assert!(client.initialize().is_err());
    }

    #[test]
    fn serializes_sampling_parameters_in_camel_case() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: "oi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                top_p: 0.25,
                top_k: 40,
            },
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "oi");
        assert_eq!(value["generationConfig"]["topK"], 40);
        assert_eq!(value["generationConfig"]["topP"], 0.25);
        assert_eq!(value["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let payload = r#"{"candidates":[{"content":{"parts":[{"text":"👇 Olá "},{"text":"mundo"}]}},{"content":{"parts":[{"text":"ignored"}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(payload).expect("parse");
        assert_eq!(parsed.primary_text().as_deref(), Some("👇 Olá mundo"));
    }

    #[test]
    fn missing_candidates_or_parts_yield_none() {
        let parsed: GeminiResponse = serde_json::from_str("{}").expect("parse");
        assert!(parsed.primary_text().is_none());

        let blocked = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(blocked).expect("parse");
        assert!(parsed.primary_text().is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let input = "ç".repeat(MAX_ERROR_BODY);
        let truncated = truncate(&input);
        assert!(truncated.ends_with('…'));
        assert!(truncated.len() <= MAX_ERROR_BODY + '…'.len_utf8());
    }
}
