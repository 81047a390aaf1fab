//! GeminiClient - Direct REST implementation of the transform service.
//!
//! Calls the Gemini generateContent API directly. The credential comes from
//! secret.json via the secret service; there is no CLI dependency.

use crate::config::{BASE_URL, COMPACT_PROMPT_THRESHOLD, DEFAULT_MODEL, GenerationProfile};
use async_trait::async_trait;
use refine_core::config::{SecretConfig, looks_like_gemini_key};
use refine_core::transform::TransformService;
use refine_core::{RefineError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Transform service backed by the Gemini HTTP API.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Creates a new client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Builds a client from loaded secret configuration.
    ///
    /// # Errors
    ///
    /// - [`RefineError::NoCredential`] if no key is configured
    /// - [`RefineError::InvalidCredential`] if the key fails the shape check,
    ///   so an obviously wrong key never reaches the network
    pub fn try_from_secrets(secrets: &SecretConfig) -> Result<Self> {
        let api_key = secrets.gemini_api_key().ok_or(RefineError::NoCredential)?;
        if !looks_like_gemini_key(api_key) {
            return Err(RefineError::invalid_credential(
                "configured key does not look like a Gemini API key",
            ));
        }
        Ok(Self::new(api_key, DEFAULT_MODEL))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn send_request(&self, text: &str, profile: GenerationProfile) -> Result<String> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(text),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: profile.max_output_tokens,
                candidate_count: 1,
            },
            safety_settings: default_safety_settings(),
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| RefineError::service(format!("request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            RefineError::malformed_response(format!("unparseable response body: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl TransformService for GeminiClient {
    async fn transform(&self, text: &str) -> Result<String> {
        let profile = GenerationProfile::for_text(text);
        debug!(
            chars = text.chars().count(),
            deadline_secs = profile.deadline_secs(),
            "submitting transform request"
        );
        with_deadline(profile, self.send_request(text, profile)).await
    }
}

/// Runs `fut` under the profile's deadline; expiry aborts the request.
pub(crate) async fn with_deadline<F>(profile: GenerationProfile, fut: F) -> Result<String>
where
    F: Future<Output = Result<String>>,
{
    match tokio::time::timeout(profile.deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(RefineError::RequestTimeout {
            deadline_secs: profile.deadline_secs(),
        }),
    }
}

/// The refinement instruction wrapped around the user's text.
///
/// Short texts get the full instruction with explicit do-nots; past the
/// threshold a condensed variant keeps the instruction overhead small
/// relative to the payload.
pub(crate) fn build_prompt(text: &str) -> String {
    if text.chars().count() > COMPACT_PROMPT_THRESHOLD {
        format!(
            "As a grammar and clarity expert, refine this text focusing exclusively on:\n\
             - Correcting grammar, spelling, and punctuation errors\n\
             - Improving sentence structure and readability\n\
             - Using clear, precise language\n\
             - Maintaining the exact original meaning and intent\n\
             \n\
             Text to refine:\n\
             \"{text}\"\n\
             \n\
             Return only the grammatically corrected and clarified version:"
        )
    } else {
        format!(
            "You are a grammar and language clarity expert. Your task is to refine the \
             following text by focusing ONLY on:\n\
             \n\
             1. Fixing grammar, spelling, and punctuation errors\n\
             2. Improving sentence structure for better readability\n\
             3. Using clearer, more precise language\n\
             4. Maintaining the exact original meaning and intent\n\
             \n\
             Do NOT:\n\
             - Add new content or requirements\n\
             - Change the core message or intent\n\
             - Make it more specific or actionable beyond clarity improvements\n\
             - Add context that wasn't originally there\n\
             \n\
             Please refine this text: \"{text}\"\n\
             \n\
             Respond with only the refined text, nothing else."
        )
    }
}

fn default_safety_settings() -> Vec<SafetySetting> {
    const CATEGORIES: [&str; 4] = [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ];
    CATEGORIES
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: "BLOCK_MEDIUM_AND_ABOVE",
        })
        .collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    max_output_tokens: u32,
    candidate_count: u32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .map(|text| text.trim().to_string())
        .ok_or_else(|| {
            RefineError::malformed_response("no text in the response candidates")
        })
}

fn map_http_error(status: StatusCode, body: &str) -> RefineError {
    let (status_text, message) = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            (
                wrapper.error.status.unwrap_or_default(),
                wrapper.error.message.unwrap_or_else(|| body.to_string()),
            )
        })
        .unwrap_or_else(|_| (String::new(), body.to_string()));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RefineError::invalid_credential(message)
        }
        StatusCode::TOO_MANY_REQUESTS => RefineError::quota_exceeded(message),
        _ if status_text == "API_KEY_INVALID" || status_text == "PERMISSION_DENIED" => {
            RefineError::invalid_credential(message)
        }
        _ if status_text == "RESOURCE_EXHAUSTED" => RefineError::quota_exceeded(message),
        _ => RefineError::service(format!("{}: {message}", status.as_u16())),
    }
}
