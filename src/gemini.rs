use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::StatusCode;

use crate::error::{AnalyzeError, RemoteError};
use crate::upload::UploadedImage;

/// One answer from the backend: the generated text plus the model that
/// actually produced it (fallback means this is not always the first choice).
#[derive(Debug, Clone)]
pub struct GeneratedAnalysis {
    pub text: String,
    pub model: String,
}

/// The remote multimodal capability: image bytes + prompt in, text out.
/// The live implementation talks to Gemini; tests plug in stubs.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    async fn generate(
        &self,
        image: &UploadedImage,
        prompt: &str,
    ) -> Result<GeneratedAnalysis, AnalyzeError>;
}

/// Tried in order when no model is pinned. Newer models 404 on older API
/// keys, so a 404 moves on to the next candidate.
const MODEL_CANDIDATES: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.5-pro",
    "gemini-2.0-flash-exp",
    "gemini-2.0-flash",
    "gemini-flash-latest",
    "gemini-pro-latest",
];

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    models: Vec<String>,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model_override: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let models = match model_override {
            Some(model) => vec![model],
            None => MODEL_CANDIDATES.iter().map(|m| m.to_string()).collect(),
        };
        Ok(GeminiClient {
            http,
            api_key,
            models,
            timeout,
        })
    }

    fn map_transport(&self, err: reqwest::Error) -> AnalyzeError {
        if err.is_timeout() {
            AnalyzeError::Timeout(self.timeout)
        } else {
            RemoteError::Transport(err.to_string()).into()
        }
    }
}

/// A single generateContent attempt against one named model. Split from
/// the fallback walk so the walk can be exercised without a network.
#[async_trait]
trait ModelCall: Send + Sync {
    async fn call(
        &self,
        model: &str,
        image: &UploadedImage,
        prompt: &str,
    ) -> Result<String, AnalyzeError>;
}

#[async_trait]
impl ModelCall for GeminiClient {
    async fn call(
        &self,
        model: &str,
        image: &UploadedImage,
        prompt: &str,
    ) -> Result<String, AnalyzeError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            model, self.api_key
        );

        let payload = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    {
                        "inline_data": {
                            "mime_type": image.mime,
                            "data": general_purpose::STANDARD.encode(&image.bytes),
                        }
                    }
                ]
            }]
        });

        tracing::debug!(model, mime = %image.mime, bytes = image.bytes.len(), "sending generateContent request");

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            return Err(classify_failure(status, &body).into());
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;
        Ok(extract_text(&value)?)
    }
}

/// Walks the candidate list until one model answers. Quota and auth
/// failures apply to the key, not the model, and a timeout already spent
/// the whole wait budget, so those end the walk immediately.
async fn walk_models(
    caller: &dyn ModelCall,
    models: &[String],
    image: &UploadedImage,
    prompt: &str,
) -> Result<GeneratedAnalysis, AnalyzeError> {
    let mut last_err = None;
    for model in models {
        match caller.call(model, image, prompt).await {
            Ok(text) => {
                tracing::info!(%model, "model answered");
                return Ok(GeneratedAnalysis {
                    text,
                    model: model.clone(),
                });
            }
            Err(
                err @ (AnalyzeError::Remote(RemoteError::Quota | RemoteError::Auth)
                | AnalyzeError::Timeout(_)),
            ) => {
                return Err(err);
            }
            Err(AnalyzeError::Remote(RemoteError::ModelUnavailable(msg))) => {
                tracing::warn!(%model, %msg, "model not available, trying next");
                last_err = Some(RemoteError::ModelUnavailable(msg).into());
            }
            Err(err) => {
                tracing::warn!(%model, %err, "model call failed, trying next");
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        RemoteError::ModelUnavailable("no models configured".into()).into()
    }))
}

#[async_trait]
impl VisionBackend for GeminiClient {
    async fn generate(
        &self,
        image: &UploadedImage,
        prompt: &str,
    ) -> Result<GeneratedAnalysis, AnalyzeError> {
        walk_models(self, &self.models, image, prompt).await
    }
}

/// Maps a non-2xx Gemini reply to the error taxonomy. Status codes are
/// authoritative; the substring checks catch proxies and older API versions
/// that wrap everything in a 400.
fn classify_failure(status: StatusCode, body: &str) -> RemoteError {
    let lower = body.to_lowercase();
    match status {
        StatusCode::TOO_MANY_REQUESTS => RemoteError::Quota,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Auth,
        StatusCode::NOT_FOUND => RemoteError::ModelUnavailable(truncate(body)),
        _ if lower.contains("quota") || lower.contains("resource_exhausted") => RemoteError::Quota,
        _ if lower.contains("permission") || lower.contains("api key not valid") => {
            RemoteError::Auth
        }
        _ => RemoteError::Rejected {
            status: status.as_u16(),
            message: truncate(body),
        },
    }
}

/// Pulls the generated text out of a generateContent response.
fn extract_text(value: &serde_json::Value) -> Result<String, RemoteError> {
    value["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(|t| t.to_string())
        .ok_or_else(|| RemoteError::MalformedResponse("no text in candidates".into()))
}

fn truncate(body: &str) -> String {
    let mut end = body.len().min(300);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}
