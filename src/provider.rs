//! Generation collaborator seam.
//!
//! The executor only knows `(prompt) -> Result<String, ProviderError>`.
//! The HTTP provider speaks an OpenAI-style chat-completions API over a
//! blocking client with a per-call timeout; tests inject fakes through
//! the same trait.

use crate::config::GeneratorConfig;
use crate::spec::Endpoint;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Failure taxonomy for a single generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network/timeout/service error; retried with backoff.
    Transient(String),
    /// The service replied but the content was empty or unusable after
    /// cleanup; retried like a transient failure.
    Malformed(String),
    /// Unusable credentials or unrecoverable setup failure; aborts the
    /// whole run immediately, no retry, no fallback.
    Fatal(String),
}

impl ProviderError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderError::Fatal(_))
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transient(msg) => write!(f, "transient generation error: {}", msg),
            ProviderError::Malformed(msg) => write!(f, "malformed generation response: {}", msg),
            ProviderError::Fatal(msg) => write!(f, "fatal configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

pub trait GenerationProvider: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Provider used when generation is disabled (offline runs). Every call
/// fails transiently, so with fallback enabled the run resolves to the
/// deterministic template engine for every endpoint.
#[derive(Debug, Default)]
pub struct DisabledProvider;

impl GenerationProvider for DisabledProvider {
    fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Transient(
            "generation service disabled".to_string(),
        ))
    }
}

const SYSTEM_PROMPT: &str = "You generate one Rust integration test body for a single HTTP API \
endpoint. Reply with code only, no prose, no surrounding function signature.";

/// OpenAI-style chat-completions client over blocking reqwest.
pub struct ChatCompletionProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionProvider {
    pub fn new(config: &GeneratorConfig) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ProviderError::Fatal(format!("failed to build HTTP client: {}", e)))?;
        if config.api_key.is_none() {
            warn!("no API key configured; the generation service may reject requests");
        }
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

impl GenerationProvider for ChatCompletionProvider {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                ProviderError::Transient("generation call timed out".to_string())
            } else {
                ProviderError::Transient(format!("generation call failed: {}", e))
            }
        })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ProviderError::Fatal(format!(
                "generation service rejected credentials ({})",
                status
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Transient(format!(
                "generation service returned {}",
                status
            )));
        }

        let payload: Value = response
            .json()
            .map_err(|e| ProviderError::Malformed(format!("unparseable response body: {}", e)))?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ProviderError::Malformed("response carried no message content".to_string())
            })?;
        debug!(bytes = content.len(), "generation call succeeded");
        Ok(content.to_string())
    }
}

/// Deterministic prompt payload for one endpoint. The prompt content is
/// a data concern; only its determinism is contractual.
pub fn build_prompt(endpoint: &Endpoint, example_body: Option<&Value>) -> String {
    let mut prompt = format!(
        "Write one test body exercising `{} {}`.\n",
        endpoint.method, endpoint.path
    );
    if let Some(summary) = &endpoint.summary {
        prompt.push_str(&format!("Operation summary: {}\n", summary));
    }
    if let Some(resource) = &endpoint.resource_type {
        prompt.push_str(&format!("Resource type: {}\n", resource));
    }
    if !endpoint.parameters.is_empty() {
        prompt.push_str("Parameters:\n");
        for p in &endpoint.parameters {
            let required = if p.required { "required" } else { "optional" };
            prompt.push_str(&format!("- {} ({}, {})\n", p.name, p.location, required));
            if let Some(c) = &p.constraints {
                if let Some(format) = &c.format {
                    prompt.push_str(&format!("  format: {}\n", format));
                }
                if let (Some(min), Some(max)) = (c.minimum, c.maximum) {
                    prompt.push_str(&format!("  range: [{}, {}]\n", min, max));
                }
            }
        }
    }
    if !endpoint.responses.is_empty() {
        let statuses: Vec<&str> = endpoint
            .responses
            .iter()
            .map(|r| r.status.as_str())
            .collect();
        prompt.push_str(&format!("Declared statuses: {}\n", statuses.join(", ")));
    }
    if endpoint.requires_auth {
        prompt.push_str("The endpoint requires authentication; include an unauthenticated probe expecting 401 or 403.\n");
    }
    if let Some(body) = example_body {
        prompt.push_str("Example request body:\n");
        prompt.push_str(&serde_json::to_string_pretty(body).unwrap_or_default());
        prompt.push('\n');
    }
    prompt.push_str("Use `reqwest::blocking` against `base_url()` and assert response statuses.");
    prompt
}
