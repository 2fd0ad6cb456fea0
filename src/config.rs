//! Run configuration.
//!
//! A plain immutable struct constructed once at startup. Environment
//! variables provide defaults; CLI flags override them.
//!
//! ## Environment Variables
//!
//! - `ATG_MODEL` - generation model identifier
//! - `ATG_BASE_URL` - chat-completions base URL
//! - `ATG_API_KEY` - bearer credential for the generation service
//! - `ATG_MAX_RETRIES` - total attempt budget per job (default: 3)
//! - `ATG_BACKOFF_MS` - initial backoff, doubled per retry (default: 1000)
//! - `ATG_WORKERS` - worker coroutines in the pool (default: 4)
//! - `ATG_TIMEOUT_MS` - per-call generation timeout (default: 30000)
//! - `ATG_FALLBACK` - use the deterministic fallback on retry
//!   exhaustion (default: true)
//! - `ATG_STACK_SIZE` - worker coroutine stack size, decimal or `0x`
//!   hex (default: 0x10000)

use anyhow::bail;
use std::env;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Total attempt budget per job. Zero means no generation calls at
    /// all: every job resolves straight to fallback-or-abort.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub thread_pool_size: usize,
    pub timeout_ms: u64,
    pub use_fallback_on_error: bool,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Stack size for worker coroutines.
    pub stack_size: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            max_retries: 3,
            initial_backoff_ms: 1000,
            thread_pool_size: 4,
            timeout_ms: 30_000,
            use_fallback_on_error: true,
            temperature: 0.2,
            max_tokens: 2048,
            stack_size: 0x10000,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model: env::var("ATG_MODEL").unwrap_or(defaults.model),
            base_url: env::var("ATG_BASE_URL").unwrap_or(defaults.base_url),
            api_key: env::var("ATG_API_KEY").ok().filter(|k| !k.is_empty()),
            max_retries: env::var("ATG_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            initial_backoff_ms: env::var("ATG_BACKOFF_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.initial_backoff_ms),
            thread_pool_size: env::var("ATG_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.thread_pool_size),
            timeout_ms: env::var("ATG_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_ms),
            use_fallback_on_error: env::var("ATG_FALLBACK")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.use_fallback_on_error),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            stack_size: env::var("ATG_STACK_SIZE")
                .ok()
                .and_then(|s| {
                    if let Some(hex) = s.strip_prefix("0x") {
                        usize::from_str_radix(hex, 16).ok()
                    } else {
                        s.parse().ok()
                    }
                })
                .unwrap_or(defaults.stack_size),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.thread_pool_size < 1 {
            bail!("thread pool size must be at least 1");
        }
        if self.timeout_ms == 0 {
            bail!("generation timeout must be positive");
        }
        if self.initial_backoff_ms == 0 {
            bail!("initial backoff must be positive");
        }
        Ok(())
    }
}
