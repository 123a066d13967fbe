//! Oracle clients: the language model that judges semantic rules.

pub mod http;

use std::fmt;
use std::time::Duration;

use crate::errors::DolceResult;

pub use http::HttpOracle;

/// A blocking text-generation backend.
///
/// Implementations own their timeout and retry policy; an `Err` from
/// [`Oracle::generate`] means the backend gave up.
pub trait Oracle {
    fn test_connection(&self) -> bool;

    fn generate(&self, prompt: &str, system: &str) -> DolceResult<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAi,
}

impl Provider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "ollama" => Some(Provider::Ollama),
            "openai" => Some(Provider::OpenAi),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAi => "openai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Connection and sampling parameters for an [`HttpOracle`].
#[derive(Clone, Debug, PartialEq)]
pub struct OracleSettings {
    pub provider: Provider,
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Initial backoff; doubles on each retry.
    pub retry_delay: Duration,
}

impl OracleSettings {
    pub fn new(provider: Provider, url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            url: url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            temperature: 0.0,
            max_tokens: 2000,
            timeout: Duration::from_secs(120),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}
