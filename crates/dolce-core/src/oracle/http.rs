//! HTTP oracle for Ollama and OpenAI-compatible endpoints, with retry and
//! exponential backoff.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{Oracle, OracleSettings, Provider};
use crate::errors::{DolceError, DolceResult};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct HttpOracle {
    settings: OracleSettings,
    client: Client,
}

impl HttpOracle {
    pub fn new(settings: OracleSettings) -> DolceResult<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { settings, client })
    }

    fn probe_url(&self) -> String {
        match self.settings.provider {
            Provider::Ollama => format!("{}/api/tags", self.settings.url),
            Provider::OpenAi => format!("{}/models", self.settings.url),
        }
    }

    fn generate_url(&self) -> String {
        match self.settings.provider {
            Provider::Ollama => format!("{}/api/generate", self.settings.url),
            Provider::OpenAi => format!("{}/chat/completions", self.settings.url),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.settings.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// POST `body` with retry; 4xx responses fail immediately.
    fn post_with_retry(&self, url: &str, body: &Value) -> DolceResult<Value> {
        let mut backoff = self.settings.retry_delay;
        let mut last_err = String::new();

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                debug!(
                    "oracle: retry attempt {}/{} after {:?}",
                    attempt, self.settings.max_retries, backoff
                );
                std::thread::sleep(backoff);
                backoff = next_backoff(backoff);
            }

            let request = self.authorize(self.client.post(url).json(body));
            match request.send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp.json::<Value>()?);
                    }
                    let text = resp.text().unwrap_or_default();
                    if status.is_client_error() {
                        return Err(DolceError::Oracle(format!(
                            "{} returned {status}: {text}",
                            self.settings.provider
                        )));
                    }
                    last_err = format!("{status}: {text}");
                }
                Err(e) => last_err = e.to_string(),
            }
            warn!("oracle: request to {url} failed: {last_err}");
        }

        Err(DolceError::Connection(format!(
            "{} gave up after {} attempts: {last_err}",
            self.settings.provider,
            self.settings.max_retries + 1
        )))
    }
}

impl Oracle for HttpOracle {
    fn test_connection(&self) -> bool {
        let url = self.probe_url();
        let request = self.authorize(self.client.get(&url).timeout(PROBE_TIMEOUT));
        match request.send() {
            Ok(resp) if resp.status().is_success() => {
                debug!(model = %self.settings.model, "oracle connection check passed");
                true
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "oracle connection check failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "oracle unreachable");
                false
            }
        }
    }

    fn generate(&self, prompt: &str, system: &str) -> DolceResult<String> {
        let body = request_body(&self.settings, prompt, system);
        info!(
            "oracle: sending request to {} model {}",
            self.settings.provider, self.settings.model
        );
        let reply = self.post_with_retry(&self.generate_url(), &body)?;
        reply_text(self.settings.provider, &reply)
    }
}

/// Doubled retry delay, saturating at `Duration::MAX`.
fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2)
}

/// JSON body of a generation request.
pub(crate) fn request_body(settings: &OracleSettings, prompt: &str, system: &str) -> Value {
    match settings.provider {
        Provider::Ollama => json!({
            "model": settings.model,
            "prompt": prompt,
            "system": system,
            "stream": false,
            "options": {
                "temperature": settings.temperature,
                "num_predict": settings.max_tokens,
            },
        }),
        Provider::OpenAi => json!({
            "model": settings.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "temperature": settings.temperature,
            "max_tokens": settings.max_tokens,
        }),
    }
}

/// Generated text out of a provider reply.
pub(crate) fn reply_text(provider: Provider, reply: &Value) -> DolceResult<String> {
    let text = match provider {
        Provider::Ollama => reply.get("response").and_then(Value::as_str),
        Provider::OpenAi => reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str),
    };
    text.map(str::to_string).ok_or_else(|| {
        DolceError::Oracle(format!("{provider} reply has no generated text"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_body_and_reply() {
        let settings = OracleSettings::new(Provider::Ollama, "http://localhost:11434/", "qwen3");
        assert_eq!(settings.url, "http://localhost:11434");
        let body = request_body(&settings, "user", "sys");
        assert_eq!(body["model"], "qwen3");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 2000);
        let reply = json!({"response": "{\"status\": \"good\"}"});
        assert_eq!(
            reply_text(Provider::Ollama, &reply).unwrap(),
            "{\"status\": \"good\"}"
        );
    }

    #[test]
    fn test_openai_body_and_reply() {
        let settings = OracleSettings::new(Provider::OpenAi, "https://api.example.com/v1", "gpt");
        let body = request_body(&settings, "user", "sys");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        let reply = json!({"choices": [{"message": {"content": "ok"}}]});
        assert_eq!(reply_text(Provider::OpenAi, &reply).unwrap(), "ok");
        assert!(reply_text(Provider::OpenAi, &json!({})).is_err());
    }

    #[test]
    fn test_unreachable_endpoint() {
        let mut settings = OracleSettings::new(Provider::Ollama, "http://127.0.0.1:9", "m");
        settings.max_retries = 1;
        settings.retry_delay = Duration::from_millis(1);
        settings.timeout = Duration::from_secs(2);
        let oracle = HttpOracle::new(settings).unwrap();
        assert!(!oracle.test_connection());
        let err = oracle.generate("p", "s").unwrap_err();
        assert!(matches!(err, DolceError::Connection(_)));
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        assert_eq!(next_backoff(Duration::from_millis(500)), Duration::from_secs(1));
        assert_eq!(next_backoff(Duration::MAX), Duration::MAX);
        assert_eq!(next_backoff(Duration::from_secs(u64::MAX / 2 + 1)), Duration::MAX);
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(Provider::from_name("OpenAI"), Some(Provider::OpenAi));
        assert_eq!(Provider::from_name("bard"), None);
    }
}
