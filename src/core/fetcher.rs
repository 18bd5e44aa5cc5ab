use crate::config::EnrichConfig;
use crate::core::extract::parse_details;
use crate::core::prompt::build_prompt;
use crate::domain::cancel::{is_cancelled, CancellationSignal};
use crate::domain::model::{EnrichmentRecord, ImageRef};
use crate::domain::ports::Enricher;
use crate::utils::error::{EnrichError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f64,
    return_images: bool,
    web_search_options: WebSearchOptions<'a>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WebSearchOptions<'a> {
    search_context_size: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    // 欄位可能缺少或為 null，兩者都視為空清單
    #[serde(default)]
    citations: Option<Vec<String>>,
    #[serde(default)]
    images: Option<Vec<ImageRef>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AnswerMessage,
}

#[derive(Debug, Deserialize)]
struct AnswerMessage {
    content: String,
}

/// Asks the AI search API about a playground and turns the answer into an
/// [`EnrichmentRecord`]. No caching and no retries.
pub struct EnrichmentFetcher {
    config: EnrichConfig,
    client: Client,
}

impl EnrichmentFetcher {
    pub fn new(config: EnrichConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// Fetch a fresh record for `address`.
    ///
    /// Returns `Ok(None)` without any I/O when `cancel` is already triggered,
    /// and `Ok(None)` when it is triggered while the request is in flight.
    pub async fn fetch(
        &self,
        address: &str,
        name: Option<&str>,
        cancel: Option<&CancellationSignal>,
    ) -> Result<Option<EnrichmentRecord>> {
        if is_cancelled(cancel) {
            tracing::debug!("⏹️ Enrichment for '{}' cancelled before start", address);
            return Ok(None);
        }

        let api_key = self.config.api_key().ok_or_else(|| EnrichError::ConfigError {
            message: format!("{} is not set", crate::config::ENV_API_KEY),
        })?;

        let prompt = build_prompt(address, name);
        let body = ChatCompletionRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            return_images: true,
            web_search_options: WebSearchOptions {
                search_context_size: self.config.search_context_size.as_str(),
            },
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        tracing::debug!(
            "📡 Requesting enrichment for '{}' (model: {}, context: {})",
            address,
            self.config.model,
            self.config.search_context_size
        );

        let request = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body);

        // 請求進行中被取消時直接丟棄 future，連線隨之中止
        let response = match cancel {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.cancelled() => {
                    tracing::debug!("⏹️ Enrichment for '{}' cancelled during request", address);
                    return Ok(None);
                }
                response = request.send() => response?,
            },
            None => request.send().await?,
        };

        if is_cancelled(cancel) {
            return Ok(None);
        }

        let status = response.status();
        tracing::debug!("📡 Search API response status: {}", status);

        if !status.is_success() {
            return Err(EnrichError::UpstreamError {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
            });
        }

        let raw = response.text().await?;
        let envelope: ChatCompletionResponse =
            serde_json::from_str(&raw).map_err(|e| EnrichError::ParseError {
                message: format!("unexpected response envelope: {}", e),
            })?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| EnrichError::ParseError {
                message: "response contained no choices".to_string(),
            })?;

        let details = parse_details(&content)?;
        let record = EnrichmentRecord::from_details(
            details,
            envelope.citations.unwrap_or_default(),
            envelope.images.unwrap_or_default(),
        );

        if record.is_not_found() {
            tracing::info!("🔍 No confident match for '{}'", address);
        } else if record.is_partial() {
            tracing::warn!("⚠️ Partial enrichment answer for '{}'", address);
        } else {
            tracing::info!(
                "✅ Enriched '{}' ({} sources, {} images)",
                address,
                record.sources.len(),
                record.images.len()
            );
        }

        Ok(Some(record))
    }
}

#[async_trait]
impl Enricher for EnrichmentFetcher {
    async fn enrich(
        &self,
        address: &str,
        name: Option<&str>,
        cancel: Option<&CancellationSignal>,
    ) -> Result<Option<EnrichmentRecord>> {
        self.fetch(address, name, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn fetcher_for(server: &MockServer) -> EnrichmentFetcher {
        let config = EnrichConfig::default()
            .with_api_key("test-key")
            .with_endpoint(server.url("/chat/completions"));
        EnrichmentFetcher::new(config).unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "cmpl-1",
            "model": "sonar",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": content}}
            ],
            "citations": ["https://parks.example.com/sunset"],
            "images": [
                {"image_url": "https://img.example.com/slide.jpg", "origin_url": "https://parks.example.com/sunset"}
            ]
        })
    }

    #[tokio::test]
    async fn test_fenced_answer_is_parsed_and_augmented() {
        let server = MockServer::start();
        let content = "```json\n{\"name\":\"Sunset Park Playground\",\"description\":\"A shady playground.\",\"features\":[\"slide\",\"swing\"],\"parking\":\"Street parking\"}\n```";

        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_partial(
                    r#"{"model":"sonar","return_images":true,"web_search_options":{"search_context_size":"low"}}"#,
                );
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(completion(content));
        });

        let record = fetcher_for(&server)
            .fetch("500 Sunset Blvd", Some("Sunset Park"), None)
            .await
            .unwrap()
            .unwrap();

        api_mock.assert();
        assert_eq!(record.name.as_deref(), Some("Sunset Park Playground"));
        assert_eq!(record.description.as_deref(), Some("A shady playground."));
        assert_eq!(
            record.features,
            Some(vec!["slide".to_string(), "swing".to_string()])
        );
        assert_eq!(record.parking.as_deref(), Some("Street parking"));
        assert_eq!(record.sources, vec!["https://parks.example.com/sunset".to_string()]);
        assert_eq!(record.images.len(), 1);
        assert_eq!(
            record.images[0].url(),
            Some("https://img.example.com/slide.jpg")
        );
    }

    #[tokio::test]
    async fn test_bare_object_answer_yields_not_found_record() {
        let server = MockServer::start();
        let content =
            r#"Here you go: {"name":null,"description":null,"features":null,"parking":null}"#;

        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion(content));
        });

        let record = fetcher_for(&server)
            .fetch("1 Nowhere Rd", None, None)
            .await
            .unwrap()
            .unwrap();

        api_mock.assert();
        assert!(record.is_not_found());
        assert_eq!(record.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503);
        });

        let err = fetcher_for(&server)
            .fetch("1 Elm St", None, None)
            .await
            .unwrap_err();

        api_mock.assert();
        match &err {
            EnrichError::UpstreamError {
                status,
                status_text,
            } => {
                assert_eq!(*status, 503);
                assert_eq!(status_text, "Service Unavailable");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion("{}"));
        });

        let config = EnrichConfig::default().with_endpoint(server.url("/chat/completions"));
        let fetcher = EnrichmentFetcher::new(config).unwrap();
        let err = fetcher.fetch("1 Elm St", None, None).await.unwrap_err();

        assert!(matches!(err, EnrichError::ConfigError { .. }));
        api_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_returns_none_without_request() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion("{}"));
        });

        let signal = CancellationSignal::new();
        signal.cancel();

        let result = fetcher_for(&server)
            .fetch("1 Elm St", None, Some(&signal))
            .await
            .unwrap();

        assert!(result.is_none());
        api_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_wins_over_missing_key() {
        let signal = CancellationSignal::new();
        signal.cancel();

        let fetcher = EnrichmentFetcher::new(EnrichConfig::default()).unwrap();
        let result = fetcher.fetch("1 Elm St", None, Some(&signal)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_cancel_during_request_returns_none() {
        let server = MockServer::start();
        let _api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .delay(Duration::from_secs(5))
                .json_body(completion("{}"));
        });

        let signal = CancellationSignal::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let fetcher = fetcher_for(&server);
        let result = tokio::time::timeout(
            Duration::from_secs(3),
            fetcher.fetch("1 Elm St", None, Some(&signal)),
        )
        .await
        .expect("cancellation should end the request early")
        .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_non_json_envelope_is_parse_error() {
        let server = MockServer::start();
        let _api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).body("<html>gateway</html>");
        });

        let err = fetcher_for(&server)
            .fetch("1 Elm St", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichError::ParseError { .. }));
    }

    #[tokio::test]
    async fn test_empty_choices_is_parse_error() {
        let server = MockServer::start();
        let _api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .json_body(serde_json::json!({"choices": [], "citations": []}));
        });

        let err = fetcher_for(&server)
            .fetch("1 Elm St", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichError::ParseError { .. }));
    }

    #[tokio::test]
    async fn test_answer_without_json_is_parse_error() {
        let server = MockServer::start();
        let _api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .json_body(completion("Sorry, I could not find that playground."));
        });

        let err = fetcher_for(&server)
            .fetch("1 Elm St", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichError::ParseError { .. }));
    }

    #[tokio::test]
    async fn test_missing_citations_and_images_default_to_empty() {
        let server = MockServer::start();
        let _api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"content": "{\"name\":\"A\",\"description\":\"B\",\"features\":[],\"parking\":\"C\"}"}}]
            }));
        });

        let record = fetcher_for(&server)
            .fetch("1 Elm St", None, None)
            .await
            .unwrap()
            .unwrap();
        assert!(record.sources.is_empty());
        assert!(record.images.is_empty());
        assert_eq!(record.features, Some(vec![]));
    }

    #[tokio::test]
    async fn test_null_citations_and_images_default_to_empty() {
        let server = MockServer::start();
        let _api_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"content": "{\"name\":\"A\",\"description\":\"B\",\"features\":[],\"parking\":\"C\"}"}}],
                "citations": null,
                "images": null
            }));
        });

        let record = fetcher_for(&server)
            .fetch("1 Elm St", None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.name.as_deref(), Some("A"));
        assert!(record.sources.is_empty());
        assert!(record.images.is_empty());
    }

    #[tokio::test]
    async fn test_request_carries_temperature_and_user_prompt() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .json_body_partial(r#"{"temperature":0.17}"#)
                .body_contains(r#""role":"user""#)
                .body_contains("500 Sunset Blvd");
            then.status(200).json_body(completion("{}"));
        });

        fetcher_for(&server)
            .fetch("500 Sunset Blvd", None, None)
            .await
            .unwrap();

        api_mock.assert();
    }

    #[tokio::test]
    async fn test_temperature_override_reaches_the_request() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .json_body_partial(r#"{"temperature":0.5}"#);
            then.status(200).json_body(completion("{}"));
        });

        let mut config = EnrichConfig::default()
            .with_api_key("test-key")
            .with_endpoint(server.url("/chat/completions"));
        config.temperature = 0.5;
        EnrichmentFetcher::new(config)
            .unwrap()
            .fetch("1 Elm St", None, None)
            .await
            .unwrap();

        api_mock.assert();
    }
}
