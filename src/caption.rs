//! Caption suggestion provider: one read-only endpoint returning a single
//! line of text, with a fixed local fallback when it is unreachable.

use std::time::Duration;

use serde::Deserialize;

use crate::catalog::FetchError;

/// Caption substituted whenever the provider cannot supply one.
pub const FALLBACK_CAPTION: &str = "When life gives you memes, share them! 😆";

/// Wire shape of the suggestion endpoint: a single-part joke payload.
#[derive(Deserialize)]
struct JokePayload {
    joke: String,
}

/// Read-only client for the caption suggestion endpoint.
#[derive(Clone)]
pub struct CaptionProvider {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl CaptionProvider {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Fetch one caption suggestion. Single attempt, no retry.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        let response = tokio::time::timeout(self.timeout, self.client.get(&self.endpoint).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let payload: JokePayload = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(payload.joke)
    }

    /// Fetch a suggestion, substituting [`FALLBACK_CAPTION`] on any failure.
    /// The failure is logged, never surfaced.
    pub async fn suggest(&self) -> String {
        match self.fetch().await {
            Ok(caption) => caption,
            Err(e) => {
                tracing::warn!(error = %e, "Caption provider failed, using fallback");
                FALLBACK_CAPTION.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{CaptionProvider, FALLBACK_CAPTION};

    fn provider_for(server: &MockServer) -> CaptionProvider {
        CaptionProvider::new(
            reqwest::Client::new(),
            format!("{}/joke", server.uri()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_suggest_returns_provider_caption() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "category": "Pun",
                "type": "single",
                "joke": "I would tell you a UDP joke, but you might not get it."
            })))
            .mount(&server)
            .await;

        let caption = provider_for(&server).suggest().await;
        assert_eq!(
            caption,
            "I would tell you a UDP joke, but you might not get it."
        );
    }

    #[tokio::test]
    async fn test_suggest_falls_back_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert_eq!(provider_for(&server).suggest().await, FALLBACK_CAPTION);
    }

    #[tokio::test]
    async fn test_suggest_falls_back_on_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert_eq!(provider_for(&server).suggest().await, FALLBACK_CAPTION);
    }
}
