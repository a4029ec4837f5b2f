//! HTTP client for the configuration render service.
//!
//! Resilience policy lives here, not in the orchestrator: transient network
//! failures are retried with a bounded linear backoff, everything else
//! surfaces immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::diff::{ConfigTree, EnvironmentId, HostId, PlanId};
use crate::error::RenderError;

use super::source::RenderSource;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for transient failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// HTTP client for the render service.
#[derive(Debug, Clone)]
pub struct RenderClient {
    /// HTTP client.
    client: Client,
    /// Base URL of the render service.
    endpoint: String,
    /// Optional bearer token.
    auth_token: Option<String>,
}

/// Request body for render and plan-compile calls.
#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    host: &'a HostId,
    environment: &'a EnvironmentId,
}

/// Response body for plan-compile calls.
#[derive(Debug, Deserialize)]
struct PlanResponse {
    plan_ids: Vec<PlanId>,
}

/// Error body returned by the render service.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl RenderClient {
    /// Creates a new render-service client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(endpoint: &str, auth_token: Option<&str>) -> Result<Self, RenderError> {
        Self::with_timeout(endpoint, auth_token, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(
        endpoint: &str,
        auth_token: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RenderError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth_token: auth_token.map(String::from),
        })
    }

    /// Posts a request, retrying transient failures.
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, RenderError>
    where
        B: Serialize + Sync,
        T: for<'de> Deserialize<'de>,
    {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                debug!("Retry attempt {attempt} of {MAX_RETRIES}");
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)))
                    .await;
            }

            match self.post_once(path, body).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if e.is_retryable() {
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RenderError::network(String::from("Max retries exceeded"))))
    }

    /// Executes a single request.
    async fn post_once<B, T>(&self, path: &str, body: &B) -> Result<T, RenderError>
    where
        B: Serialize + Sync,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{path}", self.endpoint);
        trace!("POST {url}");

        let mut request = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);

        if let Some(token) = &self.auth_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RenderError::network(format!("Request failed: {e}")))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            let message = Self::error_message(response).await;
            return Err(RenderError::EnvironmentNotFound {
                environment: message,
            });
        }

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let message = Self::error_message(response).await;
            return Err(RenderError::RenderFailed { message });
        }

        if !status.is_success() {
            let message = Self::error_message(response).await;
            return Err(RenderError::api_error(status.as_u16(), message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RenderError::invalid_response(format!("Failed to parse response: {e}")))
    }

    /// Extracts the error message from a non-success response body.
    async fn error_message(response: reqwest::Response) -> String {
        let body = response.text().await.unwrap_or_default();
        serde_json::from_str::<ErrorResponse>(&body).map_or(body, |parsed| parsed.error)
    }
}

#[async_trait]
impl RenderSource for RenderClient {
    async fn fetch_config_tree(
        &self,
        host: &HostId,
        environment: &EnvironmentId,
    ) -> Result<ConfigTree, RenderError> {
        debug!("Rendering configuration for {host} in {environment}");
        self.post("/render/config", &RenderRequest { host, environment })
            .await
    }

    async fn fetch_plan_ids(
        &self,
        host: &HostId,
        environment: &EnvironmentId,
    ) -> Result<Vec<PlanId>, RenderError> {
        debug!("Compiling execution plan for {host} in {environment}");
        let response: PlanResponse = self
            .post("/render/plan", &RenderRequest { host, environment })
            .await?;
        Ok(response.plan_ids)
    }

    async fn refresh_sources(&self) -> Result<(), RenderError> {
        debug!("Refreshing configuration sources");
        let _: serde_json::Value = self.post("/sources/refresh", &serde_json::json!({})).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_config_tree() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render/config"))
            .and(body_json(json!({"host": "web01.local", "environment": "base"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"common": {"key": "value"}})),
            )
            .mount(&server)
            .await;

        let client = RenderClient::new(&server.uri(), None).unwrap();
        let tree = client
            .fetch_config_tree(&HostId::from("web01.local"), &EnvironmentId::from("base"))
            .await
            .unwrap();

        assert_eq!(
            tree,
            ConfigTree::from(json!({"common": {"key": "value"}}))
        );
    }

    #[tokio::test]
    async fn test_auth_header_attached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render/plan"))
            .and(header("authorization", "Bearer sekrit"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"plan_ids": ["s1", "s2"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = RenderClient::new(&server.uri(), Some("sekrit")).unwrap();
        let ids = client
            .fetch_plan_ids(&HostId::from("web01.local"), &EnvironmentId::from("base"))
            .await
            .unwrap();

        assert_eq!(ids, vec![PlanId::from("s1"), PlanId::from("s2")]);
    }

    #[tokio::test]
    async fn test_missing_environment_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render/config"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "dev.nope"})),
            )
            .mount(&server)
            .await;

        let client = RenderClient::new(&server.uri(), None).unwrap();
        let err = client
            .fetch_config_tree(&HostId::from("web01.local"), &EnvironmentId::from("dev.nope"))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::EnvironmentNotFound { environment } if environment == "dev.nope"));
    }

    #[tokio::test]
    async fn test_render_failure_maps_to_render_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render/config"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"error": "template error in common/defaults"})),
            )
            .mount(&server)
            .await;

        let client = RenderClient::new(&server.uri(), None).unwrap();
        let err = client
            .fetch_config_tree(&HostId::from("web01.local"), &EnvironmentId::from("base"))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::RenderFailed { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render/config"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = RenderClient::new(&server.uri(), None).unwrap();
        let err = client
            .fetch_config_tree(&HostId::from("web01.local"), &EnvironmentId::from("base"))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::ApiRequest { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_refresh_sources() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sources/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"refreshed": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = RenderClient::new(&server.uri(), None).unwrap();
        client.refresh_sources().await.unwrap();
    }
}
