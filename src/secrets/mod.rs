//! Vault secret reads for CI pipelines.
//!
//! Unrelated to the diff core: a convenience collaborator so validation
//! pipelines can pull tokens and certificates from the same tool. Reads
//! KV version 2 secrets only.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::SecretError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default KV mount point.
const DEFAULT_MOUNT: &str = "kv";

/// Client for reading secrets from HashiCorp Vault.
#[derive(Debug, Clone)]
pub struct VaultClient {
    /// HTTP client.
    client: Client,
    /// Vault base address.
    address: String,
    /// Vault token.
    token: String,
    /// KV v2 mount point.
    mount: String,
}

/// KV v2 read response envelope.
#[derive(Debug, Deserialize)]
struct KvReadResponse {
    data: KvReadData,
}

/// Inner KV v2 payload.
#[derive(Debug, Deserialize)]
struct KvReadData {
    data: BTreeMap<String, Value>,
}

impl VaultClient {
    /// Creates a new Vault client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(address: &str, token: &str) -> Result<Self, SecretError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SecretError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            address: address.trim_end_matches('/').to_string(),
            token: token.to_string(),
            mount: String::from(DEFAULT_MOUNT),
        })
    }

    /// Sets the KV v2 mount point.
    #[must_use]
    pub fn with_mount(mut self, mount: &str) -> Self {
        self.mount = mount.to_string();
        self
    }

    /// Reads a secret from Vault.
    ///
    /// With `key` returns that field of the secret; without it, the whole
    /// secret as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret does not exist, the key is missing,
    /// authentication fails, or Vault cannot be reached.
    pub async fn read_secret(&self, path: &str, key: Option<&str>) -> Result<Value, SecretError> {
        let url = format!("{}/v1/{}/data/{path}", self.address, self.mount);
        debug!("Reading secret from {}/{path}", self.mount);

        let response = self
            .client
            .get(&url)
            .header("X-Vault-Token", &self.token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SecretError::network(format!("Request failed: {e}")))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(SecretError::NotFound {
                path: path.to_string(),
            });
        }

        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(SecretError::AuthenticationFailed {
                message: String::from("Invalid Vault token"),
            });
        }

        if !status.is_success() {
            return Err(SecretError::invalid_response(format!(
                "Unexpected status: {status}"
            )));
        }

        let envelope: KvReadResponse = response
            .json()
            .await
            .map_err(|e| SecretError::invalid_response(format!("Failed to parse response: {e}")))?;

        match key {
            Some(field) => envelope.data.data.get(field).cloned().ok_or_else(|| {
                SecretError::MissingKey {
                    path: path.to_string(),
                    key: field.to_string(),
                }
            }),
            None => Ok(Value::Object(
                envelope.data.data.into_iter().collect(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn kv_body() -> Value {
        json!({
            "data": {
                "data": {"token": "abc123", "url": "https://ci.local"},
                "metadata": {"version": 2}
            }
        })
    }

    #[tokio::test]
    async fn test_read_whole_secret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/kv/data/ci/ghar"))
            .and(header("X-Vault-Token", "root"))
            .respond_with(ResponseTemplate::new(200).set_body_json(kv_body()))
            .mount(&server)
            .await;

        let client = VaultClient::new(&server.uri(), "root").unwrap();
        let secret = client.read_secret("ci/ghar", None).await.unwrap();

        assert_eq!(secret["token"], json!("abc123"));
        assert_eq!(secret["url"], json!("https://ci.local"));
    }

    #[tokio::test]
    async fn test_read_single_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/kv/data/ci/ghar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(kv_body()))
            .mount(&server)
            .await;

        let client = VaultClient::new(&server.uri(), "root").unwrap();
        let value = client.read_secret("ci/ghar", Some("token")).await.unwrap();

        assert_eq!(value, json!("abc123"));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/kv/data/ci/ghar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(kv_body()))
            .mount(&server)
            .await;

        let client = VaultClient::new(&server.uri(), "root").unwrap();
        let err = client
            .read_secret("ci/ghar", Some("nope"))
            .await
            .unwrap_err();

        assert!(matches!(err, SecretError::MissingKey { key, .. } if key == "nope"));
    }

    #[tokio::test]
    async fn test_custom_mount_and_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/data/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = VaultClient::new(&server.uri(), "root")
            .unwrap()
            .with_mount("secret");
        let err = client.read_secret("missing", None).await.unwrap_err();

        assert!(matches!(err, SecretError::NotFound { path } if path == "missing"));
    }
}
