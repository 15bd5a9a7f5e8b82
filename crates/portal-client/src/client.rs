//! `PortalClient` implementation.

use async_trait::async_trait;
use portal_core::api::{
    ApiEnvelope, ClientList, LoginRequest, LoginResponse, PortalApi, StatsPayload,
};
use portal_core::error::ApiError;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::{ClientConfig, PortalClient, USER_AGENT};

const LOGIN_PATH: &str = "/api/auth/login";
const ADMIN_LOGOUT_PATH: &str = "/api/admin/logout";
const ADMIN_CLIENTS_PATH: &str = "/api/admin/clients";
const ADMIN_STATS_PATH: &str = "/api/admin/dashboard/stats";
const ADMIN_HEALTH_PATH: &str = "/api/admin/system/health";

/// Body used when a successful response carries no content.
const EMPTY_SUCCESS: &str = r#"{"success":true}"#;

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl PortalClient {
    /// Create a client for `base_url`. Other settings come from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the base URL is not http(s), or
    /// `ClientError::Network` if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_config(ClientConfig {
            base_url: base_url.to_owned(),
            ..ClientConfig::default()
        })
    }

    /// Create a client from configuration, filling gaps from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the base URL is not http(s), or
    /// `ClientError::Network` if the HTTP client cannot be built.
    pub fn with_config(cfg: ClientConfig) -> Result<Self, ClientError> {
        Self::from_resolved(cfg.resolve(|key| std::env::var(key).ok()))
    }

    /// Create a client from configuration exactly as given. Empty fields
    /// take their defaults; the environment is not consulted.
    ///
    /// # Errors
    ///
    /// See [`PortalClient::with_config`].
    pub fn from_resolved(cfg: ClientConfig) -> Result<Self, ClientError> {
        let cfg = cfg.resolve(|_| None);
        if !(cfg.base_url.starts_with("http://") || cfg.base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                cfg.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            base_url: cfg.base_url,
            admin_token: Some(cfg.admin_token).filter(|t| !t.is_empty()),
            client,
        })
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // --- Private ---

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.admin_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send `req` and decode the body as `T`.
    ///
    /// The body is decoded whatever the status: the portal API reports
    /// refusals in the same shape it reports successes. Only when a non-2xx
    /// body does not decode is the status itself the error.
    async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        req: RequestBuilder,
    ) -> Result<T, ClientError> {
        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else {
                ClientError::Network(e)
            }
        })?;
        let status = resp.status();
        let text = resp.text().await.map_err(ClientError::Network)?;
        debug!(path, status = status.as_u16(), "portal API responded");

        if status.is_success() {
            let body: &str = if text.trim().is_empty() {
                EMPTY_SUCCESS
            } else {
                &text
            };
            return serde_json::from_str(body).map_err(ClientError::Json);
        }

        match serde_json::from_str::<T>(&text) {
            Ok(body) => Ok(body),
            Err(_) => {
                let message = error_message(status, &text);
                warn!(path, status = status.as_u16(), %message, "portal API error");
                Err(ClientError::Api {
                    status_code: status.as_u16(),
                    message,
                })
            }
        }
    }
}

fn error_message(status: StatusCode, text: &str) -> String {
    let body = serde_json::from_str::<ErrorBody>(text).ok();
    body.and_then(|b| match b.error {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => b.message,
    })
    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[async_trait]
impl PortalApi for PortalClient {
    async fn login(
        &self,
        booking_id: &str,
        impersonation_token: Option<&str>,
    ) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            booking_id: booking_id.to_owned(),
            impersonation_token: impersonation_token.map(str::to_owned),
        };
        let req = self.client.post(self.url(LOGIN_PATH)).json(&body);
        Ok(self.request(LOGIN_PATH, req).await?)
    }

    async fn admin_logout(&self) -> Result<ApiEnvelope<Value>, ApiError> {
        let req = self.admin(self.client.post(self.url(ADMIN_LOGOUT_PATH)));
        Ok(self.request(ADMIN_LOGOUT_PATH, req).await?)
    }

    async fn get_all_clients(&self) -> Result<ApiEnvelope<ClientList>, ApiError> {
        let req = self.admin(self.client.get(self.url(ADMIN_CLIENTS_PATH)));
        Ok(self.request(ADMIN_CLIENTS_PATH, req).await?)
    }

    async fn get_dashboard_stats(&self) -> Result<ApiEnvelope<StatsPayload>, ApiError> {
        let req = self.admin(self.client.get(self.url(ADMIN_STATS_PATH)));
        Ok(self.request(ADMIN_STATS_PATH, req).await?)
    }

    async fn get_system_health(&self) -> Result<ApiEnvelope<Value>, ApiError> {
        let req = self.admin(self.client.get(self.url(ADMIN_HEALTH_PATH)));
        Ok(self.request(ADMIN_HEALTH_PATH, req).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn error_message_reads_common_shapes() {
        let status = StatusCode::BAD_GATEWAY;
        assert_eq!(error_message(status, r#"{"error":"upstream down"}"#), "upstream down");
        assert_eq!(
            error_message(status, r#"{"error":{"message":"nested"}}"#),
            "nested"
        );
        assert_eq!(error_message(status, r#"{"message":"plain"}"#), "plain");
        assert_eq!(error_message(status, "<html>oops</html>"), "HTTP 502");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = PortalClient::from_resolved(ClientConfig {
            base_url: "ftp://portal".to_owned(),
            ..ClientConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn admin_token_is_optional() {
        let client = PortalClient::from_resolved(ClientConfig::default()).unwrap();
        assert!(client.admin_token.is_none());
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");

        let client = PortalClient::from_resolved(ClientConfig {
            admin_token: "s3cret".to_owned(),
            ..ClientConfig::default()
        })
        .unwrap();
        assert_eq!(client.admin_token.as_deref(), Some("s3cret"));
    }
}
