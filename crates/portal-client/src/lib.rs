//! HTTP client for the portal API.
//!
//! [`PortalClient`] implements [`portal_core::api::PortalApi`] over JSON and
//! HTTPS. It adds no retries: a failed login is surfaced to the user, who
//! resubmits. The request timeout is the only latency bound.
//!
//! # Example
//!
//! ```rust,no_run
//! use portal_client::PortalClient;
//! use portal_core::api::PortalApi;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PortalClient::new("https://portal.example.com")?;
//! let resp = client.login("WME1234X", None).await?;
//! if resp.success {
//!     // resp.client holds the client record
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use error::ClientError;

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("portal-client/", env!("CARGO_PKG_VERSION"));

/// Configuration for the portal client.
///
/// Empty fields fall back to environment variables, then to defaults.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// API base URL. Env: `PORTAL_API_URL`. Default: `http://127.0.0.1:8080`.
    pub base_url: String,
    /// Bearer token for admin endpoints. Env: `PORTAL_ADMIN_TOKEN`.
    pub admin_token: String,
    /// Request timeout. Env: `PORTAL_TIMEOUT_SECS`. Default: 10 seconds.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Fill empty fields from `lookup` (normally `std::env::var`).
    #[must_use]
    pub fn resolve(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = first_non_empty(&[
            &self.base_url,
            &lookup("PORTAL_API_URL").unwrap_or_default(),
            DEFAULT_BASE_URL,
        ])
        .trim_end_matches('/')
        .to_owned();

        let admin_token = first_non_empty(&[
            &self.admin_token,
            &lookup("PORTAL_ADMIN_TOKEN").unwrap_or_default(),
        ]);

        let timeout = if self.timeout.is_zero() {
            lookup("PORTAL_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map_or(DEFAULT_TIMEOUT, Duration::from_secs)
        } else {
            self.timeout
        };

        Self {
            base_url,
            admin_token,
            timeout,
        }
    }
}

/// Portal API client.
#[derive(Debug, Clone)]
pub struct PortalClient {
    base_url: String,
    admin_token: Option<String>,
    client: reqwest::Client,
}

fn first_non_empty(vals: &[&str]) -> String {
    vals.iter()
        .find(|v| !v.is_empty())
        .map(|v| (*v).to_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = ClientConfig::default().resolve(env(&[]));
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.admin_token, "");
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn env_fills_gaps_and_explicit_values_win() {
        let lookup = env(&[
            ("PORTAL_API_URL", "https://api.portal.example/"),
            ("PORTAL_ADMIN_TOKEN", "from-env"),
            ("PORTAL_TIMEOUT_SECS", "3"),
        ]);
        let cfg = ClientConfig::default().resolve(&lookup);
        assert_eq!(cfg.base_url, "https://api.portal.example");
        assert_eq!(cfg.admin_token, "from-env");
        assert_eq!(cfg.timeout, Duration::from_secs(3));

        let cfg = ClientConfig {
            admin_token: "explicit".to_owned(),
            timeout: Duration::from_secs(30),
            ..ClientConfig::default()
        }
        .resolve(&lookup);
        assert_eq!(cfg.admin_token, "explicit");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn bad_timeout_falls_back_to_default() {
        let cfg = ClientConfig::default().resolve(env(&[("PORTAL_TIMEOUT_SECS", "soon")]));
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
    }
}
