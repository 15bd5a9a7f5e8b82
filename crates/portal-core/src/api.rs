//! The portal API surface and its wire types.
//!
//! The remote service is an external collaborator: this module fixes the
//! calls the flow makes and the JSON shapes it reads, and leaves transport to
//! implementors (`portal-client` ships the HTTP one).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Body of a login request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub booking_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impersonation_token: Option<String>,
}

/// Answer to a login request.
///
/// `client` is the opaque client record; the flow stores it verbatim and
/// never looks inside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginResponse {
    /// A successful answer carrying `client`.
    #[must_use]
    pub fn accepted(client: Value) -> Self {
        Self {
            success: true,
            client: Some(client),
            error: None,
        }
    }

    /// An unsuccessful answer with an optional reason.
    #[must_use]
    pub fn refused(reason: Option<&str>) -> Self {
        Self {
            success: false,
            client: None,
            error: reason.map(str::to_owned),
        }
    }
}

/// The verdict carried by a [`LoginResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoginResult {
    /// Logged in; `client` is stored verbatim (`None` stores as `null`).
    Success { client: Option<Value> },
    /// Refused, with the API's reason if it gave one.
    Failure { message: Option<String> },
}

impl From<LoginResponse> for LoginResult {
    fn from(resp: LoginResponse) -> Self {
        if resp.success {
            Self::Success {
                client: resp.client,
            }
        } else {
            Self::Failure {
                message: resp.error.filter(|m| !m.is_empty()),
            }
        }
    }
}

/// The `{ success, data, error }` wrapper around admin responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// The payload, if the call succeeded and carried one.
    pub fn into_data(self) -> Option<T> {
        if self.success { self.data } else { None }
    }
}

/// One row of the admin client list.
///
/// A field that is missing or `null` reads as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSummary {
    #[serde(deserialize_with = "null_as_empty")]
    pub booking_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub artist: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub status: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Payload of `get_all_clients`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientList {
    #[serde(default)]
    pub clients: Option<Vec<ClientSummary>>,
}

/// Aggregate figures for the dashboard cards. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub active: Option<u64>,
    /// Preformatted (`"$12,000"`) or numeric, depending on the backend.
    #[serde(default)]
    pub revenue: Option<Value>,
}

/// Payload of `get_dashboard_stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsPayload {
    #[serde(default)]
    pub stats: Option<DashboardStats>,
}

/// Calls the portal makes against its backend.
///
/// Implementations own their timeout policy; callers add none.
#[async_trait::async_trait]
pub trait PortalApi: Send + Sync {
    /// Log in with a booking ID, or on a client's behalf when `token` is set.
    ///
    /// An `Ok` carries the API's verdict, including refusals. `Err` means no
    /// verdict was obtained.
    async fn login(&self, booking_id: &str, token: Option<&str>)
    -> Result<LoginResponse, ApiError>;

    /// End the current admin session.
    async fn admin_logout(&self) -> Result<ApiEnvelope<Value>, ApiError>;

    /// List every client.
    async fn get_all_clients(&self) -> Result<ApiEnvelope<ClientList>, ApiError>;

    /// Fetch aggregate dashboard figures.
    async fn get_dashboard_stats(&self) -> Result<ApiEnvelope<StatsPayload>, ApiError>;

    /// Fetch the backend's health report.
    async fn get_system_health(&self) -> Result<ApiEnvelope<Value>, ApiError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn login_request_omits_missing_token() {
        let req = LoginRequest {
            booking_id: "WME1234X".to_owned(),
            impersonation_token: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({ "bookingId": "WME1234X" })
        );
    }

    #[test]
    fn login_response_tolerates_sparse_bodies() {
        let resp: LoginResponse = serde_json::from_str("{}").unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error, None);

        let resp: LoginResponse =
            serde_json::from_str(r#"{"success":true,"client":{"name":"Ada","tier":3}}"#).unwrap();
        assert!(resp.success);
        assert_eq!(resp.client.unwrap()["tier"], 3);
    }

    #[test]
    fn response_maps_to_tagged_result() {
        let ok = LoginResult::from(LoginResponse::accepted(serde_json::json!({ "id": 1 })));
        assert_eq!(
            ok,
            LoginResult::Success {
                client: Some(serde_json::json!({ "id": 1 }))
            }
        );
        assert_eq!(
            LoginResult::from(LoginResponse::refused(Some(""))),
            LoginResult::Failure { message: None }
        );
        assert_eq!(
            LoginResult::from(LoginResponse {
                success: true,
                client: None,
                error: Some("ignored".to_owned()),
            }),
            LoginResult::Success { client: None }
        );
    }

    #[test]
    fn client_rows_use_camel_case() {
        let list: ApiEnvelope<ClientList> = serde_json::from_str(
            r#"{"success":true,"data":{"clients":[{"bookingId":"ABC12345","name":"Ada","artist":"The Band","status":"confirmed"}]}}"#,
        )
        .unwrap();
        let clients = list.into_data().unwrap().clients.unwrap();
        assert_eq!(clients[0].booking_id, "ABC12345");
        assert_eq!(clients[0].artist, "The Band");
    }

    #[test]
    fn null_row_fields_read_as_empty() {
        let list: ApiEnvelope<ClientList> = serde_json::from_str(
            r#"{"success":true,"data":{"clients":[{"bookingId":"ABC12345","name":"Ada","artist":null,"status":"confirmed"},{"bookingId":null}]}}"#,
        )
        .unwrap();
        let clients = list.into_data().unwrap().clients.unwrap();
        assert_eq!(clients[0].artist, "");
        assert_eq!(clients[0].status, "confirmed");
        assert_eq!(clients[1], ClientSummary::default());
    }

    #[test]
    fn failed_envelope_yields_no_data() {
        let env: ApiEnvelope<StatsPayload> = serde_json::from_str(
            r#"{"success":false,"data":{"stats":{"total":3}},"error":"nope"}"#,
        )
        .unwrap();
        assert_eq!(env.into_data(), None);
    }
}
