//! Error types for `portal-core`.
//!
//! Login and admin errors render as the exact message shown to the user, so
//! a front end can print `err.to_string()` without a lookup table.

/// Which login path produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKind {
    /// The client typed a booking ID into the form.
    Standard,
    /// An administrator opened the portal on behalf of a client.
    Impersonated,
}

impl LoginKind {
    /// Message used when the API answers without `success` and gives no reason.
    #[must_use]
    pub fn rejection_fallback(self) -> &'static str {
        match self {
            Self::Standard => "Login failed",
            Self::Impersonated => "Impersonation login failed.",
        }
    }

    /// Message used when the request never produced an API answer.
    #[must_use]
    pub fn transport_message(self) -> &'static str {
        match self {
            Self::Standard => "An unexpected error occurred",
            Self::Impersonated => "An error occurred during impersonation login.",
        }
    }
}

fn transport_message(kind: &LoginKind) -> &'static str {
    kind.transport_message()
}

/// Why a login attempt did not reach the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// Submitted with nothing in the field.
    #[error("Please enter your Booking ID")]
    EmptyInput,

    /// Submitted something that is not 8 alphanumeric characters.
    #[error("Booking ID must be 8 alphanumeric characters")]
    InvalidShape,

    /// The API answered and refused the login.
    #[error("{0}")]
    RemoteRejection(String),

    /// The request failed before the API could answer.
    #[error("{}", transport_message(.kind))]
    TransportFailure { kind: LoginKind },
}

impl LoginError {
    /// Build a rejection from the API's optional reason.
    ///
    /// Impersonated logins always use the fixed impersonation message; the
    /// standard path prefers the server's reason when one is given.
    #[must_use]
    pub fn rejected(kind: LoginKind, reason: Option<String>) -> Self {
        let message = match (kind, reason) {
            (LoginKind::Standard, Some(reason)) if !reason.is_empty() => reason,
            _ => kind.rejection_fallback().to_owned(),
        };
        Self::RemoteRejection(message)
    }

    /// Whether the error was caught locally, before any request was sent.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::InvalidShape)
    }
}

/// Failures talking to the portal API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The connection could not be made or was dropped.
    #[error("portal API transport error: {reason}")]
    Transport { reason: String },

    /// The request exceeded the client's timeout.
    #[error("portal API request timed out")]
    Timeout,

    /// The API answered with an error status and no usable body.
    #[error("portal API error {status_code}: {message}")]
    Status { status_code: u16, message: String },

    /// The API answered with a body that could not be decoded.
    #[error("portal API returned an undecodable body: {reason}")]
    Decode { reason: String },
}

/// Errors surfaced on the admin screens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    /// The client list could not be fetched.
    #[error("Failed to load clients")]
    LoadClients,

    /// The admin session could not be ended.
    #[error("Logout failed")]
    Logout,

    /// The health check failed; carries the message to display.
    #[error("{0}")]
    Health(String),
}
