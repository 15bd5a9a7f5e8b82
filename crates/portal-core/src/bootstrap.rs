//! Page-load handling of the login URL.
//!
//! Two links land on the login page with extra query parameters:
//!
//! - `?verified=true&bookingId=…` after a client confirms their email, which
//!   shows the verified banner and pre-fills the field;
//! - `?impersonate=true&bookingId=…` when an administrator opens the portal
//!   as a client, with the admin's token left in session storage.
//!
//! Impersonation wins when both are present. The bootstrap runs once per
//! form.

use std::borrow::Cow;
use std::sync::Arc;

use portal_storage::StorageBackend;
use tracing::{info, warn};

use crate::form::{LoginForm, SubmitOutcome};

/// Ephemeral storage key holding the administrator's impersonation token.
pub const IMPERSONATION_TOKEN_KEY: &str = "impersonationToken";

/// The query parameters the login page reacts to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginQuery {
    pub verified: Option<String>,
    pub booking_id: Option<String>,
    pub impersonate: Option<String>,
}

impl LoginQuery {
    /// Parse from a full URL, a path with a query, or a bare query string.
    ///
    /// Values are percent-decoded with `+` read as a space. The first
    /// occurrence of a parameter wins.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let query = input.split_once('?').map_or(input, |(_, q)| q);
        let query = query.split_once('#').map_or(query, |(q, _)| q);

        let mut parsed = Self::default();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let slot = match decode(name).as_ref() {
                "verified" => &mut parsed.verified,
                "bookingId" => &mut parsed.booking_id,
                "impersonate" => &mut parsed.impersonate,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(decode(value).into_owned());
            }
        }
        parsed
    }

    fn is_impersonation(&self) -> bool {
        self.impersonate.as_deref() == Some("true")
    }

    fn is_verified(&self) -> bool {
        self.verified.as_deref() == Some("true")
    }

    fn booking_id(&self) -> Option<&str> {
        self.booking_id.as_deref().filter(|id| !id.is_empty())
    }
}

fn decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['%', '+']) {
        return Cow::Borrowed(raw);
    }
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Owned(spaced),
    }
}

/// Which half of the impersonation context was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingImpersonation {
    Token,
    BookingId,
    Both,
}

/// What the bootstrap did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapAction {
    /// Ran the impersonated login without user interaction.
    Impersonated(SubmitOutcome),
    /// Impersonation was requested but could not start; the page shows nothing.
    ImpersonationSkipped { missing: MissingImpersonation },
    /// Showed the verified banner and pre-filled the field.
    VerifiedBanner { booking_id: String },
    /// The URL asked for nothing.
    Nothing,
    /// This form was already bootstrapped.
    AlreadyRan,
}

/// Runs the page-load bootstrap against a form.
pub struct Bootstrapper {
    ephemeral: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for Bootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrapper").finish_non_exhaustive()
    }
}

impl Bootstrapper {
    /// `ephemeral` is the session-scoped store holding the impersonation token.
    #[must_use]
    pub fn new(ephemeral: Arc<dyn StorageBackend>) -> Self {
        Self { ephemeral }
    }

    /// React to the page's query parameters.
    ///
    /// The impersonated login is awaited here; the verified banner's timer
    /// runs in the background.
    pub async fn run(&self, form: &LoginForm, query: &LoginQuery) -> BootstrapAction {
        if !form.begin_bootstrap() {
            return BootstrapAction::AlreadyRan;
        }

        if query.is_impersonation() {
            let token = self.impersonation_token().await;
            return match (token, query.booking_id()) {
                (Some(token), Some(booking_id)) => {
                    info!(booking_id, "completing impersonated login from URL");
                    BootstrapAction::Impersonated(
                        form.submit_impersonated(booking_id, &token).await,
                    )
                }
                (token, booking_id) => {
                    let missing = match (token.is_some(), booking_id.is_some()) {
                        (false, true) => MissingImpersonation::Token,
                        (true, false) => MissingImpersonation::BookingId,
                        _ => MissingImpersonation::Both,
                    };
                    warn!(?missing, "impersonation requested but context incomplete");
                    BootstrapAction::ImpersonationSkipped { missing }
                }
            };
        }

        if query.is_verified() {
            if let Some(booking_id) = query.booking_id() {
                info!(booking_id, "showing verified banner");
                form.show_verified_banner(booking_id);
                return BootstrapAction::VerifiedBanner {
                    booking_id: booking_id.to_owned(),
                };
            }
        }

        BootstrapAction::Nothing
    }

    async fn impersonation_token(&self) -> Option<String> {
        match self.ephemeral.get(IMPERSONATION_TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "could not read impersonation token");
                None
            }
        }
    }
}
