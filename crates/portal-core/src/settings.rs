//! Admin settings: sign-out, locally kept site settings, health check.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use portal_storage::{StorageBackend, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::PortalApi;
use crate::error::AdminError;
use crate::navigation::{ADMIN_LOGIN_PATH, Navigator};

/// Durable storage key for [`SiteSettings`].
pub const SITE_SETTINGS_KEY: &str = "wme-site-settings";

/// How long the save button reads "Saving..." after a save.
pub const SAVE_FEEDBACK: Duration = Duration::from_millis(700);

pub const SAVE_LABEL: &str = "Save Changes";
pub const SAVING_LABEL: &str = "Saving...";

const HEALTH_FETCH_FAILED: &str = "Failed to fetch";
const HEALTH_CHECK_FAILED: &str = "Failed to check system health";

/// Site-wide settings edited on the admin settings screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub site_title: String,
    pub support_email: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_title: "WME Client Portal".to_owned(),
            support_email: "support@example.com".to_owned(),
        }
    }
}

#[derive(Debug, Default)]
struct SettingsState {
    saving: bool,
    error: Option<AdminError>,
}

/// Controller behind the admin settings screen.
pub struct AdminSettings {
    api: Arc<dyn PortalApi>,
    navigator: Arc<dyn Navigator>,
    durable: Arc<dyn StorageBackend>,
    state: Mutex<SettingsState>,
}

impl std::fmt::Debug for AdminSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSettings")
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl AdminSettings {
    #[must_use]
    pub fn new(
        api: Arc<dyn PortalApi>,
        navigator: Arc<dyn Navigator>,
        durable: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            api,
            navigator,
            durable,
            state: Mutex::new(SettingsState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SettingsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sign out. Errors from the API are ignored; the admin always lands on
    /// the admin login.
    pub async fn sign_out(&self) {
        if let Err(e) = self.api.admin_logout().await {
            debug!(error = %e, "ignoring admin logout failure");
        }
        info!("admin signed out");
        self.navigator.navigate(ADMIN_LOGIN_PATH);
    }

    /// The saved settings, or the defaults if none were saved or the stored
    /// value is unreadable.
    pub async fn site_settings(&self) -> SiteSettings {
        match self.durable.get(SITE_SETTINGS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "stored site settings unreadable; using defaults");
                SiteSettings::default()
            }),
            Ok(None) => SiteSettings::default(),
            Err(e) => {
                warn!(error = %e, "could not read site settings; using defaults");
                SiteSettings::default()
            }
        }
    }

    /// Save the settings locally. Returns `false` without saving if a save
    /// is already showing its feedback.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StorageError`] if the write fails.
    pub async fn save(&self, site: &SiteSettings) -> Result<bool, StorageError> {
        {
            let mut state = self.state();
            if state.saving {
                return Ok(false);
            }
            state.saving = true;
        }

        let body = serde_json::to_string(site).map_err(|e| StorageError::Write {
            key: SITE_SETTINGS_KEY.to_owned(),
            reason: e.to_string(),
        });
        let written = match body {
            Ok(body) => self.durable.put(SITE_SETTINGS_KEY, &body).await,
            Err(e) => Err(e),
        };
        if written.is_ok() {
            info!(site_title = %site.site_title, "site settings saved");
            tokio::time::sleep(SAVE_FEEDBACK).await;
        }

        self.state().saving = false;
        written.map(|()| true)
    }

    pub fn is_saving(&self) -> bool {
        self.state().saving
    }

    pub fn save_label(&self) -> &'static str {
        if self.is_saving() { SAVING_LABEL } else { SAVE_LABEL }
    }

    /// The error shown at the top of the screen, if any.
    pub fn error(&self) -> Option<AdminError> {
        self.state().error.clone()
    }

    /// Ask the backend for its health report.
    ///
    /// Returns the report's `data`, or the whole envelope when there is none.
    ///
    /// # Errors
    ///
    /// [`AdminError::Health`] with the message to display; it is also kept
    /// as the screen's error.
    pub async fn check_system_health(&self) -> Result<Value, AdminError> {
        self.state().error = None;
        let result = match self.api.get_system_health().await {
            Ok(envelope) if envelope.success => Ok(match envelope.data {
                Some(data) => data,
                None => serde_json::to_value(&envelope).unwrap_or(Value::Null),
            }),
            Ok(envelope) => Err(AdminError::Health(
                envelope
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| HEALTH_FETCH_FAILED.to_owned()),
            )),
            Err(e) => {
                warn!(error = %e, "system health request failed");
                let message = e.to_string();
                Err(AdminError::Health(if message.is_empty() {
                    HEALTH_CHECK_FAILED.to_owned()
                } else {
                    message
                }))
            }
        };
        if let Err(err) = &result {
            self.state().error = Some(err.clone());
        }
        result
    }
}
