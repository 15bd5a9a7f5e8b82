//! Admin dashboard: client list, summary cards, logout.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{ClientSummary, DashboardStats, PortalApi};
use crate::error::AdminError;
use crate::navigation::{ADMIN_LOGIN_PATH, Navigator};

/// Revenue card text when the backend reports none.
pub const NO_REVENUE: &str = "$0";

/// The three figures across the top of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_clients: u64,
    pub active_bookings: u64,
    pub total_revenue: String,
}

#[derive(Debug)]
struct DashboardState {
    clients: Vec<ClientSummary>,
    stats: Option<DashboardStats>,
    loading: bool,
    error: Option<AdminError>,
}

/// Controller behind the admin dashboard screen.
pub struct AdminDashboard {
    api: Arc<dyn PortalApi>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<DashboardState>,
}

impl std::fmt::Debug for AdminDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminDashboard")
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl AdminDashboard {
    /// A dashboard that has not loaded yet (`loading` starts true).
    #[must_use]
    pub fn new(api: Arc<dyn PortalApi>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            navigator,
            state: Mutex::new(DashboardState {
                clients: Vec::new(),
                stats: None,
                loading: true,
                error: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the client list and the stats concurrently.
    pub async fn load(&self) {
        tokio::join!(self.load_clients(), self.load_stats());
    }

    async fn load_clients(&self) {
        self.state().loading = true;
        let result = self.api.get_all_clients().await;
        let mut state = self.state();
        match result {
            Ok(envelope) => {
                if let Some(list) = envelope.into_data() {
                    state.clients = list.clients.unwrap_or_default();
                    debug!(count = state.clients.len(), "loaded clients");
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to load clients");
                state.error = Some(AdminError::LoadClients);
            }
        }
        state.loading = false;
    }

    async fn load_stats(&self) {
        match self.api.get_dashboard_stats().await {
            Ok(envelope) => {
                if let Some(payload) = envelope.into_data() {
                    self.state().stats = Some(payload.stats.unwrap_or_default());
                }
            }
            Err(e) => debug!(error = %e, "dashboard stats unavailable"),
        }
    }

    pub fn clients(&self) -> Vec<ClientSummary> {
        self.state().clients.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn error(&self) -> Option<AdminError> {
        self.state().error.clone()
    }

    /// Card figures, falling back to the client count and zeroes.
    pub fn summary(&self) -> DashboardSummary {
        let state = self.state();
        let stats = state.stats.as_ref();
        DashboardSummary {
            total_clients: stats
                .and_then(|s| s.total)
                .unwrap_or(state.clients.len() as u64),
            active_bookings: stats.and_then(|s| s.active).unwrap_or(0),
            total_revenue: stats
                .and_then(|s| s.revenue.as_ref())
                .map_or_else(|| NO_REVENUE.to_owned(), revenue_text),
        }
    }

    /// End the admin session and go to the admin login.
    ///
    /// # Errors
    ///
    /// [`AdminError::Logout`] if the request fails; the dashboard stays put
    /// and shows the error.
    pub async fn logout(&self) -> Result<(), AdminError> {
        match self.api.admin_logout().await {
            Ok(_) => {
                info!("admin logged out");
                self.navigator.navigate(ADMIN_LOGIN_PATH);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "admin logout failed");
                self.state().error = Some(AdminError::Logout);
                Err(AdminError::Logout)
            }
        }
    }
}

fn revenue_text(revenue: &Value) -> String {
    match revenue {
        Value::String(s) => s.clone(),
        Value::Null => NO_REVENUE.to_owned(),
        other => other.to_string(),
    }
}
