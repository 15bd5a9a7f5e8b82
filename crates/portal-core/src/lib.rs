//! Core library for the client portal.
//!
//! Holds the booking-ID login flow (normalizer, validator, the login form
//! state machine and the page-load bootstrap), the admin dashboard and
//! settings controllers, and the landing-page copy. Everything outside the
//! process is reached through capabilities: [`api::PortalApi`] for the
//! backend, `portal_storage::StorageBackend` for browser-style storage, and
//! [`navigation::Navigator`] for redirects.

pub mod admin;
pub mod api;
pub mod booking;
pub mod bootstrap;
pub mod error;
pub mod form;
pub mod marketing;
pub mod navigation;
pub mod session;
pub mod settings;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
