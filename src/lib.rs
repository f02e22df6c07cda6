//! Keycloak account resource provider.
//!
//! - [`api`]: REST client for the realm-scoped account endpoints
//! - [`provider`]: resource schema, handlers and the plan/apply lifecycle
//! - [`state`] and [`manifest`]: files the `kc-account` binary works from

pub mod api;
pub mod config;
pub mod error;
pub mod manifest;
pub mod provider;
pub mod state;

pub use api::{Account, KeycloakClient};
pub use config::ProviderConfig;
pub use error::{KeycloakError, KeycloakResult};
