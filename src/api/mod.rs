//! Keycloak REST API client
//!
//! A thin client over the realm-scoped account endpoints: token handling,
//! request plumbing and the account CRUD calls.

pub mod accounts;
pub mod auth;
pub mod client;
pub mod constants;
pub mod models;

pub use client::KeycloakClient;
pub use constants::{EndpointLayout, UpdateMode};
pub use models::{Account, CredentialSet, TokenInfo};
