//! Endpoint layouts and request constants for the Keycloak account API

use serde::{Deserialize, Serialize};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("kc-account/", env!("CARGO_PKG_VERSION"));

/// Correlation id header attached to each request for server-side log lookups
pub const X_CORRELATION_ID: &str = "X-Correlation-Id";

/// Content type for JSON requests
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Auth realm used when none is configured
pub const DEFAULT_AUTH_REALM: &str = "master";

/// Path layout the account endpoints are served under.
///
/// Keycloak deployments expose the account extension under either the
/// versioned `api/v1` prefix or directly below the realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointLayout {
    /// `/realms/{realm}/api/v1/accounts[/{id}]`
    #[default]
    ApiV1,
    /// `/realms/{realm}/accounts[/{id}]`
    Legacy,
}

/// Whether the deployment accepts PUT on an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// PUT to the id-scoped endpoint
    Put,
    /// No update endpoint; updates produce a warning instead of a write
    #[default]
    Unsupported,
}

impl EndpointLayout {
    fn prefix(self) -> &'static str {
        match self {
            Self::ApiV1 => "/api/v1",
            Self::Legacy => "",
        }
    }

    /// Collection endpoint for accounts in a realm
    pub fn accounts_path(self, realm_id: &str) -> String {
        format!(
            "/realms/{}{}/accounts",
            urlencoding::encode(realm_id),
            self.prefix()
        )
    }

    /// Endpoint for a single account
    pub fn account_path(self, realm_id: &str, account_id: &str) -> String {
        format!(
            "{}/{}",
            self.accounts_path(realm_id),
            urlencoding::encode(account_id)
        )
    }
}

/// OpenID Connect token endpoint for a realm
pub fn token_path(realm: &str) -> String {
    format!(
        "/realms/{}/protocol/openid-connect/token",
        urlencoding::encode(realm)
    )
}
