use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Deserializer, Serialize};

/// Account record as exchanged with the Keycloak account endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Server-assigned identifier, empty until created
    #[serde(rename = "id", default, skip_serializing_if = "String::is_empty")]
    pub account_id: String,
    /// Realm the account lives in; carried in the path, never in the body
    #[serde(skip)]
    pub realm_id: String,
    pub name: String,
    #[serde(rename = "attrs", default, deserialize_with = "null_as_default")]
    pub attributes: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub apps: Vec<String>,
    /// Creation timestamp as reported by the server, zero when unknown
    #[serde(rename = "createdOn", default, skip_serializing_if = "is_zero")]
    pub created_on: i64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Password or client-credentials grant material
#[derive(Debug, Clone)]
pub enum CredentialSet {
    Password {
        username: String,
        password: String,
        client_id: String,
        client_secret: Option<String>,
    },
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

/// Cached token for the configured auth realm
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub refresh_token: Option<String>,
}

impl TokenInfo {
    /// True once the token is within `skew` of its expiry
    pub fn is_expired(&self, skew: std::time::Duration) -> bool {
        SystemTime::now() + skew >= self.expires_at
    }
}
