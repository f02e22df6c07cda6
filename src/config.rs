use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::constants::{DEFAULT_AUTH_REALM, EndpointLayout, UpdateMode};
use crate::api::models::CredentialSet;
use crate::error::{KeycloakError, KeycloakResult};

/// Connection settings for a Keycloak server.
///
/// Values come from defaults, then the TOML config file, then `KEYCLOAK_*`
/// environment variables; later sources win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub url: String,
    pub base_path: String,
    /// Realm used to obtain tokens, not the realm accounts are managed in
    pub realm: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub initial_login: bool,
    /// Request timeout in seconds
    pub client_timeout: u64,
    pub tls_insecure_skip_verify: bool,
    pub additional_headers: HashMap<String, String>,
    pub endpoint_layout: EndpointLayout,
    pub update_mode: UpdateMode,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            base_path: String::new(),
            realm: DEFAULT_AUTH_REALM.to_string(),
            client_id: String::new(),
            client_secret: None,
            username: None,
            password: None,
            initial_login: true,
            client_timeout: 15,
            tls_insecure_skip_verify: false,
            additional_headers: HashMap::new(),
            endpoint_layout: EndpointLayout::default(),
            update_mode: UpdateMode::default(),
        }
    }
}

impl ProviderConfig {
    /// Default location of the config file
    pub fn default_path() -> KeycloakResult<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .ok_or_else(|| KeycloakError::Config("could not determine XDG config directory".to_string()))?
                .join("kc-account")
        } else {
            dirs::home_dir()
                .ok_or_else(|| KeycloakError::Config("could not determine home directory".to_string()))?
                .join(".kc-account")
        };
        Ok(config_dir.join("config.toml"))
    }

    /// Loads the config file (explicit path or default location), then applies
    /// `.env` and process environment overrides.
    pub fn load(path: Option<&Path>) -> KeycloakResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("No config file at {:?}, using defaults", default_path);
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> KeycloakResult<Self> {
        info!("Loading provider config from {:?}", path);
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overrides fields from `KEYCLOAK_*` variables found through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> KeycloakResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("KEYCLOAK_URL") {
            self.url = url;
        }
        if let Some(base_path) = lookup("KEYCLOAK_BASE_PATH") {
            self.base_path = base_path;
        }
        if let Some(realm) = lookup("KEYCLOAK_REALM") {
            self.realm = realm;
        }
        if let Some(client_id) = lookup("KEYCLOAK_CLIENT_ID") {
            self.client_id = client_id;
        }
        if let Some(secret) = lookup("KEYCLOAK_CLIENT_SECRET") {
            self.client_secret = Some(secret);
        }
        if let Some(username) = lookup("KEYCLOAK_USER") {
            self.username = Some(username);
        }
        if let Some(password) = lookup("KEYCLOAK_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(timeout) = lookup("KEYCLOAK_CLIENT_TIMEOUT") {
            self.client_timeout = timeout.parse().map_err(|_| {
                KeycloakError::Config(format!("KEYCLOAK_CLIENT_TIMEOUT is not a number: {timeout}"))
            })?;
        }
        if let Some(skip) = lookup("KEYCLOAK_TLS_INSECURE_SKIP_VERIFY") {
            self.tls_insecure_skip_verify = parse_bool(&skip).ok_or_else(|| {
                KeycloakError::Config(format!("KEYCLOAK_TLS_INSECURE_SKIP_VERIFY is not a boolean: {skip}"))
            })?;
        }
        Ok(())
    }

    /// Checks that enough is configured to obtain a token.
    pub fn validate(&self) -> KeycloakResult<()> {
        if self.url.is_empty() {
            return Err(KeycloakError::Config("url is required".to_string()));
        }
        if self.client_id.is_empty() {
            return Err(KeycloakError::Config("client_id is required".to_string()));
        }
        self.credentials().map(|_| ())
    }

    /// Grant to use: password when user credentials are set, otherwise client credentials.
    pub fn credentials(&self) -> KeycloakResult<CredentialSet> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(CredentialSet::Password {
                username: username.clone(),
                password: password.clone(),
                client_id: self.client_id.clone(),
                client_secret: self.client_secret.clone(),
            }),
            (Some(_), None) | (None, Some(_)) => Err(KeycloakError::Config(
                "username and password must be set together".to_string(),
            )),
            (None, None) => match &self.client_secret {
                Some(secret) => Ok(CredentialSet::ClientCredentials {
                    client_id: self.client_id.clone(),
                    client_secret: secret.clone(),
                }),
                None => Err(KeycloakError::Config(
                    "either username/password or client_secret is required".to_string(),
                )),
            },
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout)
    }

    /// Server URL with base path, without trailing slash
    pub fn server_url(&self) -> String {
        format!(
            "{}{}",
            self.url.trim_end_matches('/'),
            self.base_path.trim_end_matches('/')
        )
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
