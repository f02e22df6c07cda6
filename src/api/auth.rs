use std::time::{Duration, SystemTime};

use serde::Deserialize;

use super::constants;
use super::models::{CredentialSet, TokenInfo};
use crate::error::{KeycloakError, KeycloakResult};

/// Longest token lifetime honoured; larger `expires_in` values are clamped
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Requests an access token from the realm's OpenID Connect token endpoint
pub async fn request_token(
    http_client: &reqwest::Client,
    server_url: &str,
    realm: &str,
    credentials: &CredentialSet,
) -> KeycloakResult<TokenInfo> {
    let token_url = format!("{}{}", server_url, constants::token_path(realm));
    log::info!("Authenticating against {}", token_url);

    let form: Vec<(&str, &str)> = match credentials {
        CredentialSet::Password {
            username,
            password,
            client_id,
            client_secret,
        } => {
            let mut form = vec![
                ("grant_type", "password"),
                ("client_id", client_id.as_str()),
                ("username", username.as_str()),
                ("password", password.as_str()),
            ];
            if let Some(secret) = client_secret {
                form.push(("client_secret", secret.as_str()));
            }
            form
        }
        CredentialSet::ClientCredentials {
            client_id,
            client_secret,
        } => vec![
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ],
    };

    let response = http_client.post(&token_url).form(&form).send().await?;
    log::debug!("Token request status: {}", response.status());

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(KeycloakError::Auth(format!(
            "token request failed with {}: {}",
            status, error_text
        )));
    }

    let token: TokenResponse = response.json().await?;
    // Keycloak always sends expires_in; fall back to one minute if a proxy strips it
    let expires_in = token.expires_in.unwrap_or(60);

    log::info!("Authenticated to realm {}", realm);
    Ok(TokenInfo {
        access_token: token.access_token,
        expires_at: expiry_after(SystemTime::now(), expires_in),
        refresh_token: token.refresh_token,
    })
}

fn expiry_after(now: SystemTime, expires_in: u64) -> SystemTime {
    let lifetime = Duration::from_secs(expires_in).min(MAX_TOKEN_LIFETIME);
    now.checked_add(lifetime).unwrap_or(now)
}
