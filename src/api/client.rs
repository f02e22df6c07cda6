use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;

use super::auth;
use super::constants::{self, EndpointLayout, UpdateMode};
use super::models::{CredentialSet, TokenInfo};
use crate::config::ProviderConfig;
use crate::error::{KeycloakError, KeycloakResult};

/// Tokens this close to expiry are refreshed before use
const TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(5);

/// Keycloak REST client shared by every resource operation.
///
/// Holds one pooled `reqwest::Client` and the token for the configured auth
/// realm. Requests are made against non-admin paths below the server URL.
pub struct KeycloakClient {
    server_url: String,
    realm: String,
    credentials: CredentialSet,
    http_client: reqwest::Client,
    token: Mutex<Option<TokenInfo>>,
    endpoint_layout: EndpointLayout,
    update_mode: UpdateMode,
}

impl KeycloakClient {
    /// Builds the client and, when `initial_login` is set, fetches a token up front.
    pub async fn new(config: &ProviderConfig) -> KeycloakResult<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .user_agent(constants::USER_AGENT)
            .default_headers(additional_headers(config)?)
            .danger_accept_invalid_certs(config.tls_insecure_skip_verify)
            .build()?;

        let client = Self {
            server_url: config.server_url(),
            realm: config.realm.clone(),
            credentials: config.credentials()?,
            http_client,
            token: Mutex::new(None),
            endpoint_layout: config.endpoint_layout,
            update_mode: config.update_mode,
        };

        if config.initial_login {
            client.login().await?;
        }

        Ok(client)
    }

    /// Fetches a fresh token, replacing any cached one
    pub async fn login(&self) -> KeycloakResult<()> {
        let token =
            auth::request_token(&self.http_client, &self.server_url, &self.realm, &self.credentials)
                .await?;
        *self.token.lock().await = Some(token);
        Ok(())
    }

    async fn access_token(&self) -> KeycloakResult<String> {
        let mut guard = self.token.lock().await;
        match guard.as_ref() {
            Some(token) if !token.is_expired(TOKEN_EXPIRY_SKEW) => Ok(token.access_token.clone()),
            _ => {
                log::debug!("No valid token cached, logging in");
                let token = auth::request_token(
                    &self.http_client,
                    &self.server_url,
                    &self.realm,
                    &self.credentials,
                )
                .await?;
                let access_token = token.access_token.clone();
                *guard = Some(token);
                Ok(access_token)
            }
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn endpoint_layout(&self) -> EndpointLayout {
        self.endpoint_layout
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.update_mode
    }

    async fn request(&self, method: Method, path: &str) -> KeycloakResult<RequestBuilder> {
        let url = format!("{}{}", self.server_url, path);
        let correlation_id = uuid::Uuid::new_v4().to_string();
        log::debug!("{} {} ({})", method, url, correlation_id);

        let access_token = self.access_token().await?;
        Ok(self
            .http_client
            .request(method, &url)
            .bearer_auth(access_token)
            .header("Accept", constants::CONTENT_TYPE_JSON)
            .header(constants::X_CORRELATION_ID, correlation_id))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> KeycloakResult<T> {
        let response = self.request(Method::GET, path).await?.send().await?;
        let body = check_status(path, response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> KeycloakResult<T> {
        let response = self.request(Method::POST, path).await?.json(body).send().await?;
        let body = check_status(path, response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// PUT whose response body, if any, is discarded
    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> KeycloakResult<()> {
        let response = self.request(Method::PUT, path).await?.json(body).send().await?;
        check_status(path, response).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> KeycloakResult<()> {
        let response = self.request(Method::DELETE, path).await?.send().await?;
        check_status(path, response).await?;
        Ok(())
    }
}

fn additional_headers(config: &ProviderConfig) -> KeycloakResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.additional_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| KeycloakError::Config(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| KeycloakError::Config(format!("invalid value for header {name}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Maps 404 to `NotFound` and any other non-success status to `Api`
async fn check_status(path: &str, response: Response) -> KeycloakResult<Response> {
    let status = response.status();
    log::debug!("{} -> {}", path, status);

    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(KeycloakError::NotFound {
            path: path.to_string(),
        });
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(KeycloakError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additional_headers_are_validated() {
        let mut config = ProviderConfig::default();
        config
            .additional_headers
            .insert("X-Tenant".to_string(), "acme".to_string());
        let headers = additional_headers(&config).unwrap();
        assert_eq!(headers.get("x-tenant").unwrap(), "acme");

        config
            .additional_headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            additional_headers(&config),
            Err(KeycloakError::Config(_))
        ));
    }
}
