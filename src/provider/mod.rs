//! Resource provider over the Keycloak client
//!
//! Resources implement [`Resource`]; [`Provider`] owns the configured client
//! and looks resources up by type name. The lifecycle module diffs desired
//! configuration against state and calls the resource handlers.

pub mod diagnostics;
pub mod lifecycle;
pub mod resource_account;
pub mod resource_data;
pub mod schema;

use async_trait::async_trait;

use crate::api::KeycloakClient;
use crate::config::ProviderConfig;
use crate::error::KeycloakResult;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use lifecycle::{Action, Plan};
pub use resource_account::AccountResource;
pub use resource_data::ResourceData;
pub use schema::{Schema, SchemaMap, ValueType};

/// CRUD handlers for one resource type.
///
/// Handlers report failures as diagnostics rather than errors; a read that
/// finds the remote object gone clears the data's id instead.
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> SchemaMap;

    async fn create(&self, client: &KeycloakClient, data: &mut ResourceData) -> Diagnostics;

    async fn read(&self, client: &KeycloakClient, data: &mut ResourceData) -> Diagnostics;

    /// `prior` is the current state, `data` the planned state.
    async fn update(
        &self,
        client: &KeycloakClient,
        prior: &ResourceData,
        data: &mut ResourceData,
    ) -> Diagnostics;

    async fn delete(&self, client: &KeycloakClient, data: &mut ResourceData) -> Diagnostics;

    /// Builds the minimal data needed to read an existing object by import id.
    fn import(&self, import_id: &str) -> Result<ResourceData, Diagnostics>;
}

/// Every resource type this provider serves
pub fn builtin_resources() -> Vec<Box<dyn Resource>> {
    vec![Box::new(AccountResource)]
}

/// Configured provider: a shared client plus the resources it serves.
pub struct Provider {
    client: KeycloakClient,
    resources: Vec<Box<dyn Resource>>,
}

impl Provider {
    pub async fn configure(config: &ProviderConfig) -> KeycloakResult<Self> {
        let client = KeycloakClient::new(config).await?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: KeycloakClient) -> Self {
        Self {
            client,
            resources: builtin_resources(),
        }
    }

    pub fn client(&self) -> &KeycloakClient {
        &self.client
    }

    pub fn resource(&self, type_name: &str) -> Option<&dyn Resource> {
        self.resources
            .iter()
            .find(|r| r.type_name() == type_name)
            .map(|r| r.as_ref())
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.iter().map(|r| r.type_name())
    }
}
