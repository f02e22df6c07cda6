//! `keycloak_account` resource.

use async_trait::async_trait;
use serde_json::Value;

use super::Resource;
use super::diagnostics::Diagnostics;
use super::resource_data::ResourceData;
use super::schema::{Schema, SchemaMap, ValueType};
use crate::api::{Account, KeycloakClient};
use crate::error::KeycloakError;

pub const TYPE_NAME: &str = "keycloak_account";

pub const REALM_ID: &str = "realm_id";
pub const NAME: &str = "name";
pub const ACCOUNT_ID: &str = "account_id";
pub const ATTRS: &str = "attrs";
pub const APPS: &str = "apps";
pub const CREATED_ON: &str = "created_on";

pub struct AccountResource;

fn account_schema() -> SchemaMap {
    SchemaMap::from([
        (REALM_ID.to_string(), Schema::required(ValueType::String).force_new()),
        (NAME.to_string(), Schema::required(ValueType::String).force_new()),
        (ACCOUNT_ID.to_string(), Schema::computed(ValueType::String)),
        (ATTRS.to_string(), Schema::optional(ValueType::Map)),
        (APPS.to_string(), Schema::optional(ValueType::Set)),
        (CREATED_ON.to_string(), Schema::optional(ValueType::Int).with_computed()),
    ])
}

pub fn map_from_data_to_account(data: &ResourceData) -> Account {
    Account {
        account_id: data.get_str(ACCOUNT_ID),
        realm_id: data.get_str(REALM_ID),
        name: data.get_str(NAME),
        attributes: data.get_string_map(ATTRS),
        apps: data.get_string_set(APPS),
        created_on: data.get_int(CREATED_ON),
    }
}

pub fn map_from_account_to_data(data: &mut ResourceData, account: &Account) {
    data.set_id(account.account_id.clone());
    data.set(ACCOUNT_ID, account.account_id.clone());
    data.set(NAME, account.name.clone());

    let attrs: serde_json::Map<String, Value> = account
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    data.set(ATTRS, attrs);

    let mut apps = account.apps.clone();
    apps.sort();
    apps.dedup();
    data.set(APPS, apps);

    if account.created_on != 0 {
        data.set(CREATED_ON, account.created_on);
    }
}

/// A 404 means the account was deleted outside of the provider: drop it from
/// state instead of failing.
fn handle_not_found_error(err: KeycloakError, data: &mut ResourceData) -> Diagnostics {
    if err.is_not_found() {
        log::warn!(
            "Removing {} {} from state because it no longer exists in Keycloak",
            TYPE_NAME,
            data.id()
        );
        data.clear_id();
        return Diagnostics::new();
    }
    Diagnostics::from_err(err)
}

#[async_trait]
impl Resource for AccountResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> SchemaMap {
        account_schema()
    }

    async fn create(&self, client: &KeycloakClient, data: &mut ResourceData) -> Diagnostics {
        let mut account = map_from_data_to_account(data);
        if let Err(err) = client.new_account(&mut account).await {
            return Diagnostics::from_err(err);
        }
        if account.account_id.is_empty() {
            return Diagnostics::error(
                format!("{TYPE_NAME} created without an id"),
                format!(
                    "Keycloak accepted account \"{}\" in realm {} but returned no id, so it cannot be tracked",
                    account.name, account.realm_id
                ),
            );
        }
        map_from_account_to_data(data, &account);

        // The account exists remotely from here on: keep the id on every failure
        match client
            .get_account(&account.realm_id, &account.account_id)
            .await
        {
            Ok(remote) => {
                map_from_account_to_data(data, &remote);
                Diagnostics::new()
            }
            Err(err) if err.is_not_found() => Diagnostics::error(
                format!("{TYPE_NAME} not found after create"),
                format!(
                    "account {} was created in realm {} but could not be read back",
                    account.account_id, account.realm_id
                ),
            ),
            Err(err) => Diagnostics::from_err(err),
        }
    }

    async fn read(&self, client: &KeycloakClient, data: &mut ResourceData) -> Diagnostics {
        let realm_id = data.get_str(REALM_ID);
        let account_id = data.get_str(ACCOUNT_ID);

        match client.get_account(&realm_id, &account_id).await {
            Ok(account) => {
                map_from_account_to_data(data, &account);
                Diagnostics::new()
            }
            Err(err) => handle_not_found_error(err, data),
        }
    }

    async fn update(
        &self,
        client: &KeycloakClient,
        prior: &ResourceData,
        data: &mut ResourceData,
    ) -> Diagnostics {
        let mut account = map_from_data_to_account(data);
        account.account_id = prior.get_str(ACCOUNT_ID);
        account.realm_id = prior.get_str(REALM_ID);

        match client.update_account(&account).await {
            Ok(()) => {
                map_from_account_to_data(data, &account);
                Diagnostics::new()
            }
            Err(KeycloakError::UpdateUnsupported { .. }) => {
                log::warn!("Skipping update of {} {}: not supported", TYPE_NAME, prior.id());
                *data = prior.clone();
                Diagnostics::warning(
                    format!("{TYPE_NAME} cannot be updated in place"),
                    "The Keycloak account API does not support updates; the account was left unchanged. \
                     Change realm_id or name to recreate it.",
                )
            }
            Err(err) => Diagnostics::from_err(err),
        }
    }

    async fn delete(&self, client: &KeycloakClient, data: &mut ResourceData) -> Diagnostics {
        let realm_id = data.get_str(REALM_ID);
        let account_id = data.get_str(ACCOUNT_ID);

        match client.delete_account(&realm_id, &account_id).await {
            Ok(()) => {
                data.clear_id();
                Diagnostics::new()
            }
            Err(err) => Diagnostics::from_err(err),
        }
    }

    fn import(&self, import_id: &str) -> Result<ResourceData, Diagnostics> {
        let (realm_id, account_id) = match import_id.split_once('/') {
            Some((realm, id)) if !realm.is_empty() && !id.is_empty() && !id.contains('/') => {
                (realm, id)
            }
            _ => {
                return Err(Diagnostics::error(
                    "invalid import id",
                    format!("expected {{realm_id}}/{{account_id}}, got \"{import_id}\""),
                ));
            }
        };

        let mut data = ResourceData::default();
        data.set(REALM_ID, realm_id);
        data.set(ACCOUNT_ID, account_id);
        data.set_id(account_id);
        Ok(data)
    }
}
