//! Account operations against the realm-scoped account endpoints

use super::client::KeycloakClient;
use super::constants::UpdateMode;
use super::models::Account;
use crate::error::{KeycloakError, KeycloakResult};

pub const ACCOUNT_RESOURCE: &str = "account";

impl KeycloakClient {
    /// Creates an account and overwrites `account` with the server's copy.
    ///
    /// The realm id is kept: it is not part of the response body.
    pub async fn new_account(&self, account: &mut Account) -> KeycloakResult<()> {
        let path = self.endpoint_layout().accounts_path(&account.realm_id);
        let created: Account = self.post(&path, &*account).await?;

        log::info!(
            "Created account {} in realm {}",
            created.account_id,
            account.realm_id
        );
        *account = Account {
            realm_id: std::mem::take(&mut account.realm_id),
            ..created
        };
        Ok(())
    }

    pub async fn get_account(&self, realm_id: &str, account_id: &str) -> KeycloakResult<Account> {
        let path = self.endpoint_layout().account_path(realm_id, account_id);
        let mut account: Account = self.get(&path).await?;
        account.realm_id = realm_id.to_string();
        Ok(account)
    }

    /// Writes the full record with PUT.
    ///
    /// Returns `UpdateUnsupported` without touching the server when the
    /// configured profile has no update endpoint.
    pub async fn update_account(&self, account: &Account) -> KeycloakResult<()> {
        if self.update_mode() == UpdateMode::Unsupported {
            return Err(KeycloakError::UpdateUnsupported {
                resource_type: ACCOUNT_RESOURCE.to_string(),
            });
        }
        if account.account_id.is_empty() {
            return Err(KeycloakError::InvalidArgument(
                "account id is required for update".to_string(),
            ));
        }

        let path = self
            .endpoint_layout()
            .account_path(&account.realm_id, &account.account_id);
        self.put(&path, account).await?;
        log::info!(
            "Updated account {} in realm {}",
            account.account_id,
            account.realm_id
        );
        Ok(())
    }

    pub async fn delete_account(&self, realm_id: &str, account_id: &str) -> KeycloakResult<()> {
        let path = self.endpoint_layout().account_path(realm_id, account_id);
        self.delete(&path).await?;
        log::info!("Deleted account {} in realm {}", account_id, realm_id);
        Ok(())
    }
}
