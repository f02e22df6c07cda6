mod common;

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use anyhow::Result;
use keycloak_account_provider::api::{Account, EndpointLayout, KeycloakClient, UpdateMode};
use keycloak_account_provider::KeycloakError;

use common::{CREATED_ON, EXPLODING_ID, FakeKeycloak};

fn acme(realm: &str) -> Account {
    Account {
        realm_id: realm.to_string(),
        name: "Acme".to_string(),
        attributes: HashMap::from([("tier".to_string(), "gold".to_string())]),
        apps: vec!["portal".to_string()],
        ..Default::default()
    }
}

#[tokio::test]
async fn create_then_read_returns_same_name_and_attributes() -> Result<()> {
    let fake = FakeKeycloak::start().await;
    let client =
        KeycloakClient::new(&fake.config(EndpointLayout::ApiV1, UpdateMode::Unsupported)).await?;

    let mut account = acme("test");
    client.new_account(&mut account).await?;

    assert!(!account.account_id.is_empty());
    assert_eq!(account.realm_id, "test");
    assert_eq!(account.created_on, CREATED_ON);

    let fetched = client.get_account("test", &account.account_id).await?;
    assert_eq!(fetched.name, "Acme");
    assert_eq!(fetched.attributes, account.attributes);
    assert_eq!(fetched.apps, vec!["portal"]);
    assert_eq!(fetched.realm_id, "test");
    assert_eq!(fetched, account);
    Ok(())
}

#[tokio::test]
async fn delete_then_read_is_not_found() -> Result<()> {
    let fake = FakeKeycloak::start().await;
    let client =
        KeycloakClient::new(&fake.config(EndpointLayout::ApiV1, UpdateMode::Unsupported)).await?;

    let mut account = acme("test");
    client.new_account(&mut account).await?;
    client.delete_account("test", &account.account_id).await?;

    let err = client
        .get_account("test", &account.account_id)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
    assert_eq!(fake.store.len(), 0);

    let err = client
        .delete_account("test", &account.account_id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn accounts_are_scoped_by_realm() -> Result<()> {
    let fake = FakeKeycloak::start().await;
    let client =
        KeycloakClient::new(&fake.config(EndpointLayout::ApiV1, UpdateMode::Unsupported)).await?;

    let mut account = acme("test");
    client.new_account(&mut account).await?;

    let err = client
        .get_account("other", &account.account_id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn unsupported_update_makes_no_request() -> Result<()> {
    let fake = FakeKeycloak::start().await;
    let client =
        KeycloakClient::new(&fake.config(EndpointLayout::ApiV1, UpdateMode::Unsupported)).await?;

    let mut account = acme("test");
    client.new_account(&mut account).await?;

    let mut changed = account.clone();
    changed.attributes.insert("tier".to_string(), "silver".to_string());
    let err = client.update_account(&changed).await.unwrap_err();

    assert!(matches!(err, KeycloakError::UpdateUnsupported { .. }));
    assert_eq!(fake.store.puts.load(Ordering::SeqCst), 0);
    let fetched = client.get_account("test", &account.account_id).await?;
    assert_eq!(fetched.attributes["tier"], "gold");
    Ok(())
}

#[tokio::test]
async fn put_update_writes_record() -> Result<()> {
    let fake = FakeKeycloak::start().await;
    let client = KeycloakClient::new(&fake.config(EndpointLayout::ApiV1, UpdateMode::Put)).await?;

    let mut account = acme("test");
    client.new_account(&mut account).await?;

    account.attributes.insert("tier".to_string(), "silver".to_string());
    account.apps.push("billing".to_string());
    client.update_account(&account).await?;

    assert_eq!(fake.store.puts.load(Ordering::SeqCst), 1);
    let fetched = client.get_account("test", &account.account_id).await?;
    assert_eq!(fetched.attributes["tier"], "silver");
    assert_eq!(fetched.apps, vec!["portal", "billing"]);
    assert_eq!(fetched.created_on, CREATED_ON);
    Ok(())
}

#[tokio::test]
async fn update_without_id_is_rejected() -> Result<()> {
    let fake = FakeKeycloak::start().await;
    let client = KeycloakClient::new(&fake.config(EndpointLayout::ApiV1, UpdateMode::Put)).await?;

    let err = client.update_account(&acme("test")).await.unwrap_err();
    assert!(matches!(err, KeycloakError::InvalidArgument(_)));
    assert_eq!(fake.store.puts.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn legacy_layout_round_trips() -> Result<()> {
    let fake = FakeKeycloak::start().await;
    let client = KeycloakClient::new(&fake.config(EndpointLayout::Legacy, UpdateMode::Put)).await?;

    let mut account = acme("test");
    client.new_account(&mut account).await?;
    let fetched = client.get_account("test", &account.account_id).await?;
    assert_eq!(fetched.name, "Acme");

    client.delete_account("test", &account.account_id).await?;
    assert_eq!(fake.store.len(), 0);
    Ok(())
}

#[tokio::test]
async fn server_errors_surface_as_api_errors() -> Result<()> {
    let fake = FakeKeycloak::start().await;
    let client =
        KeycloakClient::new(&fake.config(EndpointLayout::ApiV1, UpdateMode::Unsupported)).await?;

    let err = client.get_account("test", EXPLODING_ID).await.unwrap_err();
    match err {
        KeycloakError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected API error, got {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn bad_credentials_fail_initial_login() {
    let fake = FakeKeycloak::start().await;
    let mut config = fake.config(EndpointLayout::ApiV1, UpdateMode::Unsupported);
    config.client_secret = Some("wrong".to_string());

    let err = KeycloakClient::new(&config).await.err().expect("login should fail");
    assert!(matches!(err, KeycloakError::Auth(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn password_grant_is_used_when_user_is_configured() -> Result<()> {
    let fake = FakeKeycloak::start().await;
    let mut config = fake.config(EndpointLayout::ApiV1, UpdateMode::Unsupported);
    config.client_secret = None;
    config.username = Some("admin".to_string());
    config.password = Some("admin".to_string());

    let client = KeycloakClient::new(&config).await?;
    let mut account = acme("test");
    client.new_account(&mut account).await?;
    assert!(!account.account_id.is_empty());
    Ok(())
}

#[tokio::test]
async fn deferred_login_fetches_one_token() -> Result<()> {
    let fake = FakeKeycloak::start().await;
    let mut config = fake.config(EndpointLayout::ApiV1, UpdateMode::Unsupported);
    config.initial_login = false;

    let client = KeycloakClient::new(&config).await?;
    assert_eq!(fake.store.token_requests.load(Ordering::SeqCst), 0);

    let mut account = acme("test");
    client.new_account(&mut account).await?;
    client.get_account("test", &account.account_id).await?;
    assert_eq!(fake.store.token_requests.load(Ordering::SeqCst), 1);
    Ok(())
}
