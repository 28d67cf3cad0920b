//! Runs the hub's HTTP client against the reference server on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use microhub_api::{app_router, ApiConfig, AppState, StoreRegistry};
use microhub_core::bootstrap::{BootstrapFlow, BootstrapState};
use microhub_core::models::{Connection, Priority, StoreTarget};
use microhub_core::remote::{
    ErrorCode, HttpRemoteClient, RemoteEndpoint, RemoteError, Snapshot, StoreStatus,
};
use microhub_core::store::MemoryStore;
use microhub_core::sync::PullOutcome;
use microhub_core::SyncCoordinator;
use pretty_assertions::assert_eq;

async fn spawn_server(config: ApiConfig) -> String {
    let state = AppState::with_registry(Arc::new(config), StoreRegistry::in_memory());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app_router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

fn client() -> HttpRemoteClient {
    HttpRemoteClient::new(Duration::from_secs(5)).unwrap()
}

fn other_key(key: &str) -> &'static str {
    if key == "000000" {
        "111111"
    } else {
        "000000"
    }
}

#[tokio::test]
async fn new_store_setup_then_returning_login() {
    let url = spawn_server(ApiConfig::default()).await;
    let client = client();

    let mut flow = BootstrapFlow::new(&client, &url, "sheet-1").unwrap();
    assert_eq!(flow.check().await.unwrap(), &BootstrapState::NewStore);
    let key = flow.create_store("Alex").await.unwrap();
    assert_eq!(key.as_str().len(), 6);
    assert!(key.as_str().chars().all(|c| c.is_ascii_digit()));
    assert_eq!(flow.state(), &BootstrapState::Authenticated);

    let mut returning = BootstrapFlow::new(&client, &url, "sheet-1").unwrap();
    assert_eq!(
        returning.check().await.unwrap(),
        &BootstrapState::ReturningStore {
            user_name: Some("Alex".to_string())
        }
    );
    returning.login(key.as_str()).await.unwrap();

    // Keys stay valid across logins.
    let target = StoreTarget::new(&url, "sheet-1").unwrap();
    client.login(&target, key.as_str()).await.unwrap();
}

#[tokio::test]
async fn wrong_key_is_an_auth_failure() {
    let url = spawn_server(ApiConfig::default()).await;
    let client = client();
    let target = StoreTarget::new(&url, "sheet-2").unwrap();

    let key = client.setup_new_user(&target, "Alex").await.unwrap();
    let err = client
        .login(&target, other_key(key.as_str()))
        .await
        .unwrap_err();
    assert!(err.is_auth_failure());

    let unknown = StoreTarget::new(&url, "never-created").unwrap();
    let err = client.login(&unknown, key.as_str()).await.unwrap_err();
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn second_setup_reports_already_initialized() {
    let url = spawn_server(ApiConfig::default()).await;
    let client = client();
    let target = StoreTarget::new(&url, "sheet-3").unwrap();

    client.setup_new_user(&target, "Alex").await.unwrap();
    let err = client.setup_new_user(&target, "Sam").await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Api {
            code: Some(ErrorCode::AlreadyInitialized),
            ..
        }
    ));
    assert!(!err.is_auth_failure());
}

#[tokio::test]
async fn pushed_snapshot_reaches_second_device() {
    let url = spawn_server(ApiConfig::default()).await;

    let laptop = SyncCoordinator::open(MemoryStore::new(), client(), Duration::from_millis(50))
        .await
        .unwrap();
    let mut flow = laptop.bootstrap(&url, "shared").unwrap();
    flow.check().await.unwrap();
    let key = flow.create_store("Alex").await.unwrap();
    let authenticated = flow.into_authenticated().unwrap();
    laptop.connect(authenticated).await.unwrap();

    let task = laptop
        .add_task("Renew passport", "", Priority::High)
        .await
        .unwrap();
    let entry = laptop
        .add_journal_entry("Monday", "Started the #hub")
        .await
        .unwrap();
    laptop.shutdown().await.unwrap();
    assert_eq!(laptop.report().last_error, None);

    let phone = SyncCoordinator::open(MemoryStore::new(), client(), Duration::from_millis(50))
        .await
        .unwrap();
    let mut flow = phone.bootstrap(&url, "shared").unwrap();
    flow.check().await.unwrap();
    flow.login(key.as_str()).await.unwrap();
    let outcome = phone.connect(flow.into_authenticated().unwrap()).await.unwrap();
    assert!(matches!(outcome, PullOutcome::Applied(_)));

    let tasks = phone.tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, task.id);
    assert_eq!(tasks[0].title, "Renew passport");

    let journal = phone.journal().await;
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].id, entry.id);
    assert_eq!(phone.state().await.display_name(), "Alex");
}

#[tokio::test]
async fn wipe_with_and_without_name() {
    let url = spawn_server(ApiConfig::default()).await;
    let client = client();
    let target = StoreTarget::new(&url, "sheet-4").unwrap();

    let old_key = client.setup_new_user(&target, "Alex").await.unwrap();

    let mut flow = BootstrapFlow::new(&client, &url, "sheet-4").unwrap();
    flow.check().await.unwrap();
    flow.request_wipe().unwrap();
    let new_key = flow.confirm_wipe("Sam").await.unwrap();
    client.login(&target, new_key.as_str()).await.unwrap();
    if new_key.as_str() != old_key.as_str() {
        assert!(client.login(&target, old_key.as_str()).await.is_err());
    }
    assert_eq!(
        client.check_status(&target).await.unwrap(),
        StoreStatus::ReturningUser {
            user_name: Some("Sam".to_string())
        }
    );

    let minted = client.wipe_and_reset(&target, None).await.unwrap();
    assert!(minted.is_none());
    assert_eq!(client.check_status(&target).await.unwrap(), StoreStatus::NewUser);

    let err = client.wipe_and_reset(&target, None).await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Api {
            code: Some(ErrorCode::NotFound),
            ..
        }
    ));
}

#[tokio::test]
async fn rejected_keys_rate_limit_every_keyed_action() {
    let url = spawn_server(ApiConfig {
        login_rate_limit_per_window: 2,
        ..ApiConfig::default()
    })
    .await;
    let client = client();
    let target = StoreTarget::new(&url, "sheet-5").unwrap();

    let key = client.setup_new_user(&target, "Alex").await.unwrap();
    for _ in 0..5 {
        client.login(&target, key.as_str()).await.unwrap();
    }

    let guess = Connection::new(target.clone(), other_key(key.as_str())).unwrap();
    assert!(client.login(&target, guess.access_key()).await.unwrap_err().is_auth_failure());
    assert!(client.fetch_snapshot(&guess).await.unwrap_err().is_auth_failure());

    let owner = Connection::new(target.clone(), key.as_str()).unwrap();
    let err = client.fetch_snapshot(&owner).await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Api {
            code: Some(ErrorCode::RateLimited),
            ..
        }
    ));
    assert!(err.is_transient());

    let err = client
        .push_snapshot(&owner, &Snapshot::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Api {
            code: Some(ErrorCode::RateLimited),
            ..
        }
    ));
    assert!(client.login(&target, key.as_str()).await.is_err());
}

#[tokio::test]
async fn healthz_counts_stores() {
    let url = spawn_server(ApiConfig::default()).await;
    let target = StoreTarget::new(&url, "sheet-6").unwrap();
    client().setup_new_user(&target, "Alex").await.unwrap();

    let body: serde_json::Value = reqwest::get(format!("{url}/healthz"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["stores"], 1);
}
