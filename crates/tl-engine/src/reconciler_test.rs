use super::*;
use crate::migration::MigrationResource;
use crate::planner::plan;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tl_auth::{Credentials, RetryPolicy, RetryingTransport, SecretToken, StaticCredentialService};
use tl_core::{Config, Direction, ProviderConfig, ResourceConfig, ResourceTimeouts};
use tl_db::test_utils::{Call, MemoryConnector};

fn write_migrations(dir: &Path, versions: &[i64]) {
    std::fs::create_dir_all(dir).unwrap();
    for v in versions {
        std::fs::write(
            dir.join(format!("{v:05}_step_{v}.sql")),
            "-- +goose Up\nSELECT 1;\n-- +goose Down\nSELECT 1;\n",
        )
        .unwrap();
    }
}

fn config(names: &[&str], target: Option<i64>) -> Config {
    Config {
        provider: ProviderConfig::default(),
        resources: names
            .iter()
            .map(|name| ResourceConfig {
                name: ResourceName::new(*name),
                endpoint: "localhost:2136".to_string(),
                database: format!("/local/{name}"),
                tls_enabled: Some(false),
                migration_table: None,
                migrations_dir: "migrations".to_string(),
                target_version: target,
                timeouts: ResourceTimeouts::default(),
            })
            .collect(),
    }
}

fn migration_resource(connector: &MemoryConnector) -> MigrationResource {
    let service = StaticCredentialService::new(
        "localhost:443",
        Credentials::IamToken(SecretToken::new("t1.abc.def")),
    );
    MigrationResource::new(
        Arc::new(connector.clone()),
        Arc::new(RetryingTransport::new(service, RetryPolicy::default())),
    )
}

#[tokio::test]
async fn test_apply_creates_and_persists() {
    let root = TempDir::new().unwrap();
    write_migrations(&root.path().join("migrations"), &[1, 2]);
    let connector = MemoryConnector::new();
    let kind = migration_resource(&connector);
    let mut state = StateStore::open(&StateStore::default_path(root.path())).unwrap();

    let changes = plan(&config(&["app"], None), root.path(), &state).unwrap();
    let outcomes = Reconciler::new(&kind, &mut state).apply(&changes).await.unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_ok());
    assert_eq!(outcomes[0].version, Some(2));

    let reopened = StateStore::open(state.path()).unwrap();
    assert_eq!(reopened.get("app").unwrap().applied_version, 2);
}

#[tokio::test]
async fn test_second_apply_is_noop() {
    let root = TempDir::new().unwrap();
    write_migrations(&root.path().join("migrations"), &[1, 2]);
    let connector = MemoryConnector::new();
    let kind = migration_resource(&connector);
    let mut state = StateStore::open(&StateStore::default_path(root.path())).unwrap();
    let cfg = config(&["app"], None);

    let changes = plan(&cfg, root.path(), &state).unwrap();
    Reconciler::new(&kind, &mut state).apply(&changes).await.unwrap();
    let serial = state.serial();
    connector.clear_calls();

    let changes = plan(&cfg, root.path(), &state).unwrap();
    assert!(changes.iter().all(PlannedChange::is_noop));
    Reconciler::new(&kind, &mut state).apply(&changes).await.unwrap();
    assert!(connector.calls().is_empty());
    assert_eq!(state.serial(), serial);
}

#[tokio::test]
async fn test_failing_resource_does_not_stop_others() {
    let root = TempDir::new().unwrap();
    write_migrations(&root.path().join("migrations"), &[1, 2]);
    let connector = MemoryConnector::new();
    connector.fail_on(2, Direction::Up);
    let kind = migration_resource(&connector);
    let mut state = StateStore::open(&StateStore::default_path(root.path())).unwrap();

    let changes = plan(&config(&["a", "b"], Some(1)), root.path(), &state).unwrap();
    let outcomes = Reconciler::new(&kind, &mut state).apply(&changes).await.unwrap();
    assert!(outcomes.iter().all(Outcome::is_ok));

    let changes = plan(&config(&["a", "b"], None), root.path(), &state).unwrap();
    let outcomes = Reconciler::new(&kind, &mut state).apply(&changes).await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.error.is_some()));
    assert_eq!(
        connector.count(|c| matches!(c, Call::Apply { version: 2, .. })),
        2,
        "b is attempted after a fails"
    );
    // Update failures still record the plan.
    assert_eq!(state.get("a").unwrap().applied_version, 2);
    assert_eq!(state.get("b").unwrap().target_version, None);
}

#[tokio::test]
async fn test_refresh_records_drift() {
    let root = TempDir::new().unwrap();
    write_migrations(&root.path().join("migrations"), &[1, 2]);
    let connector = MemoryConnector::new();
    let kind = migration_resource(&connector);
    let mut state = StateStore::open(&StateStore::default_path(root.path())).unwrap();

    let changes = plan(&config(&["app"], None), root.path(), &state).unwrap();
    Reconciler::new(&kind, &mut state).apply(&changes).await.unwrap();

    connector.set_applied("goose_db_version", &[1]);
    let outcomes = Reconciler::new(&kind, &mut state).refresh().await.unwrap();
    assert_eq!(outcomes[0].version, Some(1));
    assert_eq!(state.get("app").unwrap().applied_version, 1);
}

#[tokio::test]
async fn test_destroy_named_and_all() {
    let root = TempDir::new().unwrap();
    write_migrations(&root.path().join("migrations"), &[1]);
    let connector = MemoryConnector::new();
    let kind = migration_resource(&connector);
    let mut state = StateStore::open(&StateStore::default_path(root.path())).unwrap();

    let changes = plan(&config(&["a", "b", "c"], None), root.path(), &state).unwrap();
    Reconciler::new(&kind, &mut state).apply(&changes).await.unwrap();

    let names = vec!["b".to_string()];
    let outcomes = Reconciler::new(&kind, &mut state)
        .destroy(Some(names.as_slice()))
        .await
        .unwrap();
    assert_eq!(outcomes[0].version, None);
    assert!(state.get("b").is_none());
    assert!(state.get("a").is_some());

    let missing = vec!["nope".to_string()];
    assert!(matches!(
        Reconciler::new(&kind, &mut state).destroy(Some(missing.as_slice())).await,
        Err(EngineError::UnknownResource { .. })
    ));

    Reconciler::new(&kind, &mut state).destroy(None).await.unwrap();
    assert_eq!(state.resources().count(), 0);
}

#[tokio::test]
async fn test_removed_from_config_is_destroyed() {
    let root = TempDir::new().unwrap();
    write_migrations(&root.path().join("migrations"), &[1, 2]);
    let connector = MemoryConnector::new();
    let kind = migration_resource(&connector);
    let mut state = StateStore::open(&StateStore::default_path(root.path())).unwrap();

    let changes = plan(&config(&["app"], None), root.path(), &state).unwrap();
    Reconciler::new(&kind, &mut state).apply(&changes).await.unwrap();

    let changes = plan(&config(&[], None), root.path(), &state).unwrap();
    assert_eq!(changes[0].action, Action::Delete);
    Reconciler::new(&kind, &mut state).apply(&changes).await.unwrap();
    assert!(state.get("app").is_none());
    assert_eq!(connector.applied_version("goose_db_version"), 0);
}
