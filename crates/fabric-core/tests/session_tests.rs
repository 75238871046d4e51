//! Upload session lifecycle against a gated archive reader

use async_trait::async_trait;
use fabric_core::{
    AccountId, ArchiveReader, DeployError, DeployStatus, DeploymentPipeline, FabricConfig, FileArchiveReader,
    FileSessionStore, ResourceInfo, SessionError, SessionManager, SessionStore,
};
use fabric_spec::ApplicationSpecification;
use fabric_test_utils::{archive_bytes, TestCollaborators};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Notify;

/// Holds every read until released
struct GatedReader {
    gate: Arc<Notify>,
}

#[async_trait]
impl ArchiveReader for GatedReader {
    async fn read_specification(&self, location: &Path) -> Result<ApplicationSpecification, DeployError> {
        self.gate.notified().await;
        FileArchiveReader::new().read_specification(location).await
    }
}

fn gated_manager(dir: &Path) -> (SessionManager, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    let env = TestCollaborators::new();
    let pipeline = DeploymentPipeline::new(
        Arc::new(GatedReader { gate: gate.clone() }),
        env.store.clone(),
        env.datasets.clone(),
        env.owner_admin.clone(),
    );
    let config = FabricConfig::new().with_archive_dir(dir);
    let records: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(dir, "session.json"));
    (SessionManager::new(config, pipeline, records), gate)
}

fn info(account: &AccountId) -> ResourceInfo {
    ResourceInfo::new(account.clone(), "app.jar", 0, 0)
}

#[tokio::test]
async fn chunk_while_verifying_is_rejected_without_discard() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, gate) = gated_manager(dir.path());
    let account = AccountId::new("acme");

    manager.register(&account, &info(&account), "deployer").await.unwrap();
    manager
        .append_chunk(&account, &archive_bytes(&ApplicationSpecification::new("app")))
        .await
        .unwrap();
    let handle = manager.finalize(&account).await.unwrap();

    assert_eq!(manager.status(&account).await.unwrap().status, DeployStatus::Verifying);

    let err = manager.append_chunk(&account, b"late").await.unwrap_err();
    assert!(matches!(err, SessionError::BadRequest(_)));
    assert!(manager.has_session(&account));

    assert!(matches!(
        manager.finalize(&account).await,
        Err(SessionError::BadRequest(_))
    ));

    gate.notify_one();
    handle.wait().await.unwrap();
    assert_eq!(manager.status(&account).await.unwrap().status, DeployStatus::Deployed);
}

#[tokio::test]
async fn register_while_verifying_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, gate) = gated_manager(dir.path());
    let account = AccountId::new("acme");

    manager.register(&account, &info(&account), "deployer").await.unwrap();
    let handle = manager.finalize(&account).await.unwrap();

    assert!(matches!(
        manager.register(&account, &info(&account), "deployer").await,
        Err(SessionError::Conflict(_))
    ));

    gate.notify_one();
    // Nothing was uploaded, so loading the archive fails
    assert!(handle.wait().await.is_err());
    assert!(manager.register(&account, &info(&account), "deployer").await.is_ok());
}

#[tokio::test]
async fn statuses_walk_the_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, gate) = gated_manager(dir.path());
    let account = AccountId::new("acme");

    assert_eq!(manager.status(&account).await.unwrap().code(), 0);

    manager.register(&account, &info(&account), "deployer").await.unwrap();
    assert_eq!(manager.status(&account).await.unwrap().status, DeployStatus::Registered);

    manager
        .append_chunk(&account, &archive_bytes(&ApplicationSpecification::new("app")))
        .await
        .unwrap();
    assert_eq!(manager.status(&account).await.unwrap().status, DeployStatus::Uploading);

    let handle = manager.finalize(&account).await.unwrap();
    assert_eq!(manager.status(&account).await.unwrap().code(), 3);

    gate.notify_one();
    handle.wait().await.unwrap();
    let done = manager.status(&account).await.unwrap();
    assert_eq!(done.code(), 5);
    assert_eq!(manager.live_sessions(), 0);
    assert_eq!(manager.pool_stats().succeeded, 1);
}

#[tokio::test]
async fn unwritable_archive_directory_releases_session() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the archive root should be
    let blocker = dir.path().join("root");
    std::fs::write(&blocker, b"").unwrap();
    let (manager, _gate) = gated_manager(&blocker);
    let account = AccountId::new("acme");

    let err = manager.register(&account, &info(&account), "deployer").await.unwrap_err();
    assert!(matches!(err, SessionError::Storage { .. }));
    assert!(!manager.has_session(&account));
}
