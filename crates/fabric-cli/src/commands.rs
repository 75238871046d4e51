//! Subcommand implementations

use anyhow::{Context, bail};
use fabric_core::{
    AccountId, ArchiveReader, AuthToken, DeploymentService, DeploymentStatus, FabricConfig, FileArchiveReader,
    ResourceIdentifier, ResourceInfo,
};
use fabric_spec::{ApplicationId, KerberosPrincipalId, ProgramType};
use fabric_verify::{
    ApplicationDeployable, ApplicationVerificationStage, MemoryDatasetFramework, MemoryOwnerAdmin, MemoryStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

/// Principal the `verify` command checks as
const LOCAL_REQUESTER: &str = "local";

pub(crate) struct DeployRequest {
    pub(crate) account: String,
    pub(crate) archive: PathBuf,
    pub(crate) owner: Option<String>,
    pub(crate) token: String,
}

pub(crate) struct DeployOutcome {
    pub(crate) resource: ResourceIdentifier,
    pub(crate) status: DeploymentStatus,
    pub(crate) programs: Vec<(ProgramType, String)>,
}

/// Configuration from an optional file, then command-line overrides
pub(crate) fn load_config(path: Option<&PathBuf>, archive_dir: Option<&PathBuf>) -> anyhow::Result<FabricConfig> {
    let mut config = match path {
        Some(path) => FabricConfig::from_toml_file(path)?,
        None => FabricConfig::default(),
    };
    if let Some(dir) = archive_dir {
        config = config.with_archive_dir(dir);
    }
    config.validate()?;
    Ok(config)
}

/// Upload the archive in `chunk_size` pieces, deploy, and wait for the outcome
pub(crate) async fn deploy(config: FabricConfig, request: DeployRequest) -> anyhow::Result<DeployOutcome> {
    let bytes = tokio::fs::read(&request.archive)
        .await
        .with_context(|| format!("reading {}", request.archive.display()))?;
    let Some(filename) = request.archive.file_name().and_then(|name| name.to_str()) else {
        bail!("archive path {} has no file name", request.archive.display());
    };
    let modtime = tokio::fs::metadata(&request.archive)
        .await
        .ok()
        .and_then(|meta| meta.modified().ok())
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX));

    let mut info = ResourceInfo::new(AccountId::new(request.account), filename, bytes.len() as u64, modtime);
    if let Some(owner) = request.owner {
        info = info.with_owner(KerberosPrincipalId::new(owner));
    }

    let chunk_size = config.chunk_size;
    let service = DeploymentService::local(config);
    let token = AuthToken::new(request.token);

    let resource = service.init(&token, info).await?;
    for chunk in bytes.chunks(chunk_size) {
        service.chunk(&token, &resource, Some(chunk)).await?;
    }
    tracing::info!(resource = %resource.resource_id, size = bytes.len(), "upload complete");

    let outcome = service.deploy(&token, &resource).await?.wait().await;
    let programs = match outcome {
        Ok(deployed) => deployed.programs,
        Err(e) => {
            tracing::error!(error = %e, "deployment failed");
            Vec::new()
        }
    };
    let status = service.dstatus(&token, &resource).await?;
    service.sessions().shutdown().await;

    Ok(DeployOutcome {
        resource,
        status,
        programs,
    })
}

/// Live or persisted status of an account
pub(crate) async fn status(config: FabricConfig, account: &str, token: &str) -> anyhow::Result<DeploymentStatus> {
    let service = DeploymentService::local(config);
    let resource = ResourceIdentifier::new(AccountId::new(account), "");
    let status = service.dstatus(&AuthToken::new(token), &resource).await?;
    service.sessions().shutdown().await;
    Ok(status)
}

/// Run the verification stage alone over a descriptor file
pub(crate) async fn verify(
    spec_path: &Path,
    namespace: &str,
    owner: Option<String>,
) -> anyhow::Result<ApplicationDeployable> {
    let spec = FileArchiveReader::new().read_specification(spec_path).await?;
    let app_id = ApplicationId::new(namespace, &spec.name, &spec.version);
    let deployable = ApplicationDeployable::new(app_id, spec, spec_path, LOCAL_REQUESTER)
        .with_owner(owner.map(KerberosPrincipalId::new));

    let stage = ApplicationVerificationStage::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryDatasetFramework::new()),
        Arc::new(MemoryOwnerAdmin::new()),
    );
    Ok(stage.process(deployable).await?)
}

pub(crate) fn print_outcome(outcome: &DeployOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        let programs: Vec<_> = outcome
            .programs
            .iter()
            .map(|(kind, name)| serde_json::json!({ "type": kind, "name": name }))
            .collect();
        let body = serde_json::json!({
            "resource": outcome.resource,
            "code": outcome.status.code(),
            "status": outcome.status.status,
            "message": outcome.status.message,
            "programs": programs,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Resource: {}/{}", outcome.resource.account_id, outcome.resource.resource_id);
    print_status(&outcome.status, false)?;
    for (kind, name) in &outcome.programs {
        println!("  {kind:<14} {name}");
    }
    Ok(())
}

pub(crate) fn print_status(status: &DeploymentStatus, json: bool) -> anyhow::Result<()> {
    if json {
        let body = serde_json::json!({
            "code": status.code(),
            "status": status.status,
            "message": status.message,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("Status: {} ({}) {}", status.status, status.code(), status.message);
    }
    Ok(())
}

pub(crate) fn print_verified(verified: &ApplicationDeployable, json: bool) -> anyhow::Result<()> {
    let programs = verified.spec.program_names();
    if json {
        let body = serde_json::json!({
            "application": verified.app_id,
            "programs": programs,
            "datasets": verified.spec.datasets.keys().collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("Verified {}", verified.app_id);
        for name in programs {
            println!("  {name}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_core::DeployStatus;
    use fabric_spec::ApplicationSpecification;
    use fabric_test_utils::{app_with_programs, workflow_w, workflow_w_duplicate, write_archive};

    fn request(account: &str, archive: PathBuf) -> DeployRequest {
        DeployRequest {
            account: account.into(),
            archive,
            owner: None,
            token: "local".into(),
        }
    }

    #[tokio::test]
    async fn deploy_uploads_in_small_chunks() {
        let root = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        let app = app_with_programs("app").with_workflow(workflow_w());
        let archive = write_archive(source.path(), "app.json", &app);
        let config = FabricConfig::new().with_archive_dir(root.path()).with_chunk_size(16);

        let outcome = deploy(config.clone(), request("acme", archive)).await.unwrap();

        assert_eq!(outcome.status.status, DeployStatus::Deployed);
        assert_eq!(outcome.programs.len(), 4);

        // A later invocation reads the persisted record
        let later = status(config, "acme", "local").await.unwrap();
        assert_eq!(later.status, DeployStatus::Deployed);
    }

    #[tokio::test]
    async fn deploy_reports_failure_reason() {
        let root = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        let app = app_with_programs("app").with_workflow(workflow_w_duplicate());
        let archive = write_archive(source.path(), "app.json", &app);
        let config = FabricConfig::new().with_archive_dir(root.path());

        let outcome = deploy(config, request("acme", archive)).await.unwrap();

        assert_eq!(outcome.status.status, DeployStatus::Failed);
        assert!(outcome.status.message.contains("'B'"));
        assert!(outcome.programs.is_empty());
    }

    #[tokio::test]
    async fn status_of_unknown_account() {
        let root = tempfile::tempdir().unwrap();
        let config = FabricConfig::new().with_archive_dir(root.path());
        let status = status(config, "nobody", "local").await.unwrap();
        assert_eq!(status.code(), 0);
    }

    #[tokio::test]
    async fn verify_accepts_and_rejects() {
        let source = tempfile::tempdir().unwrap();
        let good = write_archive(source.path(), "good.json", &app_with_programs("app").with_workflow(workflow_w()));
        let verified = verify(&good, "tenant", None).await.unwrap();
        assert_eq!(verified.app_id.application, "app");

        let bad = write_archive(
            source.path(),
            "bad.json",
            &ApplicationSpecification::new("app").with_workflow(workflow_w()),
        );
        assert!(verify(&bad, "tenant", None).await.is_err());
    }

    #[test]
    fn archive_dir_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("fabric.toml");
        std::fs::write(&file, "archive_dir = \"/srv/from-file\"\ndeploy_workers = 2\n").unwrap();

        let config = load_config(Some(&file), Some(&PathBuf::from("/srv/from-flag"))).unwrap();
        assert_eq!(config.archive_dir, PathBuf::from("/srv/from-flag"));
        assert_eq!(config.deploy_workers, 2);
    }
}
