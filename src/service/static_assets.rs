use crate::config::StaticConfig;
use crate::error::BootstrapError;
use crate::framework::Framework;
use crate::types::StageStatus;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{debug, info, warn};

const STATIC_ROOT_MODE: u32 = 0o755;

/// Create the static output directory if missing and normalise its mode.
pub async fn prepare_static_root(root: &Path) -> Result<(), BootstrapError> {
    tokio::fs::create_dir_all(root).await?;
    tokio::fs::set_permissions(root, Permissions::from_mode(STATIC_ROOT_MODE)).await?;
    Ok(())
}

/// Optional stage: never fails the bootstrap, failures come back as warnings.
pub async fn collect_static_assets(cfg: &StaticConfig, framework: &dyn Framework) -> StageStatus {
    if !cfg.enabled {
        debug!("static asset collection disabled");
        return StageStatus::Skipped;
    }

    info!(root = %cfg.root.display(), "collecting static assets");
    let result = async {
        prepare_static_root(&cfg.root).await?;
        framework.collect_static().await
    }
    .await;

    match result {
        Ok(()) => {
            info!(root = %cfg.root.display(), "static assets collected");
            StageStatus::Done
        }
        Err(e) => {
            warn!(error = %e, "static asset collection failed; continuing");
            StageStatus::Warning(e.to_string())
        }
    }
}
