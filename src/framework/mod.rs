pub mod django;

use crate::error::BootstrapError;
use crate::types::SeedAccount;
use async_trait::async_trait;

pub use django::DjangoManage;

/// Management commands of the web framework the bootstrapper drives.
///
/// Each command is expected to be idempotent on the framework's side.
#[async_trait]
pub trait Framework: Send + Sync {
    /// Apply pending schema migrations, non-interactively.
    async fn migrate(&self) -> Result<(), BootstrapError>;

    /// Collect static assets into the configured output directory.
    async fn collect_static(&self) -> Result<(), BootstrapError>;

    /// Load the named fixtures.
    async fn load_fixtures(&self, fixtures: &[String]) -> Result<(), BootstrapError>;

    /// Create a privileged account. Callers check for existence first.
    async fn create_superuser(&self, account: &SeedAccount) -> Result<(), BootstrapError>;
}
