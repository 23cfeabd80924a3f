use crate::db::schema::count_accounts_by_username;
use crate::error::BootstrapError;
use crate::framework::Framework;
use crate::types::{ConnectionTarget, SeedAccount};
use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Lookup and creation of accounts in the target store.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn account_exists(&self, username: &str) -> Result<bool, BootstrapError>;

    async fn create_account(&self, account: &SeedAccount) -> Result<(), BootstrapError>;
}

/// Reads the framework's account table directly and delegates creation to
/// the framework so passwords are hashed the way the application expects.
#[derive(Clone)]
pub struct FrameworkAccounts {
    pool: AnyPool,
    framework: Arc<dyn Framework>,
}

impl FrameworkAccounts {
    /// The pool connects lazily: nothing touches the store until the first
    /// lookup, so a disabled seed stage never opens a connection.
    pub fn connect_lazy(
        target: &ConnectionTarget,
        framework: Arc<dyn Framework>,
    ) -> Result<Self, BootstrapError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(target.driver_url())?;
        Ok(Self { pool, framework })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl AccountStore for FrameworkAccounts {
    async fn account_exists(&self, username: &str) -> Result<bool, BootstrapError> {
        let sql = count_accounts_by_username();
        let (n,): (i64,) = sqlx::query_as(&sql)
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(n > 0)
    }

    async fn create_account(&self, account: &SeedAccount) -> Result<(), BootstrapError> {
        self.framework.create_superuser(account).await
    }
}
