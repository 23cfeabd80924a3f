use super::Prober;
use crate::error::BootstrapError;
use crate::types::{ConnectionTarget, StoreKind};
use async_trait::async_trait;
use sqlx::{AnyConnection, Connection};

/// Opens a real driver connection and closes it straight away.
pub struct NativeProber;

impl NativeProber {
    pub fn new() -> Self {
        sqlx::any::install_default_drivers();
        Self
    }

    /// Whether a driver for `kind` is compiled in.
    pub fn supports(kind: StoreKind) -> bool {
        matches!(kind, StoreKind::Postgres | StoreKind::Sqlite)
    }
}

impl Default for NativeProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for NativeProber {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn probe(&self, target: &ConnectionTarget) -> Result<(), BootstrapError> {
        let conn = AnyConnection::connect(target.driver_url()).await?;
        conn.close().await?;
        Ok(())
    }
}
