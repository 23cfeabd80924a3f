//! Readiness probing for the data store and other dependencies.
//!
//! Layout:
//! - `native.rs`: opens and closes a real driver connection (authoritative)
//! - `tcp.rs`: plain TCP reachability (best effort)
//! - `wait.rs`: fixed-interval polling until ready or timed out

pub mod native;
pub mod tcp;
pub mod wait;

use crate::config::ProbeStrategy;
use crate::error::BootstrapError;
use crate::types::{ConnectionTarget, StoreKind};
use async_trait::async_trait;

pub use native::NativeProber;
pub use tcp::TcpProber;
pub use wait::{wait_for_service, wait_for_store};

/// One reachability check against the data store.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn probe(&self, target: &ConnectionTarget) -> Result<(), BootstrapError>;
}

/// Pick the probe strategy once at startup.
pub fn select_prober(
    strategy: ProbeStrategy,
    target: &ConnectionTarget,
) -> Result<Box<dyn Prober>, BootstrapError> {
    match (strategy, target.kind()) {
        (ProbeStrategy::Tcp, StoreKind::Sqlite) => Err(BootstrapError::Config(
            "TCP probe cannot reach a file-backed sqlite database".to_string(),
        )),
        (ProbeStrategy::Tcp, _) => Ok(Box::new(TcpProber)),
        (ProbeStrategy::Auto | ProbeStrategy::Native, kind) if NativeProber::supports(kind) => {
            Ok(Box::new(NativeProber::new()))
        }
        (ProbeStrategy::Native, kind) => Err(BootstrapError::Config(format!(
            "no native driver for {kind}"
        ))),
        (ProbeStrategy::Auto, _) => Ok(Box::new(TcpProber)),
    }
}
