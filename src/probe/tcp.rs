use super::Prober;
use crate::error::BootstrapError;
use crate::types::{ConnectionTarget, ServiceTarget};
use async_trait::async_trait;
use tokio::net::TcpStream;

/// Checks that something accepts TCP connections on the store's port.
pub struct TcpProber;

#[async_trait]
impl Prober for TcpProber {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn probe(&self, target: &ConnectionTarget) -> Result<(), BootstrapError> {
        let endpoint = target.endpoint().ok_or_else(|| {
            BootstrapError::Config(format!("{target} has no network endpoint"))
        })?;
        connect(endpoint).await
    }
}

/// Open and drop a TCP connection to `endpoint`.
pub async fn connect(endpoint: &ServiceTarget) -> Result<(), BootstrapError> {
    let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
    drop(stream);
    Ok(())
}
