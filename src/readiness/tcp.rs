//! Raw TCP connect probe.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::config::ConnectionTarget;
use crate::readiness::{Probe, ProbeError};

#[derive(Debug, Default)]
pub struct TcpProbe;

#[async_trait]
impl Probe for TcpProbe {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn check(&self, target: &ConnectionTarget) -> Result<(), ProbeError> {
        let mut stream = TcpStream::connect((target.host.as_str(), target.port)).await?;
        let _ = stream.shutdown().await;
        Ok(())
    }
}
