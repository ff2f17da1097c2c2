//! PostgreSQL handshake probe.
//!
//! Authenticates with the resolved credentials, so a datastore that accepts
//! TCP but is still starting up ("the database system is starting up") or
//! rejects the role counts as not ready.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

use crate::config::ConnectionTarget;
use crate::readiness::{Probe, ProbeError};

const APPLICATION_NAME: &str = "bootgate-readiness";

#[derive(Debug, Default)]
pub struct PostgresProbe;

impl PostgresProbe {
    pub fn new() -> Self {
        Self
    }

    fn connect_options(target: &ConnectionTarget) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .username(&target.user)
            .database(&target.database)
            .application_name(APPLICATION_NAME);
        match target.password() {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

#[async_trait]
impl Probe for PostgresProbe {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self, target: &ConnectionTarget) -> Result<(), ProbeError> {
        let conn = PgConnection::connect_with(&Self::connect_options(target)).await?;
        // The handshake already proved readiness; a failed goodbye is not a probe failure.
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "Probe connection did not close cleanly");
        }
        Ok(())
    }
}
