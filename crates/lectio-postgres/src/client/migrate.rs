//! Embedded migration runner.

use std::time::{Duration, Instant};

use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Outcome of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    /// Wall-clock time spent applying migrations.
    pub duration: Duration,
    /// Versions applied by this run, oldest first.
    pub applied_versions: Vec<String>,
}

impl MigrationResult {
    /// Returns whether the schema was already up to date.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.applied_versions.is_empty()
    }
}

/// Migration support for [`PgClient`].
pub trait PgClientMigrationExt {
    /// Applies all pending embedded migrations. Safe to call repeatedly.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<MigrationResult>> + Send;
}

impl PgClientMigrationExt for PgClient {
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MIGRATION)]
    async fn run_pending_migrations(&self) -> PgResult<MigrationResult> {
        let start = Instant::now();
        let conn = self.get_pooled_connection().await?;

        // The harness is synchronous, so it runs on the blocking pool.
        let mut conn: AsyncConnectionWrapper<_> = conn.into();
        let versions = spawn_blocking(move || {
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.into_iter().map(|v| v.to_string()).collect::<Vec<_>>())
        })
        .await
        .map_err(|err| PgError::Migration(err.into()))?
        .map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET_MIGRATION,
                error = %err,
                "database migration failed"
            );
            PgError::Migration(err)
        })?;

        let result = MigrationResult {
            duration: start.elapsed(),
            applied_versions: versions,
        };

        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            duration = ?result.duration,
            applied = result.applied_versions.len(),
            "database migrations completed"
        );

        Ok(result)
    }
}
