//! Schema migrations, compiled into the binary

use futures::future::BoxFuture;
use sqlx::error::BoxDynError;
use sqlx::migrate::{MigrateError, Migration, MigrationSource, MigrationType, Migrator};
use sqlx::PgPool;
use std::borrow::Cow;
use tracing::info;

const MIGRATIONS: &[(i64, &str, &str)] = &[
    (
        20_250_101_000_001,
        "matchmaking",
        include_str!("../migrations/20250101000001_matchmaking.sql"),
    ),
    (
        20_250_101_000_002,
        "ledger",
        include_str!("../migrations/20250101000002_ledger.sql"),
    ),
];

/// Migration source backed by the SQL files embedded above
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedMigrations;

impl<'s> MigrationSource<'s> for EmbeddedMigrations {
    fn resolve(self) -> BoxFuture<'s, Result<Vec<Migration>, BoxDynError>> {
        Box::pin(async move {
            Ok(MIGRATIONS
                .iter()
                .map(|&(version, description, sql)| {
                    Migration::new(
                        version,
                        Cow::Borrowed(description),
                        MigrationType::Simple,
                        Cow::Borrowed(sql),
                        false,
                    )
                })
                .collect())
        })
    }
}

/// Apply any pending migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    let migrator = Migrator::new(EmbeddedMigrations).await?;
    migrator.run(pool).await?;
    info!(count = MIGRATIONS.len(), "Database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedded_migrations_are_ordered() {
        let migrations = EmbeddedMigrations.resolve().await.unwrap();
        assert_eq!(migrations.len(), MIGRATIONS.len());
        assert!(migrations.windows(2).all(|w| w[0].version < w[1].version));
        assert!(migrations[0].sql.contains("CREATE TABLE IF NOT EXISTS pairings"));
    }
}
