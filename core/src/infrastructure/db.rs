use anyhow::Context;
use sea_orm::{Database, DatabaseConnection};

use crate::domain::common::DatabaseConfig;

pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let url = format!(
        "postgres://{}:{}@{}:{}/{}",
        config.username, config.password, config.host, config.port, config.name
    );

    Database::connect(&url)
        .await
        .context("failed to connect to database")
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db.get_postgres_connection_pool())
        .await
        .context("failed to run database migrations")?;

    Ok(())
}
