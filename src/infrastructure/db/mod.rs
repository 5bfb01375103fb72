use std::time::Duration;

use anyhow::Context;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use crate::bootstrap::config::DEFAULT_DATABASE;

const APP_NAME: &str = "grubhub-api";

async fn client_options(uri: &str, timeout: Duration) -> anyhow::Result<ClientOptions> {
    let mut opts = ClientOptions::parse(uri)
        .await
        .context("invalid MongoDB connection string")?;
    opts.app_name = Some(APP_NAME.into());
    opts.server_selection_timeout = Some(timeout);
    Ok(opts)
}

fn database_name(opts: &ClientOptions, name: Option<&str>) -> String {
    name.map(str::to_owned)
        .or_else(|| opts.default_database.clone())
        .unwrap_or_else(|| DEFAULT_DATABASE.into())
}

/// Builds a database handle without touching the network. The driver
/// connects lazily on first use.
pub async fn handle(uri: &str, name: Option<&str>, timeout: Duration) -> anyhow::Result<Database> {
    let opts = client_options(uri, timeout).await?;
    let db_name = database_name(&opts, name);
    let client = Client::with_options(opts)?;
    Ok(client.database(&db_name))
}

/// Connects and verifies the server answers. No retries: a failure here is
/// meant to abort startup.
pub async fn connect(uri: &str, name: Option<&str>, timeout: Duration) -> anyhow::Result<Database> {
    let db = handle(uri, name, timeout).await?;
    ping(&db)
        .await
        .with_context(|| format!("MongoDB unreachable (database `{}`)", db.name()))?;
    tracing::info!(database = %db.name(), "mongodb_connected");
    Ok(db)
}

pub async fn ping(db: &Database) -> anyhow::Result<()> {
    db.run_command(doc! { "ping": 1 }).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn database_name_prefers_explicit_then_uri() {
        let timeout = Duration::from_millis(50);
        let db = handle("mongodb://127.0.0.1:27017/shop", Some("override"), timeout)
            .await
            .unwrap();
        assert_eq!(db.name(), "override");

        let db = handle("mongodb://127.0.0.1:27017/shop", None, timeout)
            .await
            .unwrap();
        assert_eq!(db.name(), "shop");

        let db = handle("mongodb://127.0.0.1:27017", None, timeout)
            .await
            .unwrap();
        assert_eq!(db.name(), DEFAULT_DATABASE);
    }

    #[tokio::test]
    async fn malformed_uri_is_rejected() {
        let err = handle("not a uri", None, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection string"));
    }
}
