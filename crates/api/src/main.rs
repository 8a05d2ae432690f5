use std::sync::Arc;

use anyhow::Context;

use shopfloor_infra::{AppConfig, BackOfficeStore, InMemoryStore, PostgresStore, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopfloor_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store: Arc<dyn BackOfficeStore> = match &config.store {
        StoreBackend::InMemory => {
            tracing::info!("using in-memory store");
            Arc::new(InMemoryStore::new())
        }
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PostgresStore::connect(database_url, *max_connections)
                .await
                .context("failed to connect to postgres")?;
            store.migrate().await.context("failed to apply schema")?;
            tracing::info!(max_connections, "using postgres store");
            Arc::new(store)
        }
    };

    let app = shopfloor_api::app::build_app_with_store(config.jwt_secret.clone(), store).await;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
