use anyhow::{Context, Result};
use std::sync::Arc;

use crate::domain::a001_uzum_order_item::{OrderStore, SqliteOrderStore};
use crate::domain::a002_local_product::{ProductStore, SqliteProductStore};
use crate::shared::config::{get_database_path, Config};
use crate::shared::data::db;
use crate::usecases::u001_sync_uzum::{SyncExecutor, UzumApiClient};

/// Общее состояние приложения, передается в handlers через State
pub struct AppContext {
    pub order_store: Arc<dyn OrderStore>,
    pub product_store: Arc<dyn ProductStore>,
    pub sync_executor: SyncExecutor,
}

/// Подключение к БД, открытие хранилищ и сборка executor синхронизации
pub async fn initialize(config: &Config) -> Result<AppContext> {
    let db_path = get_database_path(config);
    let conn = db::connect(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let order_store: Arc<dyn OrderStore> = Arc::new(SqliteOrderStore::open(conn.clone()).await?);
    let product_store: Arc<dyn ProductStore> = Arc::new(SqliteProductStore::open(conn).await?);

    if config.uzum.api_token.trim().is_empty() {
        tracing::warn!("Uzum API token is not configured, sync requests will fail until it is set");
    }
    let api = Arc::new(UzumApiClient::new(&config.uzum)?);

    let sync_executor = SyncExecutor::new(
        api,
        order_store.clone(),
        product_store.clone(),
        config.uzum.preferred_shop_id,
    );

    tracing::info!("Application context initialized");
    Ok(AppContext {
        order_store,
        product_store,
        sync_executor,
    })
}
