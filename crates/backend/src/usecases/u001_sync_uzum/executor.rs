use chrono::Utc;
use contracts::usecases::u001_sync_uzum::{SyncErrorKind, SyncRequest, SyncResponse};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::catalog_index::{CatalogIndex, CatalogListing};
use super::reconciliation;
use super::uzum_api_client::{UzumApi, UzumApiError, UzumShop};
use crate::domain::a001_uzum_order_item::OrderStore;
use crate::domain::a002_local_product::ProductStore;

const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Ошибки синхронизации; каждая причина различима для оператора
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Authentication/shop lookup failed: {0}")]
    ShopLookup(#[source] UzumApiError),

    #[error("No shops available for this seller account")]
    NoShops,

    #[error("Financial data fetch failed: {0}")]
    FinanceFetch(#[source] UzumApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Invalid date range: dateFrom {date_from} is after dateTo {date_to}")]
    InvalidRange { date_from: i64, date_to: i64 },
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::ShopLookup(_) => SyncErrorKind::ShopLookup,
            SyncError::NoShops => SyncErrorKind::NoShops,
            SyncError::FinanceFetch(_) => SyncErrorKind::FinanceFetch,
            SyncError::Storage(_) => SyncErrorKind::Storage,
            SyncError::InvalidRange { .. } => SyncErrorKind::InvalidRange,
        }
    }
}

/// Итог успешной синхронизации
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub fetched_count: usize,
    pub total_stored: usize,
    pub products_created: usize,
    pub products_updated: usize,
    /// false, если каталог получить не удалось и сверка товаров пропущена
    pub catalog_synced: bool,
}

/// Выбор магазинов: предпочтительный, если он есть у аккаунта, иначе первый
pub fn select_shops(shops: &[UzumShop], preferred_shop_id: Option<i64>) -> Result<Vec<i64>, SyncError> {
    let first = shops.first().ok_or(SyncError::NoShops)?;

    match preferred_shop_id {
        Some(preferred) if shops.iter().any(|s| s.id == preferred) => Ok(vec![preferred]),
        Some(preferred) => {
            tracing::warn!(
                "Preferred shop {} is not available, falling back to shop {}",
                preferred,
                first.id
            );
            Ok(vec![first.id])
        }
        None => Ok(vec![first.id]),
    }
}

/// Executor для UseCase синхронизации заказов и товаров Uzum
pub struct SyncExecutor {
    api: Arc<dyn UzumApi>,
    order_store: Arc<dyn OrderStore>,
    product_store: Arc<dyn ProductStore>,
    preferred_shop_id: Option<i64>,
    /// Синхронизации выполняются строго по одной
    run_lock: Mutex<()>,
}

impl SyncExecutor {
    pub fn new(
        api: Arc<dyn UzumApi>,
        order_store: Arc<dyn OrderStore>,
        product_store: Arc<dyn ProductStore>,
        preferred_shop_id: Option<i64>,
    ) -> Self {
        Self {
            api,
            order_store,
            product_store,
            preferred_shop_id,
            run_lock: Mutex::new(()),
        }
    }

    /// Выполнить синхронизацию и вернуть итог в виде ответа для оператора
    pub async fn sync(&self, request: SyncRequest) -> SyncResponse {
        let date_to = request.date_to.unwrap_or_else(|| Utc::now().timestamp_millis());
        let date_from = request
            .date_from
            .unwrap_or(date_to - DEFAULT_WINDOW_DAYS * 24 * 60 * 60 * 1000);

        match self.run(date_from, date_to).await {
            Ok(summary) => {
                let mut message = format!(
                    "Синхронизировано строк: {}, всего в базе: {}. Товаров создано: {}, обновлено: {}",
                    summary.fetched_count,
                    summary.total_stored,
                    summary.products_created,
                    summary.products_updated
                );
                if !summary.catalog_synced {
                    message.push_str(". Каталог Uzum недоступен, сверка товаров пропущена");
                }
                SyncResponse::completed(
                    summary.fetched_count,
                    summary.total_stored,
                    summary.products_created,
                    summary.products_updated,
                    message,
                )
            }
            Err(e) => {
                tracing::error!("Uzum sync failed: {}", e);
                SyncResponse::failed(e.kind(), e.to_string())
            }
        }
    }

    /// Загрузка заказов, слияние, сверка каталога
    pub async fn run(&self, date_from: i64, date_to: i64) -> Result<SyncSummary, SyncError> {
        if date_from > date_to {
            return Err(SyncError::InvalidRange { date_from, date_to });
        }

        let _guard = self.run_lock.lock().await;
        let run_id = Uuid::new_v4();
        let overall_start = std::time::Instant::now();
        tracing::info!(
            "Starting Uzum sync {}: dateFrom={}, dateTo={}",
            run_id,
            date_from,
            date_to
        );

        // Магазины
        let shops = self.api.list_shops().await.map_err(SyncError::ShopLookup)?;
        let shop_ids = select_shops(&shops, self.preferred_shop_id)?;
        tracing::info!("Sync {}: target shops {:?}", run_id, shop_ids);

        // Финансовые заказы
        let fetch_start = std::time::Instant::now();
        let fetched = self
            .api
            .list_financial_orders(&shop_ids, date_from, date_to)
            .await
            .map_err(SyncError::FinanceFetch)?;
        let fetch_duration = fetch_start.elapsed();
        let fetched_count = fetched.len();

        let stored = self.order_store.merge_and_save(fetched.clone()).await?;
        let total_stored = stored.len();

        // Каталог: его отсутствие не отменяет слияние заказов
        let catalog_start = std::time::Instant::now();
        let Some(listings) = self.fetch_catalog(&shop_ids).await else {
            tracing::info!(
                "Sync {} finished without catalog in {}ms: fetched={}, stored={}",
                run_id,
                overall_start.elapsed().as_millis(),
                fetched_count,
                total_stored
            );
            return Ok(SyncSummary {
                fetched_count,
                total_stored,
                products_created: 0,
                products_updated: 0,
                catalog_synced: false,
            });
        };
        let index = CatalogIndex::build(&listings);
        if index.is_empty() {
            tracing::warn!("Sync {}: catalog has no SKUs, no order item can be matched", run_id);
        }
        let catalog_duration = catalog_start.elapsed();

        // Сверка товаров
        let reconcile_start = std::time::Instant::now();
        let local_products = self.product_store.get().await?;
        let outcome = reconciliation::reconcile(&fetched, &index, local_products);
        if outcome.has_changes() {
            self.product_store.save(&outcome.products).await?;
        }
        let reconcile_duration = reconcile_start.elapsed();

        tracing::info!("=== Sync audit {} ===", run_id);
        tracing::info!("Fetch orders: {}ms", fetch_duration.as_millis());
        tracing::info!("Fetch catalog + index: {}ms", catalog_duration.as_millis());
        tracing::info!("Reconcile products: {}ms", reconcile_duration.as_millis());
        tracing::info!(
            "Results: fetched={}, stored={}, created={}, updated={}, unmatched={}, total={}ms",
            fetched_count,
            total_stored,
            outcome.created,
            outcome.updated,
            outcome.unmatched,
            overall_start.elapsed().as_millis()
        );

        Ok(SyncSummary {
            fetched_count,
            total_stored,
            products_created: outcome.created,
            products_updated: outcome.updated,
            catalog_synced: true,
        })
    }

    async fn fetch_catalog(&self, shop_ids: &[i64]) -> Option<Vec<CatalogListing>> {
        let mut listings = Vec::new();
        for shop_id in shop_ids {
            match self.api.list_shop_products(*shop_id).await {
                Ok(batch) => listings.extend(batch),
                Err(e) => {
                    tracing::warn!(
                        "Catalog fetch for shop {} failed, skipping product reconciliation: {}",
                        shop_id,
                        e
                    );
                    return None;
                }
            }
        }
        Some(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::super::catalog_index::test_support::{listing, sku};
    use super::*;
    use crate::domain::a001_uzum_order_item::repository::memory::MemoryOrderStore;
    use crate::domain::a001_uzum_order_item::repository::test_support::order;
    use crate::domain::a002_local_product::repository::memory::MemoryProductStore;
    use crate::domain::a002_local_product::seed;
    use async_trait::async_trait;
    use contracts::domain::a001_uzum_order_item::aggregate::UzumOrderItem;

    #[derive(Default)]
    struct FakeUzumApi {
        /// None - ошибка авторизации
        shops: Option<Vec<UzumShop>>,
        /// None - ошибка загрузки финансов
        orders: Option<Vec<UzumOrderItem>>,
        /// None - каталог недоступен
        catalog: Option<Vec<CatalogListing>>,
        requested_shops: std::sync::Mutex<Vec<Vec<i64>>>,
    }

    fn unauthorized() -> UzumApiError {
        UzumApiError::Http {
            status: 401,
            body: "Unauthorized".to_string(),
        }
    }

    #[async_trait]
    impl UzumApi for FakeUzumApi {
        async fn list_shops(&self) -> Result<Vec<UzumShop>, UzumApiError> {
            self.shops.clone().ok_or_else(unauthorized)
        }

        async fn list_financial_orders(
            &self,
            shop_ids: &[i64],
            _date_from: i64,
            _date_to: i64,
        ) -> Result<Vec<UzumOrderItem>, UzumApiError> {
            self.requested_shops.lock().unwrap().push(shop_ids.to_vec());
            self.orders.clone().ok_or(UzumApiError::Timeout)
        }

        async fn list_shop_products(&self, _shop_id: i64) -> Result<Vec<CatalogListing>, UzumApiError> {
            self.catalog
                .clone()
                .ok_or_else(|| UzumApiError::Transport("connection reset".to_string()))
        }
    }

    fn shop(id: i64) -> UzumShop {
        UzumShop { id, name: None }
    }

    fn title_only_item(id: i64, title: &str) -> UzumOrderItem {
        let mut item = order(id, 120000, 1_700_000_000_000);
        item.sku_title = Some(title.to_string());
        item
    }

    struct Harness {
        api: Arc<FakeUzumApi>,
        orders: Arc<MemoryOrderStore>,
        products: Arc<MemoryProductStore>,
        executor: SyncExecutor,
    }

    fn harness(api: FakeUzumApi, preferred: Option<i64>) -> Harness {
        let api = Arc::new(api);
        let orders = Arc::new(MemoryOrderStore::default());
        let products = Arc::new(MemoryProductStore::with_products(
            seed::default_products().unwrap(),
        ));
        let executor = SyncExecutor::new(api.clone(), orders.clone(), products.clone(), preferred);
        Harness {
            api,
            orders,
            products,
            executor,
        }
    }

    #[test]
    fn test_select_shops() {
        let shops = vec![shop(7), shop(9)];
        assert_eq!(select_shops(&shops, Some(9)).unwrap(), vec![9]);
        assert_eq!(select_shops(&shops, Some(100)).unwrap(), vec![7]);
        assert_eq!(select_shops(&shops, None).unwrap(), vec![7]);
        assert!(matches!(select_shops(&[], Some(9)), Err(SyncError::NoShops)));
    }

    #[tokio::test]
    async fn test_empty_shop_list_fails_without_writes() {
        let h = harness(
            FakeUzumApi {
                shops: Some(Vec::new()),
                orders: Some(vec![order(1, 100, 0)]),
                catalog: Some(Vec::new()),
                ..Default::default()
            },
            None,
        );

        let response = h.executor.sync(SyncRequest::default()).await;

        assert!(!response.success);
        assert!(response.error.is_some());
        assert_eq!(response.error_kind, Some(SyncErrorKind::NoShops));
        assert_eq!(h.orders.write_count(), 0);
        assert_eq!(h.products.save_count(), 0);
        assert!(h.api.requested_shops.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failures_are_distinguishable() {
        let h = harness(FakeUzumApi::default(), None);
        let response = h.executor.sync(SyncRequest::default()).await;
        assert_eq!(response.error_kind, Some(SyncErrorKind::ShopLookup));

        let h = harness(
            FakeUzumApi {
                shops: Some(vec![shop(1)]),
                orders: None,
                catalog: Some(Vec::new()),
                ..Default::default()
            },
            None,
        );
        let response = h.executor.sync(SyncRequest::default()).await;
        assert!(!response.success);
        assert_eq!(response.error_kind, Some(SyncErrorKind::FinanceFetch));
        assert_eq!(h.orders.write_count(), 0);
        assert_eq!(h.products.save_count(), 0);
    }

    #[tokio::test]
    async fn test_catalog_failure_still_merges_orders() {
        let h = harness(
            FakeUzumApi {
                shops: Some(vec![shop(1)]),
                orders: Some(vec![order(1, 100, 0), order(2, 200, 0)]),
                catalog: None,
                ..Default::default()
            },
            None,
        );

        let response = h.executor.sync(SyncRequest::default()).await;

        assert!(response.success);
        assert_eq!(response.synced_count, Some(2));
        assert_eq!(response.total_stored, Some(2));
        assert_eq!(response.products_created, Some(0));
        assert_eq!(h.orders.get().await.unwrap().len(), 2);
        assert_eq!(h.products.save_count(), 0);
    }

    #[tokio::test]
    async fn test_sync_creates_product_once() {
        let h = harness(
            FakeUzumApi {
                shops: Some(vec![shop(3), shop(5)]),
                orders: Some(vec![title_only_item(501, "Red Mug L")]),
                catalog: Some(vec![listing(10, vec![sku(Some(900), Some("Red Mug L"))])]),
                ..Default::default()
            },
            Some(5),
        );
        let seeded = seed::default_products().unwrap().len();

        let first = h.executor.sync(SyncRequest::default()).await;
        assert!(first.success);
        assert_eq!(first.products_created, Some(1));
        assert_eq!(first.products_updated, Some(0));
        assert_eq!(h.api.requested_shops.lock().unwrap()[0], vec![5]);

        let products = h.products.get().await.unwrap();
        assert_eq!(products.len(), seeded + 1);
        let created: Vec<_> = products.iter().filter(|p| p.sku_id == Some(900)).collect();
        assert_eq!(created.len(), 1);

        let second = h.executor.sync(SyncRequest::default()).await;
        assert!(second.success);
        assert_eq!(second.products_created, Some(0));
        assert_eq!(second.products_updated, Some(0));
        assert_eq!(second.total_stored, Some(1));
        assert_eq!(h.products.save_count(), 1);
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let h = harness(
            FakeUzumApi {
                shops: Some(vec![shop(1)]),
                orders: Some(Vec::new()),
                catalog: Some(Vec::new()),
                ..Default::default()
            },
            None,
        );
        let response = h
            .executor
            .sync(SyncRequest {
                date_from: Some(20),
                date_to: Some(10),
            })
            .await;
        assert_eq!(response.error_kind, Some(SyncErrorKind::InvalidRange));
        assert_eq!(h.orders.write_count(), 0);
    }
}
