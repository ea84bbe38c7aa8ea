use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::a001_uzum_order_item::aggregate::UzumOrderItem;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DatabaseConnection, QueryOrder, Set, TransactionTrait};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use crate::shared::data::db;

const TABLE_NAME: &str = "a001_uzum_order_item";
const INSERT_CHUNK: usize = 200;

/// Хранилище строк финансовых заказов
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Все сохраненные строки, отсортированные по id
    async fn get(&self) -> Result<Vec<UzumOrderItem>>;

    /// Слить новую выборку с сохраненной по id и записать результат
    async fn merge_and_save(&self, new_items: Vec<UzumOrderItem>) -> Result<Vec<UzumOrderItem>>;

    /// Ручная корректировка себестоимости одной строки.
    /// Возвращает None, если строки с таким id нет.
    async fn update_cost(&self, order_id: i64, purchase_price: i64)
        -> Result<Option<UzumOrderItem>>;
}

/// Слияние по id: новая выборка перекрывает сохраненные строки,
/// строки вне новой выборки остаются как есть.
///
/// Себестоимость, введенная вручную, сохраняется, если маркетплейс
/// прислал 0.
pub fn merge_by_id(
    existing: Vec<UzumOrderItem>,
    new_items: Vec<UzumOrderItem>,
) -> (Vec<UzumOrderItem>, Vec<UzumOrderItem>) {
    let mut by_id: BTreeMap<i64, UzumOrderItem> =
        existing.into_iter().map(|item| (item.id, item)).collect();
    let mut written: BTreeMap<i64, UzumOrderItem> = BTreeMap::new();

    for mut item in new_items {
        if item.purchase_price == 0 {
            if let Some(stored) = by_id.get(&item.id) {
                item.purchase_price = stored.purchase_price;
            }
        }
        by_id.insert(item.id, item.clone());
        written.insert(item.id, item);
    }

    (
        by_id.into_values().collect(),
        written.into_values().collect(),
    )
}

// ============================================================================
// SQLite
// ============================================================================

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_uzum_order_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub date_ms: i64,
    pub payload: String,
    pub fetched_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn from_model(m: Model) -> Result<UzumOrderItem> {
    serde_json::from_str(&m.payload)
        .map_err(|e| anyhow::anyhow!("Corrupted order item {}: {}", m.id, e))
}

fn to_active(item: &UzumOrderItem, fetched_at: &str) -> Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(item.id),
        date_ms: Set(item.date),
        payload: Set(serde_json::to_string(item)?),
        fetched_at: Set(fetched_at.to_string()),
    })
}

/// OrderStore поверх SQLite; запись выполняется одной транзакцией
pub struct SqliteOrderStore {
    conn: DatabaseConnection,
    write_lock: Mutex<()>,
}

impl SqliteOrderStore {
    /// Открыть хранилище, создав таблицу при необходимости
    pub async fn open(conn: DatabaseConnection) -> Result<Self> {
        if !db::table_exists(&conn, TABLE_NAME).await? {
            tracing::info!("Creating {} table", TABLE_NAME);
            db::execute_ddl(
                &conn,
                r#"
                CREATE TABLE a001_uzum_order_item (
                    id INTEGER PRIMARY KEY NOT NULL,
                    date_ms INTEGER NOT NULL,
                    payload TEXT NOT NULL,
                    fetched_at TEXT NOT NULL
                );
                "#,
            )
            .await?;
        }

        Ok(Self {
            conn,
            write_lock: Mutex::new(()),
        })
    }

    async fn load_all<C: ConnectionTrait>(conn: &C) -> Result<Vec<UzumOrderItem>> {
        Entity::find()
            .order_by_asc(Column::Id)
            .all(conn)
            .await?
            .into_iter()
            .map(from_model)
            .collect()
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn get(&self) -> Result<Vec<UzumOrderItem>> {
        Self::load_all(&self.conn).await
    }

    async fn merge_and_save(&self, new_items: Vec<UzumOrderItem>) -> Result<Vec<UzumOrderItem>> {
        let _guard = self.write_lock.lock().await;
        let txn = self.conn.begin().await?;

        let existing = Self::load_all(&txn).await?;
        let existing_count = existing.len();
        let (merged, written) = merge_by_id(existing, new_items);

        let fetched_at = Utc::now().to_rfc3339();
        for chunk in written.chunks(INSERT_CHUNK) {
            let models = chunk
                .iter()
                .map(|item| to_active(item, &fetched_at))
                .collect::<Result<Vec<_>>>()?;
            Entity::insert_many(models)
                .on_conflict(
                    OnConflict::column(Column::Id)
                        .update_columns([Column::DateMs, Column::Payload, Column::FetchedAt])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        tracing::info!(
            "Order store merged: existing={}, written={}, total={}",
            existing_count,
            written.len(),
            merged.len()
        );
        Ok(merged)
    }

    async fn update_cost(
        &self,
        order_id: i64,
        purchase_price: i64,
    ) -> Result<Option<UzumOrderItem>> {
        let _guard = self.write_lock.lock().await;

        let Some(model) = Entity::find_by_id(order_id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut item = from_model(model.clone())?;
        item.purchase_price = purchase_price;

        let mut active: ActiveModel = model.into();
        active.payload = Set(serde_json::to_string(&item)?);
        active.update(&self.conn).await?;

        tracing::info!(
            "Purchase price for order item {} set to {}",
            order_id,
            purchase_price
        );
        Ok(Some(item))
    }
}

// ============================================================================
// In-memory (тесты)
// ============================================================================

#[cfg(test)]
pub mod memory {
    use super::*;

    /// OrderStore в памяти; считает записи, чтобы тесты могли проверить их отсутствие
    #[derive(Default)]
    pub struct MemoryOrderStore {
        items: Mutex<Vec<UzumOrderItem>>,
        pub writes: std::sync::atomic::AtomicUsize,
    }

    impl MemoryOrderStore {
        pub fn with_items(items: Vec<UzumOrderItem>) -> Self {
            Self {
                items: Mutex::new(items),
                writes: Default::default(),
            }
        }

        pub fn write_count(&self) -> usize {
            self.writes.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OrderStore for MemoryOrderStore {
        async fn get(&self) -> Result<Vec<UzumOrderItem>> {
            Ok(self.items.lock().await.clone())
        }

        async fn merge_and_save(
            &self,
            new_items: Vec<UzumOrderItem>,
        ) -> Result<Vec<UzumOrderItem>> {
            let mut items = self.items.lock().await;
            let (merged, _) = merge_by_id(items.clone(), new_items);
            *items = merged.clone();
            self.writes
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(merged)
        }

        async fn update_cost(
            &self,
            order_id: i64,
            purchase_price: i64,
        ) -> Result<Option<UzumOrderItem>> {
            let mut items = self.items.lock().await;
            let Some(item) = items.iter_mut().find(|i| i.id == order_id) else {
                return Ok(None);
            };
            item.purchase_price = purchase_price;
            self.writes
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(Some(item.clone()))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn order(id: i64, sell: i64, date: i64) -> UzumOrderItem {
        UzumOrderItem {
            id,
            shop_id: Some(1),
            product_id: None,
            sku_id: None,
            sku_title: None,
            amount: 1,
            sell_price: sell,
            total_price: sell,
            commission: 0,
            logistic_delivery_fee: 0,
            seller_profit: 0,
            purchase_price: 0,
            status: None,
            date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::order;
    use super::*;

    fn ids(items: &[UzumOrderItem]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_merge_is_union_with_new_items_winning() {
        let a = vec![order(1, 100, 0), order(2, 200, 0)];
        let b = vec![order(2, 250, 0), order(3, 300, 0)];

        let (merged, written) = merge_by_id(a, b);

        assert_eq!(ids(&merged), vec![1, 2, 3]);
        assert_eq!(merged[1].sell_price, 250);
        assert_eq!(ids(&written), vec![2, 3]);
    }

    #[test]
    fn test_merge_deduplicates_within_batch() {
        let batch = vec![order(5, 100, 0), order(5, 120, 0)];
        let (merged, _) = merge_by_id(Vec::new(), batch);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].sell_price, 120);
    }

    #[test]
    fn test_merge_keeps_manual_purchase_price() {
        let mut stored = order(7, 100, 0);
        stored.purchase_price = 40;
        let (merged, _) = merge_by_id(vec![stored], vec![order(7, 110, 0)]);
        assert_eq!(merged[0].purchase_price, 40);
        assert_eq!(merged[0].sell_price, 110);
    }

    #[tokio::test]
    async fn test_sqlite_merge_and_save_is_idempotent() {
        let conn = db::connect(&db::test_db_path()).await.unwrap();
        let store = SqliteOrderStore::open(conn).await.unwrap();

        let first = store
            .merge_and_save(vec![order(1, 100, 10), order(2, 200, 20)])
            .await
            .unwrap();
        assert_eq!(first.len(), 2);

        // повторная синхронизация того же окна
        store
            .merge_and_save(vec![order(1, 100, 10), order(2, 200, 20)])
            .await
            .unwrap();
        // более узкое окно не стирает строки вне него
        let narrowed = store.merge_and_save(vec![order(2, 210, 20)]).await.unwrap();

        assert_eq!(ids(&narrowed), vec![1, 2]);
        let stored = store.get().await.unwrap();
        assert_eq!(stored, narrowed);
        assert_eq!(stored[1].sell_price, 210);
    }

    #[tokio::test]
    async fn test_sqlite_update_cost() {
        let conn = db::connect(&db::test_db_path()).await.unwrap();
        let store = SqliteOrderStore::open(conn).await.unwrap();
        store.merge_and_save(vec![order(9, 100, 0)]).await.unwrap();

        let updated = store.update_cost(9, 30).await.unwrap().unwrap();
        assert_eq!(updated.purchase_price, 30);
        assert_eq!(store.get().await.unwrap()[0].purchase_price, 30);

        assert!(store.update_cost(404, 1).await.unwrap().is_none());
    }
}
