use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::a002_local_product::aggregate::LocalProduct;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DatabaseConnection, QueryOrder, Set, TransactionTrait};
use tokio::sync::Mutex;

use super::seed;
use crate::shared::data::db;

const TABLE_NAME: &str = "a002_local_product";
const INSERT_CHUNK: usize = 200;

/// Хранилище локального каталога (чтение и запись целиком)
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get(&self) -> Result<Vec<LocalProduct>>;
    async fn save(&self, products: &[LocalProduct]) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a002_local_product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub sku_id: Option<i64>,
    pub payload: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn from_model(m: Model) -> Result<LocalProduct> {
    serde_json::from_str(&m.payload)
        .map_err(|e| anyhow::anyhow!("Corrupted product {}: {}", m.id, e))
}

fn to_active(product: &LocalProduct, updated_at: &str) -> Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(product.id),
        sku_id: Set(product.sku_id),
        payload: Set(serde_json::to_string(product)?),
        updated_at: Set(updated_at.to_string()),
    })
}

async fn replace_all<C: ConnectionTrait>(conn: &C, products: &[LocalProduct]) -> Result<()> {
    Entity::delete_many().exec(conn).await?;

    let updated_at = Utc::now().to_rfc3339();
    for chunk in products.chunks(INSERT_CHUNK) {
        let models = chunk
            .iter()
            .map(|p| to_active(p, &updated_at))
            .collect::<Result<Vec<_>>>()?;
        Entity::insert_many(models)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

/// ProductStore поверх SQLite
///
/// Уникальный индекс по sku_id не дает записать два товара с одним SKU.
pub struct SqliteProductStore {
    conn: DatabaseConnection,
    write_lock: Mutex<()>,
}

impl SqliteProductStore {
    /// Открыть хранилище. При первом запуске таблица создается
    /// и заполняется стартовым каталогом.
    pub async fn open(conn: DatabaseConnection) -> Result<Self> {
        if !db::table_exists(&conn, TABLE_NAME).await? {
            tracing::info!("Creating {} table", TABLE_NAME);
            let txn = conn.begin().await?;
            txn.execute_unprepared(
                r#"
                CREATE TABLE a002_local_product (
                    id INTEGER PRIMARY KEY NOT NULL,
                    sku_id INTEGER,
                    payload TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                "#,
            )
            .await?;
            txn.execute_unprepared(
                "CREATE UNIQUE INDEX idx_a002_local_product_sku_id ON a002_local_product(sku_id);",
            )
            .await?;

            let products = seed::default_products()?;
            replace_all(&txn, &products).await?;
            txn.commit().await?;
            tracing::info!("Seeded {} with {} default products", TABLE_NAME, products.len());
        }

        Ok(Self {
            conn,
            write_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    async fn get(&self) -> Result<Vec<LocalProduct>> {
        Entity::find()
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(from_model)
            .collect()
    }

    async fn save(&self, products: &[LocalProduct]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let txn = self.conn.begin().await?;
        replace_all(&txn, products).await?;
        txn.commit().await?;
        tracing::info!("Product store saved: {} products", products.len());
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct MemoryProductStore {
        products: Mutex<Vec<LocalProduct>>,
        saves: AtomicUsize,
    }

    impl MemoryProductStore {
        pub fn with_products(products: Vec<LocalProduct>) -> Self {
            Self {
                products: Mutex::new(products),
                saves: AtomicUsize::new(0),
            }
        }

        pub fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductStore for MemoryProductStore {
        async fn get(&self) -> Result<Vec<LocalProduct>> {
            Ok(self.products.lock().await.clone())
        }

        async fn save(&self, products: &[LocalProduct]) -> Result<()> {
            *self.products.lock().await = products.to_vec();
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_open_seeds_catalog_once() {
        let path = db::test_db_path();
        let conn = db::connect(&path).await.unwrap();
        let store = SqliteProductStore::open(conn.clone()).await.unwrap();

        let seeded = store.get().await.unwrap();
        assert_eq!(seeded, seed::default_products().unwrap());

        let mut trimmed = seeded.clone();
        trimmed.truncate(1);
        store.save(&trimmed).await.unwrap();

        // повторное открытие не перезаписывает каталог стартовым
        let reopened = SqliteProductStore::open(conn).await.unwrap();
        assert_eq!(reopened.get().await.unwrap(), trimmed);
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_sku() {
        let conn = db::connect(&db::test_db_path()).await.unwrap();
        let store = SqliteProductStore::open(conn).await.unwrap();

        let mut products = store.get().await.unwrap();
        products[0].sku_id = Some(900);
        products[1].sku_id = Some(900);

        assert!(store.save(&products).await.is_err());
        // транзакция откатилась - каталог прежний
        assert_eq!(store.get().await.unwrap(), seed::default_products().unwrap());
    }
}
