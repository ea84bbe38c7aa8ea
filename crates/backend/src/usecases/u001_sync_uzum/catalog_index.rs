use std::collections::HashMap;
use std::sync::Arc;

/// SKU карточки каталога Uzum после нормализации
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSku {
    pub sku_id: Option<i64>,
    pub full_title: Option<String>,
    pub sell_price: Option<i64>,
    pub purchase_price: Option<i64>,
    pub available_amount: Option<i64>,
}

/// Характеристика карточки ("Цвет" -> "красный")
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogCharacteristic {
    pub title: String,
    pub value: String,
}

/// Карточка каталога Uzum после нормализации (не сохраняется)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogListing {
    pub product_id: i64,
    pub title: String,
    pub description: String,
    /// Изображения в порядке приоритета, первое - основное
    pub images: Vec<String>,
    pub characteristics: Vec<CatalogCharacteristic>,
    pub skus: Vec<CatalogSku>,
}

impl CatalogListing {
    /// Основное изображение: первое непустое
    pub fn main_image(&self) -> Option<&str> {
        self.images
            .iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    /// Характеристики в строку "название: значение; ..."
    pub fn characteristics_line(&self) -> String {
        self.characteristics
            .iter()
            .map(|c| format!("{}: {}", c.title, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Найденная пара (карточка, SKU); карточка общая для всех ее SKU
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub listing: Arc<CatalogListing>,
    pub sku: CatalogSku,
}

/// Индексы каталога для сопоставления строк заказов
#[derive(Debug, Default)]
pub struct CatalogIndex {
    pub by_sku_id: HashMap<i64, CatalogEntry>,
    pub by_title: HashMap<String, CatalogEntry>,
}

impl CatalogIndex {
    /// Построить индекс по skuId и по названию SKU (без пробелов по краям).
    /// При совпадении ключей побеждает более поздняя карточка.
    pub fn build(listings: &[CatalogListing]) -> Self {
        let start_time = std::time::Instant::now();
        let mut index = Self::default();

        for listing in listings {
            let shared = Arc::new(listing.clone());
            for sku in &listing.skus {
                let entry = CatalogEntry {
                    listing: Arc::clone(&shared),
                    sku: sku.clone(),
                };

                if let Some(sku_id) = sku.sku_id {
                    index.by_sku_id.insert(sku_id, entry.clone());
                }

                if let Some(title) = sku.full_title.as_deref().map(str::trim) {
                    if !title.is_empty() {
                        index.by_title.insert(title.to_string(), entry);
                    }
                }
            }
        }

        tracing::info!(
            "Built catalog index in {}ms: {} listings, {} sku ids, {} titles",
            start_time.elapsed().as_millis(),
            listings.len(),
            index.by_sku_id.len(),
            index.by_title.len()
        );

        index
    }

    /// Поиск: сначала по skuId, затем по названию SKU
    pub fn resolve(&self, sku_id: Option<i64>, sku_title: Option<&str>) -> Option<&CatalogEntry> {
        sku_id
            .and_then(|id| self.by_sku_id.get(&id))
            .or_else(|| {
                sku_title
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .and_then(|t| self.by_title.get(t))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.by_sku_id.is_empty() && self.by_title.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn sku(sku_id: Option<i64>, title: Option<&str>) -> CatalogSku {
        CatalogSku {
            sku_id,
            full_title: title.map(str::to_string),
            sell_price: Some(120000),
            purchase_price: Some(70000),
            available_amount: Some(5),
        }
    }

    pub fn listing(product_id: i64, skus: Vec<CatalogSku>) -> CatalogListing {
        CatalogListing {
            product_id,
            title: format!("Product {}", product_id),
            description: "Gift".to_string(),
            images: vec![String::new(), format!("https://images.uzum.uz/{}.jpg", product_id)],
            characteristics: vec![
                CatalogCharacteristic {
                    title: "Color".to_string(),
                    value: "red".to_string(),
                },
                CatalogCharacteristic {
                    title: "Size".to_string(),
                    value: "L".to_string(),
                },
            ],
            skus,
        }
    }
}
