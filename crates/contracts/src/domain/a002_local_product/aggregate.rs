use crate::enums::ProductSource;
use crate::shared::money::deserialize_amount;
use serde::{Deserialize, Serialize};

/// Заглушка изображения, которую синхронизация вправе заменить
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Локализованное описание товара (uz / ru)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocaleBundle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Характеристики в виде "название: значение; ..."
    #[serde(default)]
    pub characteristics: String,
}

/// Товар собственного каталога магазина
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalProduct {
    /// Локальный автоинкрементный ID
    pub id: i64,

    #[serde(rename = "skuId", default)]
    pub sku_id: Option<i64>,

    /// ID карточки в Uzum (строкой, как приходит из админки)
    #[serde(rename = "uzumId", default)]
    pub uzum_id: Option<String>,

    /// Ссылка на витрину Uzum, у старых записей единственный источник skuId
    #[serde(rename = "uzumUrl", default)]
    pub uzum_url: Option<String>,

    #[serde(default, deserialize_with = "deserialize_amount")]
    pub price: i64,

    #[serde(rename = "costPrice", default, deserialize_with = "deserialize_amount")]
    pub cost_price: i64,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub gallery: Vec<String>,

    #[serde(default)]
    pub source: ProductSource,

    #[serde(rename = "stockQuantity", default)]
    pub stock_quantity: i64,

    #[serde(default)]
    pub uz: LocaleBundle,

    #[serde(default)]
    pub ru: LocaleBundle,
}

impl LocalProduct {
    /// Изображение отсутствует или стоит заглушка
    pub fn has_missing_image(&self) -> bool {
        let image = self.image.trim();
        image.is_empty() || image == PLACEHOLDER_IMAGE
    }

    /// uzumId заполнен непустым значением
    pub fn has_uzum_id(&self) -> bool {
        self.uzum_id
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }

    /// Извлекает skuId из параметра `skuId=` в uzumUrl
    pub fn sku_id_from_url(&self) -> Option<i64> {
        let url = self.uzum_url.as_deref()?;
        let start = url.find("skuId=")? + "skuId=".len();
        let digits: String = url[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    /// Следующий свободный ID: max + 1, для пустого каталога 1
    pub fn next_id(products: &[LocalProduct]) -> i64 {
        products.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }
}
