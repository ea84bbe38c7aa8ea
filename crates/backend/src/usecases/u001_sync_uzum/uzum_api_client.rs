use async_trait::async_trait;
use contracts::domain::a001_uzum_order_item::aggregate::UzumOrderItem;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog_index::{CatalogCharacteristic, CatalogListing, CatalogSku};
use crate::shared::config::UzumConfig;

/// Защита от бесконечной пагинации
const MAX_PAGES: u32 = 1000;

/// Ошибки Uzum Seller API
#[derive(Debug, Error)]
pub enum UzumApiError {
    #[error("Uzum API request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Uzum API request timed out")]
    Timeout,

    #[error("Uzum API transport error: {0}")]
    Transport(String),

    #[error("Failed to parse Uzum API JSON: {0}")]
    Decode(String),

    #[error("Uzum API is not configured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for UzumApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UzumApiError::Timeout
        } else if e.is_decode() {
            UzumApiError::Decode(e.to_string())
        } else {
            UzumApiError::Transport(e.to_string())
        }
    }
}

/// Поставщик данных маркетплейса (магазины, финансовые заказы, каталог)
#[async_trait]
pub trait UzumApi: Send + Sync {
    async fn list_shops(&self) -> Result<Vec<UzumShop>, UzumApiError>;

    async fn list_financial_orders(
        &self,
        shop_ids: &[i64],
        date_from: i64,
        date_to: i64,
    ) -> Result<Vec<UzumOrderItem>, UzumApiError>;

    async fn list_shop_products(&self, shop_id: i64) -> Result<Vec<CatalogListing>, UzumApiError>;
}

/// HTTP-клиент для работы с Uzum Market Seller API
pub struct UzumApiClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    page_size: u32,
}

impl UzumApiClient {
    pub fn new(config: &UzumConfig) -> Result<Self, UzumApiError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UzumApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            page_size: config.page_size.max(1),
        })
    }

    async fn get_json<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, UzumApiError> {
        if self.api_token.trim().is_empty() {
            return Err(UzumApiError::Config(
                "API token is required for Uzum Seller API".to_string(),
            ));
        }

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Uzum API request {} failed: {} {}", path, status, body);
            return Err(UzumApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| {
            let preview: String = body.chars().take(500).collect();
            tracing::error!("Failed to parse Uzum API response from {}: {}", path, e);
            UzumApiError::Decode(format!("{}. Response: {}", e, preview))
        })
    }
}

#[async_trait]
impl UzumApi for UzumApiClient {
    /// GET /v1/shops
    async fn list_shops(&self) -> Result<Vec<UzumShop>, UzumApiError> {
        let shops: Vec<UzumShop> = self.get_json("/v1/shops", &[] as &[(&str, &str)]).await?;
        tracing::info!("Uzum API returned {} shops", shops.len());
        Ok(shops)
    }

    /// GET /v1/finance/orders (постранично)
    async fn list_financial_orders(
        &self,
        shop_ids: &[i64],
        date_from: i64,
        date_to: i64,
    ) -> Result<Vec<UzumOrderItem>, UzumApiError> {
        let mut items = Vec::new();

        for page in 0..MAX_PAGES {
            let mut query: Vec<(&str, String)> = shop_ids
                .iter()
                .map(|id| ("shopIds", id.to_string()))
                .collect();
            query.push(("dateFrom", date_from.to_string()));
            query.push(("dateTo", date_to.to_string()));
            query.push(("group", "false".to_string()));
            query.push(("page", page.to_string()));
            query.push(("size", self.page_size.to_string()));

            let response: RawFinanceOrdersResponse =
                self.get_json("/v1/finance/orders", &query).await?;
            let batch_size = response.order_items.len();
            tracing::info!("Finance orders page {}: {} items", page, batch_size);

            items.extend(response.order_items.into_iter().map(RawOrderItem::normalize));

            if batch_size < self.page_size as usize {
                break;
            }
        }

        Ok(items)
    }

    /// GET /v1/product/shop/{shopId} (постранично)
    async fn list_shop_products(&self, shop_id: i64) -> Result<Vec<CatalogListing>, UzumApiError> {
        let path = format!("/v1/product/shop/{}", shop_id);
        let mut listings = Vec::new();

        for page in 0..MAX_PAGES {
            let query = [("page", page.to_string()), ("size", self.page_size.to_string())];
            let response: RawProductListResponse = self.get_json(&path, &query).await?;
            let batch_size = response.product_list.len();
            tracing::info!("Shop {} products page {}: {} listings", shop_id, page, batch_size);

            listings.extend(response.product_list.into_iter().map(RawListing::normalize));

            if batch_size < self.page_size as usize {
                break;
            }
        }

        Ok(listings)
    }
}

// ============================================================================
// Wire models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UzumShop {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFinanceOrdersResponse {
    #[serde(rename = "orderItems", default)]
    order_items: Vec<RawOrderItem>,
}

#[derive(Debug, Deserialize)]
struct RawOrderItem {
    id: i64,
    #[serde(rename = "shopId", default)]
    shop_id: Option<i64>,
    #[serde(rename = "productId", default)]
    product_id: Option<i64>,
    #[serde(rename = "skuId", default)]
    sku_id: Option<i64>,
    #[serde(rename = "skuTitle", default)]
    sku_title: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(rename = "sellPrice", default)]
    sell_price: Option<f64>,
    #[serde(rename = "totalPrice", default)]
    total_price: Option<f64>,
    #[serde(default)]
    commission: Option<f64>,
    #[serde(rename = "logisticDeliveryFee", default)]
    logistic_delivery_fee: Option<f64>,
    #[serde(rename = "sellerProfit", default)]
    seller_profit: Option<f64>,
    #[serde(rename = "purchasePrice", default)]
    purchase_price: Option<f64>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    date: Option<i64>,
}

fn whole(value: Option<f64>) -> i64 {
    value.map(|v| v.round() as i64).unwrap_or(0)
}

impl RawOrderItem {
    fn normalize(self) -> UzumOrderItem {
        let amount = self.amount.filter(|a| *a > 0).unwrap_or(1);
        let sell_price = whole(self.sell_price);
        let total_price = match self.total_price {
            Some(total) => total.round() as i64,
            None => sell_price * amount,
        };

        UzumOrderItem {
            id: self.id,
            shop_id: self.shop_id,
            product_id: self.product_id,
            sku_id: self.sku_id,
            sku_title: self.sku_title,
            amount,
            sell_price,
            total_price,
            commission: whole(self.commission),
            logistic_delivery_fee: whole(self.logistic_delivery_fee),
            seller_profit: whole(self.seller_profit),
            purchase_price: whole(self.purchase_price),
            status: self.status,
            date: self.date.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProductListResponse {
    #[serde(rename = "productList", default)]
    product_list: Vec<RawListing>,
}

/// Карточка в том виде, как ее отдает API: одни и те же данные
/// встречаются под разными именами полей
#[derive(Debug, Default, Deserialize)]
struct RawListing {
    #[serde(rename = "productId", default)]
    product_id: Option<i64>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(rename = "previewImg", default)]
    preview_img: Option<String>,
    #[serde(default)]
    photo: Option<String>,
    #[serde(default)]
    photos: Option<Vec<String>>,
    #[serde(default)]
    characteristics: Option<Vec<RawCharacteristic>>,
    #[serde(rename = "skuList", default)]
    sku_list: Option<Vec<RawSku>>,
    #[serde(default)]
    skus: Option<Vec<RawSku>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSku {
    #[serde(rename = "skuId", default)]
    sku_id: Option<i64>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(rename = "skuFullTitle", default)]
    sku_full_title: Option<String>,
    #[serde(rename = "fullTitle", default)]
    full_title: Option<String>,
    #[serde(rename = "skuTitle", default)]
    sku_title: Option<String>,
    #[serde(rename = "sellPrice", default)]
    sell_price: Option<f64>,
    #[serde(rename = "purchasePrice", default)]
    purchase_price: Option<f64>,
    #[serde(rename = "availableAmount", default)]
    available_amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawCharacteristic {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

/// Первая непустая строка среди кандидатов
fn first_non_empty(candidates: &[Option<&String>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl RawSku {
    fn normalize(self) -> CatalogSku {
        CatalogSku {
            sku_id: self.sku_id.or(self.id),
            full_title: first_non_empty(&[
                self.sku_full_title.as_ref(),
                self.full_title.as_ref(),
                self.sku_title.as_ref(),
            ]),
            sell_price: self.sell_price.map(|v| v.round() as i64),
            purchase_price: self.purchase_price.map(|v| v.round() as i64),
            available_amount: self.available_amount,
        }
    }
}

impl RawListing {
    fn normalize(self) -> CatalogListing {
        let skus = match (self.sku_list, self.skus) {
            (Some(list), _) if !list.is_empty() => list,
            (_, Some(list)) => list,
            (Some(list), None) => list,
            (None, None) => Vec::new(),
        };

        let mut images: Vec<String> = [
            self.image.as_ref(),
            self.preview_img.as_ref(),
            self.photo.as_ref(),
        ]
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
        for photo in self.photos.unwrap_or_default() {
            let photo = photo.trim().to_string();
            if !photo.is_empty() && !images.contains(&photo) {
                images.push(photo);
            }
        }

        let characteristics = self
            .characteristics
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| {
                let title = c.title?.trim().to_string();
                let value = c.value.as_ref().map(value_to_text).unwrap_or_default();
                if title.is_empty() || value.is_empty() {
                    None
                } else {
                    Some(CatalogCharacteristic { title, value })
                }
            })
            .collect();

        CatalogListing {
            product_id: self.product_id.or(self.id).unwrap_or(0),
            title: first_non_empty(&[self.title.as_ref(), self.name.as_ref()]).unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            images,
            characteristics,
            skus: skus.into_iter().map(RawSku::normalize).collect(),
        }
    }
}
