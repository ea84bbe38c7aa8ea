use serde::{Deserialize, Serialize};

/// Статусы, при которых строка заказа не участвует в аналитике
pub const NEGATIVE_STATUSES: &[&str] = &["cancelled", "canceled", "returned", "return", "refunded"];

/// Строка финансового отчета Uzum Market (одна проданная позиция)
///
/// Хранится в a001_uzum_order_item, ключ дедупликации - `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UzumOrderItem {
    /// ID строки заказа в Uzum (уникален)
    pub id: i64,

    /// ID магазина продавца
    #[serde(rename = "shopId", default)]
    pub shop_id: Option<i64>,

    /// ID карточки товара в Uzum
    #[serde(rename = "productId", default)]
    pub product_id: Option<i64>,

    #[serde(rename = "skuId", default)]
    pub sku_id: Option<i64>,

    /// Название SKU (запасной ключ сопоставления, когда skuId нет)
    #[serde(rename = "skuTitle", default)]
    pub sku_title: Option<String>,

    /// Количество проданных единиц
    #[serde(default = "default_amount")]
    pub amount: i64,

    #[serde(rename = "sellPrice", default)]
    pub sell_price: i64,

    /// Сумма строки (sellPrice * amount, если маркетплейс не прислал итог)
    #[serde(rename = "totalPrice", default)]
    pub total_price: i64,

    #[serde(default)]
    pub commission: i64,

    #[serde(rename = "logisticDeliveryFee", default)]
    pub logistic_delivery_fee: i64,

    /// Выплата продавцу после удержаний
    #[serde(rename = "sellerProfit", default)]
    pub seller_profit: i64,

    /// Себестоимость, редактируется вручную (маркетплейс ее почти не присылает)
    #[serde(rename = "purchasePrice", default)]
    pub purchase_price: i64,

    #[serde(default)]
    pub status: Option<String>,

    /// Дата события, epoch ms
    pub date: i64,
}

fn default_amount() -> i64 {
    1
}

impl UzumOrderItem {
    /// Отмененная или возвращенная позиция
    pub fn is_cancelled(&self) -> bool {
        match &self.status {
            Some(status) => {
                let status = status.trim().to_lowercase();
                NEGATIVE_STATUSES.contains(&status.as_str())
            }
            None => false,
        }
    }

    /// Выплата: sellerProfit, если он есть, иначе выручка минус удержания
    pub fn payout(&self) -> i64 {
        if self.seller_profit != 0 {
            self.seller_profit
        } else {
            self.total_price - self.commission - self.logistic_delivery_fee
        }
    }
}

/// Тело запроса на ручную корректировку себестоимости
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCostRequest {
    #[serde(rename = "purchasePrice")]
    pub purchase_price: i64,
}
