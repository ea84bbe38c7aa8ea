use serde::{Deserialize, Serialize};

/// Причина неудачной синхронизации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    /// Не удалось получить список магазинов (авторизация)
    ShopLookup,
    /// У аккаунта нет ни одного магазина
    NoShops,
    /// Не удалось получить финансовые заказы
    FinanceFetch,
    /// Ошибка записи в хранилище
    Storage,
    /// Начало периода позже конца
    InvalidRange,
    /// Тело запроса не разобрано
    InvalidRequest,
}

/// Итог синхронизации для оператора
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,

    #[serde(rename = "syncedCount", skip_serializing_if = "Option::is_none")]
    pub synced_count: Option<usize>,

    #[serde(rename = "totalStored", skip_serializing_if = "Option::is_none")]
    pub total_stored: Option<usize>,

    #[serde(rename = "productsCreated", skip_serializing_if = "Option::is_none")]
    pub products_created: Option<usize>,

    #[serde(rename = "productsUpdated", skip_serializing_if = "Option::is_none")]
    pub products_updated: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(rename = "errorKind", skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<SyncErrorKind>,
}

impl SyncResponse {
    pub fn completed(
        synced_count: usize,
        total_stored: usize,
        products_created: usize,
        products_updated: usize,
        message: String,
    ) -> Self {
        Self {
            success: true,
            synced_count: Some(synced_count),
            total_stored: Some(total_stored),
            products_created: Some(products_created),
            products_updated: Some(products_updated),
            message: Some(message),
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(kind: SyncErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            synced_count: None,
            total_stored: None,
            products_created: None,
            products_updated: None,
            message: None,
            error: Some(error.into()),
            error_kind: Some(kind),
        }
    }
}
