use serde::{Deserialize, Serialize};

/// Запрос на синхронизацию финансовых заказов Uzum
///
/// Границы периода в epoch ms; если не заданы - последние 30 дней.
/// Неизвестные поля отклоняются, чтобы опечатка не превращалась в период по умолчанию.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncRequest {
    #[serde(rename = "dateFrom", default)]
    pub date_from: Option<i64>,

    #[serde(rename = "dateTo", default)]
    pub date_to: Option<i64>,
}
