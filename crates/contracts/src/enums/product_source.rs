use serde::{Deserialize, Serialize};

/// Происхождение товара в локальном каталоге
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductSource {
    Uzum,
    Yandex,
    China,
    #[default]
    Direct,
}
