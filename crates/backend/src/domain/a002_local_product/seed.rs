use anyhow::Result;
use contracts::domain::a002_local_product::aggregate::LocalProduct;

const SEED_PRODUCTS: &str = include_str!("seed_products.json");

/// Стартовый каталог, которым заполняется пустое хранилище
pub fn default_products() -> Result<Vec<LocalProduct>> {
    let products: Vec<LocalProduct> = serde_json::from_str(SEED_PRODUCTS)?;
    Ok(products)
}
