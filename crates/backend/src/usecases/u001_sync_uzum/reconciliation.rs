use contracts::domain::a001_uzum_order_item::aggregate::UzumOrderItem;
use contracts::domain::a002_local_product::aggregate::{LocalProduct, LocaleBundle};
use contracts::enums::ProductSource;
use contracts::shared::money::format_amount;
use std::collections::HashSet;

use super::catalog_index::{CatalogEntry, CatalogIndex};

/// Итог сверки строк заказов с локальным каталогом
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub products: Vec<LocalProduct>,
    pub created: usize,
    pub updated: usize,
    /// Строки без карточки в каталоге
    pub unmatched: usize,
}

impl ReconcileOutcome {
    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.updated > 0
    }
}

/// Сверить строки заказов с каталогом Uzum и локальными товарами.
///
/// Существующие товары только дополняются (skuId, uzumId, изображение),
/// для неизвестных SKU создаются новые товары. Повторный запуск
/// на результате предыдущего ничего не меняет.
pub fn reconcile(
    order_items: &[UzumOrderItem],
    index: &CatalogIndex,
    local_products: Vec<LocalProduct>,
) -> ReconcileOutcome {
    let mut products = local_products;
    let mut known_sku_ids = collect_known_sku_ids(&products);
    let mut created = 0;
    let mut updated = 0;
    let mut unmatched = 0;

    for item in order_items {
        let Some(entry) = index.resolve(item.sku_id, item.sku_title.as_deref()) else {
            tracing::debug!(
                "Order item {} has no catalog entry (skuId={:?}, skuTitle={:?})",
                item.id,
                item.sku_id,
                item.sku_title
            );
            unmatched += 1;
            continue;
        };

        let final_sku_id = item.sku_id.or(entry.sku.sku_id);
        let uzum_product_id =
            (entry.listing.product_id > 0).then(|| entry.listing.product_id.to_string());

        match find_existing(&products, final_sku_id, uzum_product_id.as_deref()) {
            Some(pos) => {
                let product = &mut products[pos];
                if enrich(
                    product,
                    final_sku_id,
                    uzum_product_id.as_deref(),
                    entry.listing.main_image(),
                ) {
                    tracing::debug!("Enriched local product {} from order item {}", product.id, item.id);
                    updated += 1;
                }
                if let Some(sku_id) = product.sku_id {
                    known_sku_ids.insert(sku_id);
                }
            }
            None => {
                let Some(sku_id) = final_sku_id else {
                    tracing::debug!("Order item {} resolved to a SKU without id, not creating", item.id);
                    continue;
                };
                if known_sku_ids.contains(&sku_id) {
                    tracing::debug!("SKU {} already known locally, not creating", sku_id);
                    continue;
                }

                let product = new_product(
                    LocalProduct::next_id(&products),
                    sku_id,
                    uzum_product_id,
                    entry,
                    item,
                );
                tracing::info!(
                    "Created local product {} for SKU {} ({}), price {}",
                    product.id,
                    sku_id,
                    product.ru.title,
                    format_amount(product.price)
                );
                known_sku_ids.insert(sku_id);
                products.push(product);
                created += 1;
            }
        }
    }

    ReconcileOutcome {
        products,
        created,
        updated,
        unmatched,
    }
}

/// Все skuId, известные каталогу: из поля skuId и из параметра skuId= в uzumUrl
fn collect_known_sku_ids(products: &[LocalProduct]) -> HashSet<i64> {
    products
        .iter()
        .flat_map(|p| p.sku_id.into_iter().chain(p.sku_id_from_url()))
        .collect()
}

/// Поиск существующего товара по убыванию надежности ключа:
/// skuId, затем uzumId, затем вхождение в uzumUrl
fn find_existing(
    products: &[LocalProduct],
    sku_id: Option<i64>,
    uzum_product_id: Option<&str>,
) -> Option<usize> {
    if let Some(sku_id) = sku_id {
        if let Some(pos) = products.iter().position(|p| p.sku_id == Some(sku_id)) {
            return Some(pos);
        }
    }

    if let Some(product_id) = uzum_product_id {
        if let Some(pos) = products
            .iter()
            .position(|p| p.uzum_id.as_deref().map(str::trim) == Some(product_id))
        {
            return Some(pos);
        }
    }

    // Старые записи заведены только со ссылкой на витрину.
    // Вхождение productId в ссылку - нестрогое совпадение, оставлено для них.
    products.iter().position(|p| {
        let Some(url) = p.uzum_url.as_deref() else {
            return false;
        };
        let by_sku = sku_id.is_some() && p.sku_id_from_url() == sku_id;
        let by_product = uzum_product_id.map(|id| url.contains(id)).unwrap_or(false);
        by_sku || by_product
    })
}

/// Дополнить товар недостающими данными. Ничего не перезаписывает.
fn enrich(
    product: &mut LocalProduct,
    sku_id: Option<i64>,
    uzum_product_id: Option<&str>,
    image: Option<&str>,
) -> bool {
    let mut changed = false;

    if product.sku_id.is_none() {
        if let Some(sku_id) = sku_id {
            product.sku_id = Some(sku_id);
            changed = true;
        }
    }

    if !product.has_uzum_id() {
        if let Some(product_id) = uzum_product_id {
            product.uzum_id = Some(product_id.to_string());
            changed = true;
        }
    }

    if product.has_missing_image() {
        if let Some(image) = image {
            product.image = image.to_string();
            changed = true;
        }
    }

    changed
}

fn new_product(
    id: i64,
    sku_id: i64,
    uzum_product_id: Option<String>,
    entry: &CatalogEntry,
    item: &UzumOrderItem,
) -> LocalProduct {
    let listing = &entry.listing;

    let title = if listing.title.trim().is_empty() {
        entry
            .sku
            .full_title
            .clone()
            .or_else(|| item.sku_title.clone())
            .unwrap_or_default()
    } else {
        listing.title.clone()
    };

    let bundle = LocaleBundle {
        title,
        description: listing.description.clone(),
        characteristics: listing.characteristics_line(),
    };

    LocalProduct {
        id,
        sku_id: Some(sku_id),
        uzum_id: uzum_product_id,
        uzum_url: None,
        price: entry.sku.sell_price.unwrap_or(item.sell_price),
        cost_price: entry.sku.purchase_price.unwrap_or(0),
        image: listing.main_image().unwrap_or_default().to_string(),
        gallery: listing
            .images
            .iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect(),
        source: ProductSource::Uzum,
        stock_quantity: entry.sku.available_amount.unwrap_or(0),
        uz: bundle.clone(),
        ru: bundle,
    }
}
