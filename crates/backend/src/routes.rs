use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::system::initialization::AppContext;

/// Конфигурация всех роутов приложения
pub fn configure_routes(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // A001 Uzum order items
        .route(
            "/api/a001/orders",
            get(handlers::a001_uzum_order_item::list_orders),
        )
        .route(
            "/api/a001/orders/:id/cost",
            put(handlers::a001_uzum_order_item::update_cost),
        )
        // A002 Local products
        .route(
            "/api/a002/products",
            get(handlers::a002_local_product::list_products),
        )
        // U001 Sync from Uzum
        .route("/api/u001/sync", post(handlers::u001_sync_uzum::sync))
        // D001 Unit economics
        .route(
            "/api/d001/unit_economics",
            get(handlers::d001_unit_economics::get_unit_economics),
        )
        .with_state(ctx)
}
