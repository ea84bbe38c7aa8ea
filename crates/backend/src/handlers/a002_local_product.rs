use axum::{extract::State, http::StatusCode, Json};
use contracts::domain::a002_local_product::aggregate::LocalProduct;
use std::sync::Arc;

use crate::system::initialization::AppContext;

pub async fn list_products(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<LocalProduct>>, StatusCode> {
    ctx.product_store.get().await.map(Json).map_err(|e| {
        tracing::error!("Failed to list local products: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
