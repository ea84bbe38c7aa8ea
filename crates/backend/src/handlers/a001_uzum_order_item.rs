use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use contracts::domain::a001_uzum_order_item::aggregate::{UpdateCostRequest, UzumOrderItem};
use std::sync::Arc;

use crate::system::initialization::AppContext;

/// Handler для получения списка строк заказов Uzum (новые сначала)
pub async fn list_orders(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<UzumOrderItem>>, StatusCode> {
    let mut items = ctx.order_store.get().await.map_err(|e| {
        tracing::error!("Failed to list Uzum order items: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    items.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(Json(items))
}

/// Ручная корректировка себестоимости одной строки заказа
pub async fn update_cost(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCostRequest>,
) -> Result<Json<UzumOrderItem>, StatusCode> {
    if request.purchase_price < 0 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let updated = ctx
        .order_store
        .update_cost(id, request.purchase_price)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update cost for order item {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    match updated {
        Some(item) => {
            tracing::info!("Order item {} cost set to {}", id, item.purchase_price);
            Ok(Json(item))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}
