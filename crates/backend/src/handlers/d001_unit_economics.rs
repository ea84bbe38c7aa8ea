use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use contracts::dashboards::d001_unit_economics::{UnitEconomicsQuery, UnitEconomicsResponse};
use std::sync::Arc;

use crate::dashboards::d001_unit_economics::service;
use crate::system::initialization::AppContext;

/// GET /api/d001/unit_economics
pub async fn get_unit_economics(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<UnitEconomicsQuery>,
) -> Result<Json<UnitEconomicsResponse>, (StatusCode, String)> {
    let period = query
        .to_period()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    service::get_unit_economics(ctx.order_store.as_ref(), period)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to build unit economics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}
