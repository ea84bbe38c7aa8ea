use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use contracts::usecases::u001_sync_uzum::{SyncErrorKind, SyncRequest, SyncResponse};
use std::sync::Arc;

use crate::system::initialization::AppContext;

/// Пустое тело означает период по умолчанию (последние 30 дней).
/// Любое непустое тело обязано быть корректным SyncRequest.
fn parse_sync_request(body: &[u8]) -> Result<SyncRequest, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SyncRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| format!("Invalid sync request body: {}", e))
}

/// Запуск синхронизации
pub async fn sync(
    State(ctx): State<Arc<AppContext>>,
    body: Bytes,
) -> (StatusCode, Json<SyncResponse>) {
    match parse_sync_request(&body) {
        Ok(request) => (StatusCode::OK, Json(ctx.sync_executor.sync(request).await)),
        Err(e) => {
            tracing::warn!("Rejected sync request: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(SyncResponse::failed(SyncErrorKind::InvalidRequest, e)),
            )
        }
    }
}
