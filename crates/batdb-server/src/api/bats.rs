//! `GET /api/v1/bats`: every tracked model with variants and prices nested.

use axum::{extract::State, response::IntoResponse, Extension, Json};

use crate::api::{map_db_error, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

pub(super) async fn list_bats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match batdb_db::list_models_with_prices(&state.pool).await {
        Ok(models) => Ok(Json(ApiResponse {
            data: models,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}
