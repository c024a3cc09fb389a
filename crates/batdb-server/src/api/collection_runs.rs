//! `GET /api/v1/runs`: recent collection runs and their counters.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{map_db_error, normalize_limit, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct RunListParams {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RunItem {
    pub public_id: Uuid,
    pub source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub models_processed: i32,
    pub prices_updated: i32,
    pub prices_added: i32,
    pub variants_created: i32,
    pub errors: i32,
    pub skipped: i32,
    pub error_message: Option<String>,
}

pub(super) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<RunListParams>,
) -> impl IntoResponse {
    let limit = normalize_limit(params.limit);

    match batdb_db::list_collection_runs(&state.pool, limit).await {
        Ok(runs) => {
            let items: Vec<RunItem> = runs
                .into_iter()
                .map(|r| RunItem {
                    public_id: r.public_id,
                    source: r.source,
                    status: r.status,
                    started_at: r.started_at,
                    completed_at: r.completed_at,
                    models_processed: r.models_processed,
                    prices_updated: r.prices_updated,
                    prices_added: r.prices_added,
                    variants_created: r.variants_created,
                    errors: r.errors,
                    skipped: r.skipped,
                    error_message: r.error_message,
                })
                .collect();
            Ok(Json(ApiResponse {
                data: items,
                meta: ResponseMeta::new(req_id.0),
            }))
        }
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}
