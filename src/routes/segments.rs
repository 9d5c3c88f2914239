use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::{CreateSegment, Customer, CustomerSegment, SegmentCriteria, UpdateSegment};
use crate::error::AppResult;
use crate::services::segments::SegmentService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_segments).post(create_segment))
        .route("/preview", post(preview_segment))
        .route(
            "/:id",
            get(get_segment).put(update_segment).delete(delete_segment),
        )
        .route("/:id/customers", get(segment_customers))
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub customer_count: i64,
}

async fn list_segments(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<CustomerSegment>>> {
    Ok(Json(SegmentService::list(&state.db).await?))
}

async fn create_segment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSegment>,
) -> AppResult<(StatusCode, Json<CustomerSegment>)> {
    let segment = SegmentService::create(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(segment)))
}

/// Count the audience for unsaved criteria.
async fn preview_segment(
    State(state): State<Arc<AppState>>,
    Json(criteria): Json<SegmentCriteria>,
) -> AppResult<Json<PreviewResponse>> {
    let customer_count = SegmentService::preview(&state.db, &criteria).await?;
    Ok(Json(PreviewResponse { customer_count }))
}

async fn get_segment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<CustomerSegment>> {
    Ok(Json(SegmentService::get(&state.db, &id).await?))
}

async fn update_segment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateSegment>,
) -> AppResult<Json<CustomerSegment>> {
    Ok(Json(SegmentService::update(&state.db, &id, body).await?))
}

async fn delete_segment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    SegmentService::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn segment_customers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Customer>>> {
    Ok(Json(SegmentService::customers(&state.db, &id).await?))
}
