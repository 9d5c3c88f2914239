use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::db::{CreateMarketingEvent, MarketingEvent};
use crate::error::AppResult;
use crate::services::events::{EventPage, EventQuery, EventService};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_events).post(record_event))
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventQuery>,
) -> AppResult<Json<EventPage>> {
    Ok(Json(EventService::list(&state.db, query).await?))
}

async fn record_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMarketingEvent>,
) -> AppResult<(StatusCode, Json<MarketingEvent>)> {
    let event = EventService::record(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(event)))
}
