use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::{CreateAutomation, MarketingAutomation, UpdateAutomation};
use crate::error::AppResult;
use crate::services::automations::AutomationService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_automations).post(create_automation))
        .route(
            "/:id",
            get(get_automation)
                .put(update_automation)
                .delete(delete_automation),
        )
        .route("/:id/toggle", post(toggle_automation))
}

#[derive(Debug, Deserialize)]
pub struct ListAutomationsQuery {
    #[serde(default)]
    pub active_only: bool,
}

async fn list_automations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAutomationsQuery>,
) -> AppResult<Json<Vec<MarketingAutomation>>> {
    Ok(Json(AutomationService::list(&state.db, query.active_only).await?))
}

async fn create_automation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAutomation>,
) -> AppResult<(StatusCode, Json<MarketingAutomation>)> {
    let automation = AutomationService::create(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(automation)))
}

async fn get_automation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<MarketingAutomation>> {
    Ok(Json(AutomationService::get(&state.db, &id).await?))
}

async fn update_automation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateAutomation>,
) -> AppResult<Json<MarketingAutomation>> {
    Ok(Json(AutomationService::update(&state.db, &id, body).await?))
}

async fn toggle_automation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<MarketingAutomation>> {
    Ok(Json(AutomationService::toggle(&state.db, &id).await?))
}

async fn delete_automation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    AutomationService::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
