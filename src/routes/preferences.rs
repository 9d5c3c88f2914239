use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::db::{CommunicationPreferences, UpdateCommunicationPreferences};
use crate::error::AppResult;
use crate::services::preferences::PreferencesService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:customer_id", get(get_preferences).put(update_preferences))
}

async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> AppResult<Json<CommunicationPreferences>> {
    Ok(Json(PreferencesService::get(&state.db, &customer_id).await?))
}

async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
    Json(body): Json<UpdateCommunicationPreferences>,
) -> AppResult<Json<CommunicationPreferences>> {
    Ok(Json(
        PreferencesService::update(&state.db, &customer_id, body).await?,
    ))
}
