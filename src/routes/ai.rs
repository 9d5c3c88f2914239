use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::services::ai_content::GeneratedEmail;
use crate::AppState;

/// Content generation endpoints. Nothing generated here is stored; the
/// caller decides whether to save it as a template.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/email", post(generate_email))
        .route("/sms", post(generate_sms))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedSms {
    pub content: String,
}

async fn generate_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateRequest>,
) -> AppResult<Json<GeneratedEmail>> {
    Ok(Json(state.ai.generate_email(&body.prompt).await?))
}

async fn generate_sms(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateRequest>,
) -> AppResult<Json<GeneratedSms>> {
    let content = state.ai.generate_sms(&body.prompt).await?;
    Ok(Json(GeneratedSms { content }))
}
