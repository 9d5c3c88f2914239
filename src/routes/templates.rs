use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::{
    CreateEmailTemplate, CreateSmsTemplate, EmailTemplate, SmsTemplate, UpdateEmailTemplate,
    UpdateSmsTemplate,
};
use crate::error::AppResult;
use crate::services::templates::TemplateService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/email", get(list_email).post(create_email))
        .route(
            "/email/:id",
            get(get_email).put(update_email).delete(delete_email),
        )
        .route("/sms", get(list_sms).post(create_sms))
        .route("/sms/:id", get(get_sms).put(update_sms).delete(delete_sms))
}

#[derive(Debug, Deserialize)]
pub struct ListTemplatesQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}

// ============================================================================
// Email
// ============================================================================

async fn list_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTemplatesQuery>,
) -> AppResult<Json<Vec<EmailTemplate>>> {
    let templates =
        TemplateService::list_email(&state.db, query.category.as_deref(), query.active_only)
            .await?;
    Ok(Json(templates))
}

async fn create_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateEmailTemplate>,
) -> AppResult<(StatusCode, Json<EmailTemplate>)> {
    let template = TemplateService::create_email(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

async fn get_email(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<EmailTemplate>> {
    Ok(Json(TemplateService::get_email(&state.db, &id).await?))
}

async fn update_email(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateEmailTemplate>,
) -> AppResult<Json<EmailTemplate>> {
    Ok(Json(TemplateService::update_email(&state.db, &id, body).await?))
}

async fn delete_email(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    TemplateService::delete_email(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// SMS
// ============================================================================

async fn list_sms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTemplatesQuery>,
) -> AppResult<Json<Vec<SmsTemplate>>> {
    let templates =
        TemplateService::list_sms(&state.db, query.category.as_deref(), query.active_only).await?;
    Ok(Json(templates))
}

async fn create_sms(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSmsTemplate>,
) -> AppResult<(StatusCode, Json<SmsTemplate>)> {
    let template = TemplateService::create_sms(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

async fn get_sms(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<SmsTemplate>> {
    Ok(Json(TemplateService::get_sms(&state.db, &id).await?))
}

async fn update_sms(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateSmsTemplate>,
) -> AppResult<Json<SmsTemplate>> {
    Ok(Json(TemplateService::update_sms(&state.db, &id, body).await?))
}

async fn delete_sms(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    TemplateService::delete_sms(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
