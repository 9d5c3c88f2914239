use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{
    Campaign, CampaignMetrics, CampaignRecipient, CampaignStatus, CampaignType, CreateCampaign,
    MarketingOverview, RecipientStatus, UpdateCampaign,
};
use crate::error::AppResult;
use crate::services::campaigns::{CampaignService, RecipientImport};
use crate::services::lifecycle::CampaignEvent;
use crate::services::metrics::Milestone;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_campaigns).post(create_campaign))
        .route(
            "/:id",
            get(get_campaign).put(update_campaign).delete(delete_campaign),
        )
        .route("/:id/schedule", post(schedule_campaign))
        .route("/:id/pause", post(pause_campaign))
        .route("/:id/resume", post(resume_campaign))
        .route("/:id/complete", post(complete_campaign))
        .route("/:id/recipients", get(list_recipients).post(add_recipients))
        .route("/:id/recipients/from-segment", post(add_segment_recipients))
        .route("/:id/metrics", get(get_metrics))
        .route("/:id/metrics/refresh", post(refresh_metrics))
}

/// Delivery webhooks report recipient milestones here.
pub fn recipients_router() -> Router<Arc<AppState>> {
    Router::new().route("/:id/events", post(record_recipient_event))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListCampaignsQuery {
    pub status: Option<CampaignStatus>,
    pub campaign_type: Option<CampaignType>,
}

#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    #[serde(flatten)]
    pub campaign: Campaign,
    /// Lifecycle events valid from the current status.
    pub allowed_events: &'static [&'static str],
}

impl From<Campaign> for CampaignResponse {
    fn from(campaign: Campaign) -> Self {
        let allowed_events = campaign.status.allowed_events();
        Self {
            campaign,
            allowed_events,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleRequest {
    /// Defaults to now.
    pub scheduled_at: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct ListRecipientsQuery {
    pub status: Option<RecipientStatus>,
}

#[derive(Debug, Deserialize)]
pub struct AddRecipientsRequest {
    pub customer_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecipientEventRequest {
    pub milestone: Milestone,
    pub error_message: Option<String>,
    pub occurred_at: Option<NaiveDateTime>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListCampaignsQuery>,
) -> AppResult<Json<Vec<CampaignResponse>>> {
    let campaigns = CampaignService::list(&state.db, query.status, query.campaign_type).await?;
    Ok(Json(campaigns.into_iter().map(Into::into).collect()))
}

async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCampaign>,
) -> AppResult<(StatusCode, Json<CampaignResponse>)> {
    let campaign = CampaignService::create(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(campaign.into())))
}

async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<CampaignResponse>> {
    Ok(Json(CampaignService::get(&state.db, &id).await?.into()))
}

async fn update_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCampaign>,
) -> AppResult<Json<CampaignResponse>> {
    Ok(Json(CampaignService::update(&state.db, &id, body).await?.into()))
}

async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    CampaignService::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn transition(
    state: &AppState,
    id: &str,
    event: CampaignEvent,
) -> AppResult<Json<CampaignResponse>> {
    Ok(Json(CampaignService::transition(&state.db, id, event).await?.into()))
}

async fn schedule_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<ScheduleRequest>>,
) -> AppResult<Json<CampaignResponse>> {
    let Json(body) = body.unwrap_or_default();
    let at = body.scheduled_at.unwrap_or_else(|| Utc::now().naive_utc());
    transition(&state, &id, CampaignEvent::Schedule { at }).await
}

async fn pause_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<CampaignResponse>> {
    transition(&state, &id, CampaignEvent::Pause).await
}

async fn resume_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<CampaignResponse>> {
    transition(&state, &id, CampaignEvent::Resume).await
}

async fn complete_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<CampaignResponse>> {
    transition(&state, &id, CampaignEvent::Complete).await
}

async fn list_recipients(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ListRecipientsQuery>,
) -> AppResult<Json<Vec<CampaignRecipient>>> {
    let recipients = CampaignService::list_recipients(&state.db, &id, query.status).await?;
    Ok(Json(recipients))
}

async fn add_recipients(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AddRecipientsRequest>,
) -> AppResult<Json<RecipientImport>> {
    let import = CampaignService::add_recipients(&state.db, &id, &body.customer_ids).await?;
    Ok(Json(import))
}

async fn add_segment_recipients(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<RecipientImport>> {
    Ok(Json(CampaignService::add_segment_recipients(&state.db, &id).await?))
}

/// Cached aggregate as last persisted.
async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<CampaignMetrics>> {
    let campaign = CampaignService::get(&state.db, &id).await?;
    Ok(Json(campaign.metrics.0))
}

async fn refresh_metrics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<CampaignMetrics>> {
    Ok(Json(
        CampaignService::recompute_campaign_metrics(&state.db, &id).await?,
    ))
}

async fn record_recipient_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RecipientEventRequest>,
) -> AppResult<Json<CampaignRecipient>> {
    let recipient = CampaignService::record_recipient_event(
        &state.db,
        &id,
        body.milestone,
        body.error_message,
        body.occurred_at,
    )
    .await?;
    Ok(Json(recipient))
}

pub async fn overview(State(state): State<Arc<AppState>>) -> AppResult<Json<MarketingOverview>> {
    Ok(Json(CampaignService::overview(&state.db).await?))
}
