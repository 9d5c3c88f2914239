use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::{CreateMarketingEvent, MarketingEvent, MarketingEventRepository};
use crate::error::{AppError, AppResult};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub customer_id: Option<String>,
    pub event_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventPage {
    pub events: Vec<MarketingEvent>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Append-only behavioral event log.
pub struct EventService;

impl EventService {
    pub async fn record(pool: &SqlitePool, event: CreateMarketingEvent) -> AppResult<MarketingEvent> {
        if event.customer_id.trim().is_empty() {
            return Err(AppError::Validation("customer_id is required".to_string()));
        }
        if event.event_type.trim().is_empty() {
            return Err(AppError::Validation("event_type is required".to_string()));
        }

        let recorded = MarketingEventRepository::create(pool, event).await?;
        tracing::debug!(
            "Recorded {} event for customer {}",
            recorded.event_type,
            recorded.customer_id
        );
        Ok(recorded)
    }

    pub async fn list(pool: &SqlitePool, query: EventQuery) -> AppResult<EventPage> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = query.offset.unwrap_or(0).max(0);
        let customer_id = query.customer_id.as_deref();
        let event_type = query.event_type.as_deref();

        let events =
            MarketingEventRepository::list(pool, customer_id, event_type, limit, offset).await?;
        let total = MarketingEventRepository::count(pool, customer_id, event_type).await?;

        Ok(EventPage {
            events,
            total,
            limit,
            offset,
        })
    }
}
