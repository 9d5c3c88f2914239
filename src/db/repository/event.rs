use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppResult, StorageContext};

// ============================================================================
// Marketing Event Repository (append-only)
// ============================================================================

pub struct MarketingEventRepository;

impl MarketingEventRepository {
    pub async fn create(pool: &SqlitePool, event: CreateMarketingEvent) -> AppResult<MarketingEvent> {
        let id = Uuid::new_v4().to_string();
        let occurred_at = event.occurred_at.unwrap_or_else(|| Utc::now().naive_utc());

        sqlx::query_as::<_, MarketingEvent>(
            r#"
            INSERT INTO marketing_events (id, customer_id, event_type, event_data, occurred_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(event.customer_id)
        .bind(event.event_type)
        .bind(Json(event.event_data))
        .bind(occurred_at)
        .fetch_one(pool)
        .await
        .context("Error recording marketing event")
    }

    /// Most recent events first, with optional filters and pagination.
    pub async fn list(
        pool: &SqlitePool,
        customer_id: Option<&str>,
        event_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<MarketingEvent>> {
        sqlx::query_as::<_, MarketingEvent>(
            r#"
            SELECT * FROM marketing_events
            WHERE (? IS NULL OR customer_id = ?)
            AND (? IS NULL OR event_type = ?)
            ORDER BY occurred_at DESC
            LIMIT ?
            OFFSET ?
            "#,
        )
        .bind(customer_id)
        .bind(customer_id)
        .bind(event_type)
        .bind(event_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Error fetching marketing events")
    }

    pub async fn count(
        pool: &SqlitePool,
        customer_id: Option<&str>,
        event_type: Option<&str>,
    ) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM marketing_events
            WHERE (? IS NULL OR customer_id = ?)
            AND (? IS NULL OR event_type = ?)
            "#,
        )
        .bind(customer_id)
        .bind(customer_id)
        .bind(event_type)
        .bind(event_type)
        .fetch_one(pool)
        .await
        .context("Error counting marketing events")
    }
}
