use chrono::{NaiveDateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppResult, StorageContext};

// ============================================================================
// Customer Segment Repository
// ============================================================================

pub struct SegmentRepository;

impl SegmentRepository {
    pub async fn create(
        pool: &SqlitePool,
        name: &str,
        description: Option<&str>,
        criteria: &SegmentCriteria,
        customer_count: i64,
    ) -> AppResult<CustomerSegment> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, CustomerSegment>(
            r#"
            INSERT INTO customer_segments (
                id, name, description, criteria, customer_count,
                counted_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(Json(criteria.clone()))
        .bind(customer_count)
        .bind(now)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("Error creating segment")
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<CustomerSegment>> {
        sqlx::query_as::<_, CustomerSegment>("SELECT * FROM customer_segments WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Error fetching segment")
    }

    pub async fn list(pool: &SqlitePool) -> AppResult<Vec<CustomerSegment>> {
        sqlx::query_as::<_, CustomerSegment>(
            "SELECT * FROM customer_segments ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
        .context("Error fetching segments")
    }

    pub async fn update(
        pool: &SqlitePool,
        id: &str,
        name: &str,
        description: Option<&str>,
        criteria: &SegmentCriteria,
        customer_count: i64,
    ) -> AppResult<CustomerSegment> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, CustomerSegment>(
            r#"
            UPDATE customer_segments
            SET name = ?,
                description = ?,
                criteria = ?,
                customer_count = ?,
                counted_at = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(Json(criteria.clone()))
        .bind(customer_count)
        .bind(now)
        .bind(now)
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Error updating segment")
    }

    /// Store a freshly computed count without touching `updated_at`.
    pub async fn set_customer_count(
        pool: &SqlitePool,
        id: &str,
        customer_count: i64,
        counted_at: NaiveDateTime,
    ) -> AppResult<()> {
        sqlx::query("UPDATE customer_segments SET customer_count = ?, counted_at = ? WHERE id = ?")
            .bind(customer_count)
            .bind(counted_at)
            .bind(id)
            .execute(pool)
            .await
            .context("Error refreshing segment count")?;

        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM customer_segments WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Error deleting segment")?;

        Ok(result.rows_affected() > 0)
    }
}
