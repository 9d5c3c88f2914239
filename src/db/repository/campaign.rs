use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use sqlx::types::Json;
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppResult, StorageContext};

// ============================================================================
// Campaign Repository
// ============================================================================

/// Fully resolved values for a new campaign row.
pub struct NewCampaign<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub campaign_type: CampaignType,
    pub segment_id: Option<&'a str>,
    pub audience_count: i64,
    pub email_template_id: Option<&'a str>,
    pub sms_template_id: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub content: &'a str,
}

pub struct CampaignRepository;

impl CampaignRepository {
    pub async fn create(pool: &SqlitePool, campaign: NewCampaign<'_>) -> AppResult<Campaign> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO marketing_campaigns (
                id, name, description, campaign_type, status,
                segment_id, audience_count, email_template_id, sms_template_id,
                subject, content, metrics, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(campaign.name)
        .bind(campaign.description)
        .bind(campaign.campaign_type)
        .bind(CampaignStatus::Draft)
        .bind(campaign.segment_id)
        .bind(campaign.audience_count)
        .bind(campaign.email_template_id)
        .bind(campaign.sms_template_id)
        .bind(campaign.subject)
        .bind(campaign.content)
        .bind(Json(CampaignMetrics::default()))
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("Error creating campaign")
    }

    pub async fn find_by_id<'e, E>(executor: E, id: &str) -> AppResult<Option<Campaign>>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Campaign>("SELECT * FROM marketing_campaigns WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
            .context("Error fetching campaign")
    }

    pub async fn list(
        pool: &SqlitePool,
        status: Option<CampaignStatus>,
        campaign_type: Option<CampaignType>,
    ) -> AppResult<Vec<Campaign>> {
        sqlx::query_as::<_, Campaign>(
            r#"
            SELECT * FROM marketing_campaigns
            WHERE (? IS NULL OR status = ?)
            AND (? IS NULL OR campaign_type = ?)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .bind(status)
        .bind(campaign_type)
        .bind(campaign_type)
        .fetch_all(pool)
        .await
        .context("Error fetching campaigns")
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_details(
        pool: &SqlitePool,
        id: &str,
        name: &str,
        description: Option<&str>,
        segment_id: Option<&str>,
        audience_count: i64,
        subject: Option<&str>,
        content: &str,
    ) -> AppResult<Campaign> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE marketing_campaigns
            SET name = ?,
                description = ?,
                segment_id = ?,
                audience_count = ?,
                subject = ?,
                content = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(segment_id)
        .bind(audience_count)
        .bind(subject)
        .bind(content)
        .bind(now)
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Error updating campaign")
    }

    /// Move a campaign from `expected` to `next` in one statement.
    ///
    /// Returns `None` when the row is no longer in `expected` (another
    /// writer got there first). Timestamps are only overwritten when given.
    pub async fn transition(
        pool: &SqlitePool,
        id: &str,
        expected: CampaignStatus,
        next: CampaignStatus,
        scheduled_at: Option<NaiveDateTime>,
        completed_at: Option<NaiveDateTime>,
    ) -> AppResult<Option<Campaign>> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE marketing_campaigns
            SET status = ?,
                scheduled_at = COALESCE(?, scheduled_at),
                completed_at = COALESCE(?, completed_at),
                updated_at = ?
            WHERE id = ? AND status = ?
            RETURNING *
            "#,
        )
        .bind(next)
        .bind(scheduled_at)
        .bind(completed_at)
        .bind(now)
        .bind(id)
        .bind(expected)
        .fetch_optional(pool)
        .await
        .context("Error updating campaign status")
    }

    pub async fn update_metrics<'e, E>(
        executor: E,
        id: &str,
        metrics: &CampaignMetrics,
        audience_count: i64,
    ) -> AppResult<()>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query(
            r#"
            UPDATE marketing_campaigns
            SET metrics = ?, audience_count = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Json(metrics.clone()))
        .bind(audience_count)
        .bind(Utc::now().naive_utc())
        .bind(id)
        .execute(executor)
        .await
        .context("Error updating campaign metrics")?;

        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM marketing_campaigns WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Error deleting campaign")?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts grouped by status
    pub async fn counts_by_status(pool: &SqlitePool) -> AppResult<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM marketing_campaigns GROUP BY status",
        )
        .fetch_all(pool)
        .await
        .context("Error counting campaigns")?;

        Ok(rows.into_iter().collect())
    }

    /// Cached metrics of every campaign, for cross-campaign totals.
    pub async fn all_metrics(pool: &SqlitePool) -> AppResult<Vec<CampaignMetrics>> {
        let rows: Vec<(Json<CampaignMetrics>,)> =
            sqlx::query_as("SELECT metrics FROM marketing_campaigns")
                .fetch_all(pool)
                .await
                .context("Error fetching campaign metrics")?;

        Ok(rows.into_iter().map(|(m,)| m.0).collect())
    }
}
