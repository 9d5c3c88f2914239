use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppResult, StorageContext};

// ============================================================================
// Marketing Automation Repository
// ============================================================================

pub struct AutomationRepository;

impl AutomationRepository {
    pub async fn create(
        pool: &SqlitePool,
        automation: CreateAutomation,
    ) -> AppResult<MarketingAutomation> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, MarketingAutomation>(
            r#"
            INSERT INTO marketing_automations (
                id, name, description, trigger_type, trigger_config, campaign_type,
                email_template_id, sms_template_id, delay_hours, is_active,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(automation.name)
        .bind(automation.description)
        .bind(automation.trigger_type)
        .bind(Json(automation.trigger_config))
        .bind(automation.campaign_type)
        .bind(automation.email_template_id)
        .bind(automation.sms_template_id)
        .bind(automation.delay_hours)
        .bind(automation.is_active.unwrap_or(true))
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("Error creating automation")
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<MarketingAutomation>> {
        sqlx::query_as::<_, MarketingAutomation>("SELECT * FROM marketing_automations WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Error fetching automation")
    }

    pub async fn list(pool: &SqlitePool, active_only: bool) -> AppResult<Vec<MarketingAutomation>> {
        sqlx::query_as::<_, MarketingAutomation>(
            r#"
            SELECT * FROM marketing_automations
            WHERE (? = 0 OR is_active = 1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(active_only)
        .fetch_all(pool)
        .await
        .context("Error fetching automations")
    }

    pub async fn update(
        pool: &SqlitePool,
        current: MarketingAutomation,
        update: UpdateAutomation,
    ) -> AppResult<MarketingAutomation> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, MarketingAutomation>(
            r#"
            UPDATE marketing_automations
            SET name = ?,
                description = ?,
                trigger_type = ?,
                trigger_config = ?,
                email_template_id = ?,
                sms_template_id = ?,
                delay_hours = ?,
                is_active = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(update.name.unwrap_or(current.name))
        .bind(update.description.unwrap_or(current.description))
        .bind(update.trigger_type.unwrap_or(current.trigger_type))
        .bind(Json(update.trigger_config.unwrap_or(current.trigger_config.0)))
        .bind(update.email_template_id.or(current.email_template_id))
        .bind(update.sms_template_id.or(current.sms_template_id))
        .bind(update.delay_hours.unwrap_or(current.delay_hours))
        .bind(update.is_active.unwrap_or(current.is_active))
        .bind(now)
        .bind(current.id)
        .fetch_one(pool)
        .await
        .context("Error updating automation")
    }

    pub async fn set_active(
        pool: &SqlitePool,
        id: &str,
        is_active: bool,
    ) -> AppResult<Option<MarketingAutomation>> {
        sqlx::query_as::<_, MarketingAutomation>(
            r#"
            UPDATE marketing_automations
            SET is_active = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(is_active)
        .bind(Utc::now().naive_utc())
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Error toggling automation")
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM marketing_automations WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Error deleting automation")?;

        Ok(result.rows_affected() > 0)
    }
}
