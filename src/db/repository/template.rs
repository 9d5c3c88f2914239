use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppResult, StorageContext};

// ============================================================================
// Email Template Repository
// ============================================================================

pub struct EmailTemplateRepository;

impl EmailTemplateRepository {
    pub async fn create(pool: &SqlitePool, template: CreateEmailTemplate) -> AppResult<EmailTemplate> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, EmailTemplate>(
            r#"
            INSERT INTO email_templates (
                id, name, subject, content, plain_text,
                category, tags, is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(template.name)
        .bind(template.subject)
        .bind(template.content)
        .bind(template.plain_text)
        .bind(template.category.unwrap_or_else(|| "general".to_string()))
        .bind(Json(template.tags))
        .bind(template.is_active.unwrap_or(true))
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("Error creating email template")
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<EmailTemplate>> {
        sqlx::query_as::<_, EmailTemplate>("SELECT * FROM email_templates WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Error fetching email template")
    }

    pub async fn list(
        pool: &SqlitePool,
        category: Option<&str>,
        active_only: bool,
    ) -> AppResult<Vec<EmailTemplate>> {
        sqlx::query_as::<_, EmailTemplate>(
            r#"
            SELECT * FROM email_templates
            WHERE (? IS NULL OR category = ?)
            AND (? = 0 OR is_active = 1)
            ORDER BY name
            "#,
        )
        .bind(category)
        .bind(category)
        .bind(active_only)
        .fetch_all(pool)
        .await
        .context("Error fetching email templates")
    }

    pub async fn update(
        pool: &SqlitePool,
        current: EmailTemplate,
        update: UpdateEmailTemplate,
    ) -> AppResult<EmailTemplate> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, EmailTemplate>(
            r#"
            UPDATE email_templates
            SET name = ?,
                subject = ?,
                content = ?,
                plain_text = ?,
                category = ?,
                tags = ?,
                is_active = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(update.name.unwrap_or(current.name))
        .bind(update.subject.unwrap_or(current.subject))
        .bind(update.content.unwrap_or(current.content))
        .bind(update.plain_text.or(current.plain_text))
        .bind(update.category.unwrap_or(current.category))
        .bind(Json(update.tags.unwrap_or(current.tags.0)))
        .bind(update.is_active.unwrap_or(current.is_active))
        .bind(now)
        .bind(current.id)
        .fetch_one(pool)
        .await
        .context("Error updating email template")
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM email_templates WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Error deleting email template")?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// SMS Template Repository
// ============================================================================

pub struct SmsTemplateRepository;

impl SmsTemplateRepository {
    pub async fn create(pool: &SqlitePool, template: CreateSmsTemplate) -> AppResult<SmsTemplate> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, SmsTemplate>(
            r#"
            INSERT INTO sms_templates (
                id, name, content, category, tags, is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(template.name)
        .bind(template.content)
        .bind(template.category.unwrap_or_else(|| "general".to_string()))
        .bind(Json(template.tags))
        .bind(template.is_active.unwrap_or(true))
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("Error creating SMS template")
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<SmsTemplate>> {
        sqlx::query_as::<_, SmsTemplate>("SELECT * FROM sms_templates WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Error fetching SMS template")
    }

    pub async fn list(
        pool: &SqlitePool,
        category: Option<&str>,
        active_only: bool,
    ) -> AppResult<Vec<SmsTemplate>> {
        sqlx::query_as::<_, SmsTemplate>(
            r#"
            SELECT * FROM sms_templates
            WHERE (? IS NULL OR category = ?)
            AND (? = 0 OR is_active = 1)
            ORDER BY name
            "#,
        )
        .bind(category)
        .bind(category)
        .bind(active_only)
        .fetch_all(pool)
        .await
        .context("Error fetching SMS templates")
    }

    pub async fn update(
        pool: &SqlitePool,
        current: SmsTemplate,
        update: UpdateSmsTemplate,
    ) -> AppResult<SmsTemplate> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, SmsTemplate>(
            r#"
            UPDATE sms_templates
            SET name = ?,
                content = ?,
                category = ?,
                tags = ?,
                is_active = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(update.name.unwrap_or(current.name))
        .bind(update.content.unwrap_or(current.content))
        .bind(update.category.unwrap_or(current.category))
        .bind(Json(update.tags.unwrap_or(current.tags.0)))
        .bind(update.is_active.unwrap_or(current.is_active))
        .bind(now)
        .bind(current.id)
        .fetch_one(pool)
        .await
        .context("Error updating SMS template")
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sms_templates WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Error deleting SMS template")?;

        Ok(result.rows_affected() > 0)
    }
}
