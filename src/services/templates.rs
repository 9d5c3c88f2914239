use sqlx::SqlitePool;

use crate::db::{
    CreateEmailTemplate, CreateSmsTemplate, EmailTemplate, EmailTemplateRepository,
    SmsTemplate, SmsTemplateRepository, UpdateEmailTemplate, UpdateSmsTemplate,
};
use crate::error::{AppError, AppResult};

/// Ten concatenated SMS segments.
pub const SMS_MAX_CHARS: usize = 1600;

fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Template {} cannot be empty", field)));
    }
    Ok(())
}

fn check_sms_length(content: &str) -> AppResult<()> {
    let chars = content.chars().count();
    if chars > SMS_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "SMS content is {} characters, the limit is {}",
            chars, SMS_MAX_CHARS
        )));
    }
    Ok(())
}

pub struct TemplateService;

impl TemplateService {
    // ========================================================================
    // Email
    // ========================================================================

    pub async fn create_email(
        pool: &SqlitePool,
        template: CreateEmailTemplate,
    ) -> AppResult<EmailTemplate> {
        require_non_empty("name", &template.name)?;
        require_non_empty("content", &template.content)?;
        EmailTemplateRepository::create(pool, template).await
    }

    pub async fn get_email(pool: &SqlitePool, id: &str) -> AppResult<EmailTemplate> {
        EmailTemplateRepository::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Email template {} not found", id)))
    }

    pub async fn list_email(
        pool: &SqlitePool,
        category: Option<&str>,
        active_only: bool,
    ) -> AppResult<Vec<EmailTemplate>> {
        EmailTemplateRepository::list(pool, category, active_only).await
    }

    pub async fn update_email(
        pool: &SqlitePool,
        id: &str,
        update: UpdateEmailTemplate,
    ) -> AppResult<EmailTemplate> {
        if let Some(name) = &update.name {
            require_non_empty("name", name)?;
        }
        if let Some(content) = &update.content {
            require_non_empty("content", content)?;
        }
        let current = Self::get_email(pool, id).await?;
        EmailTemplateRepository::update(pool, current, update).await
    }

    pub async fn delete_email(pool: &SqlitePool, id: &str) -> AppResult<()> {
        if !EmailTemplateRepository::delete(pool, id).await? {
            return Err(AppError::NotFound(format!("Email template {} not found", id)));
        }
        Ok(())
    }

    // ========================================================================
    // SMS
    // ========================================================================

    pub async fn create_sms(pool: &SqlitePool, template: CreateSmsTemplate) -> AppResult<SmsTemplate> {
        require_non_empty("name", &template.name)?;
        require_non_empty("content", &template.content)?;
        check_sms_length(&template.content)?;
        SmsTemplateRepository::create(pool, template).await
    }

    pub async fn get_sms(pool: &SqlitePool, id: &str) -> AppResult<SmsTemplate> {
        SmsTemplateRepository::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("SMS template {} not found", id)))
    }

    pub async fn list_sms(
        pool: &SqlitePool,
        category: Option<&str>,
        active_only: bool,
    ) -> AppResult<Vec<SmsTemplate>> {
        SmsTemplateRepository::list(pool, category, active_only).await
    }

    pub async fn update_sms(
        pool: &SqlitePool,
        id: &str,
        update: UpdateSmsTemplate,
    ) -> AppResult<SmsTemplate> {
        if let Some(name) = &update.name {
            require_non_empty("name", name)?;
        }
        if let Some(content) = &update.content {
            require_non_empty("content", content)?;
            check_sms_length(content)?;
        }
        let current = Self::get_sms(pool, id).await?;
        SmsTemplateRepository::update(pool, current, update).await
    }

    pub async fn delete_sms(pool: &SqlitePool, id: &str) -> AppResult<()> {
        if !SmsTemplateRepository::delete(pool, id).await? {
            return Err(AppError::NotFound(format!("SMS template {} not found", id)));
        }
        Ok(())
    }
}
