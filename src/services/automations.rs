use sqlx::SqlitePool;

use crate::db::{AutomationRepository, CreateAutomation, MarketingAutomation, UpdateAutomation};
use crate::error::{AppError, AppResult};

fn validate(name: Option<&str>, trigger_type: Option<&str>, delay_hours: Option<i64>) -> AppResult<()> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Validation("Automation name cannot be empty".to_string()));
    }
    if trigger_type.is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("Automation trigger_type cannot be empty".to_string()));
    }
    if delay_hours.is_some_and(|d| d < 0) {
        return Err(AppError::Validation("delay_hours cannot be negative".to_string()));
    }
    Ok(())
}

/// Stored automation rules. Nothing here executes them.
pub struct AutomationService;

impl AutomationService {
    pub async fn create(
        pool: &SqlitePool,
        automation: CreateAutomation,
    ) -> AppResult<MarketingAutomation> {
        validate(
            Some(&automation.name),
            Some(&automation.trigger_type),
            Some(automation.delay_hours),
        )?;
        let created = AutomationRepository::create(pool, automation).await?;
        tracing::info!("Created automation {} on {}", created.id, created.trigger_type);
        Ok(created)
    }

    pub async fn get(pool: &SqlitePool, id: &str) -> AppResult<MarketingAutomation> {
        AutomationRepository::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Automation {} not found", id)))
    }

    pub async fn list(pool: &SqlitePool, active_only: bool) -> AppResult<Vec<MarketingAutomation>> {
        AutomationRepository::list(pool, active_only).await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: &str,
        update: UpdateAutomation,
    ) -> AppResult<MarketingAutomation> {
        validate(
            update.name.as_deref(),
            update.trigger_type.as_deref(),
            update.delay_hours,
        )?;
        let current = Self::get(pool, id).await?;
        AutomationRepository::update(pool, current, update).await
    }

    /// Flip `is_active` and return the stored row.
    pub async fn toggle(pool: &SqlitePool, id: &str) -> AppResult<MarketingAutomation> {
        let current = Self::get(pool, id).await?;
        AutomationRepository::set_active(pool, id, !current.is_active)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Automation {} not found", id)))
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
        if !AutomationRepository::delete(pool, id).await? {
            return Err(AppError::NotFound(format!("Automation {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, CampaignType};

    fn follow_up() -> CreateAutomation {
        CreateAutomation {
            name: "Repair follow-up".to_string(),
            description: None,
            trigger_type: "repair_completed".to_string(),
            trigger_config: serde_json::json!({ "min_ticket": 50 }),
            campaign_type: CampaignType::Sms,
            email_template_id: None,
            sms_template_id: None,
            delay_hours: 48,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn toggle_flips_active_flag() {
        let pool = test_pool().await;
        let created = AutomationService::create(&pool, follow_up()).await.unwrap();
        assert!(created.is_active);
        assert_eq!(created.trigger_config.0["min_ticket"], 50);

        let toggled = AutomationService::toggle(&pool, &created.id).await.unwrap();
        assert!(!toggled.is_active);
        assert!(AutomationService::list(&pool, true).await.unwrap().is_empty());
        assert_eq!(AutomationService::list(&pool, false).await.unwrap().len(), 1);

        let toggled = AutomationService::toggle(&pool, &created.id).await.unwrap();
        assert!(toggled.is_active);
    }

    #[tokio::test]
    async fn negative_delay_is_rejected() {
        let pool = test_pool().await;
        let mut input = follow_up();
        input.delay_hours = -1;
        assert!(matches!(
            AutomationService::create(&pool, input).await,
            Err(AppError::Validation(_))
        ));

        let created = AutomationService::create(&pool, follow_up()).await.unwrap();
        let err = AutomationService::update(
            &pool,
            &created.id,
            UpdateAutomation {
                trigger_type: Some(" ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn description_can_be_cleared() {
        let pool = test_pool().await;
        let mut input = follow_up();
        input.description = Some("Ask for a review".to_string());
        let created = AutomationService::create(&pool, input).await.unwrap();

        let untouched: UpdateAutomation =
            serde_json::from_value(serde_json::json!({ "delay_hours": 24 })).unwrap();
        let updated = AutomationService::update(&pool, &created.id, untouched)
            .await
            .unwrap();
        assert_eq!(updated.delay_hours, 24);
        assert_eq!(updated.description.as_deref(), Some("Ask for a review"));

        let clear: UpdateAutomation =
            serde_json::from_value(serde_json::json!({ "description": null })).unwrap();
        let updated = AutomationService::update(&pool, &created.id, clear)
            .await
            .unwrap();
        assert_eq!(updated.description, None);
    }

    #[tokio::test]
    async fn missing_automation_is_not_found() {
        let pool = test_pool().await;
        assert!(matches!(
            AutomationService::toggle(&pool, "nope").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            AutomationService::delete(&pool, "nope").await,
            Err(AppError::NotFound(_))
        ));
    }
}
