use sqlx::SqlitePool;

use crate::db::{
    CommunicationPreferences, CustomerRepository, PreferencesRepository,
    UpdateCommunicationPreferences,
};
use crate::error::{AppError, AppResult};

pub struct PreferencesService;

impl PreferencesService {
    async fn ensure_customer(pool: &SqlitePool, customer_id: &str) -> AppResult<()> {
        CustomerRepository::find_by_id(pool, customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", customer_id)))?;
        Ok(())
    }

    /// A customer without stored preferences gets the opted-in defaults,
    /// persisted on first read.
    pub async fn get(pool: &SqlitePool, customer_id: &str) -> AppResult<CommunicationPreferences> {
        Self::ensure_customer(pool, customer_id).await?;
        PreferencesRepository::get_or_create(pool, customer_id).await
    }

    pub async fn update(
        pool: &SqlitePool,
        customer_id: &str,
        update: UpdateCommunicationPreferences,
    ) -> AppResult<CommunicationPreferences> {
        Self::ensure_customer(pool, customer_id).await?;
        let prefs = PreferencesRepository::update(pool, customer_id, update).await?;
        tracing::info!(
            "Updated communication preferences for customer {} (email={}, sms={}, push={})",
            customer_id,
            prefs.email_marketing,
            prefs.sms_marketing,
            prefs.push_notifications
        );
        Ok(prefs)
    }
}
