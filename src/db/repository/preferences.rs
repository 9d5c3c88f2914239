use std::collections::HashSet;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppResult, StorageContext};

// ============================================================================
// Communication Preferences Repository
// ============================================================================

pub struct PreferencesRepository;

impl PreferencesRepository {
    pub async fn find_by_customer_id(
        pool: &SqlitePool,
        customer_id: &str,
    ) -> AppResult<Option<CommunicationPreferences>> {
        sqlx::query_as::<_, CommunicationPreferences>(
            "SELECT * FROM customer_communication_preferences WHERE customer_id = ?",
        )
        .bind(customer_id)
        .fetch_optional(pool)
        .await
        .context("Error fetching communication preferences")
    }

    /// Return the customer's preferences, creating the opted-in defaults the
    /// first time they are read.
    pub async fn get_or_create(
        pool: &SqlitePool,
        customer_id: &str,
    ) -> AppResult<CommunicationPreferences> {
        if let Some(prefs) = Self::find_by_customer_id(pool, customer_id).await? {
            return Ok(prefs);
        }

        let now = Utc::now().naive_utc();
        // A concurrent reader may insert first; the unique customer_id keeps
        // a single row and both callers read it back.
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO customer_communication_preferences (
                id, customer_id,
                email_marketing, sms_marketing, push_notifications,
                email_transactional, sms_transactional,
                created_at, updated_at
            )
            VALUES (?, ?, 1, 1, 1, 1, 1, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(customer_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Error creating communication preferences")?;

        sqlx::query_as::<_, CommunicationPreferences>(
            "SELECT * FROM customer_communication_preferences WHERE customer_id = ?",
        )
        .bind(customer_id)
        .fetch_one(pool)
        .await
        .context("Error fetching communication preferences")
    }

    pub async fn update(
        pool: &SqlitePool,
        customer_id: &str,
        update: UpdateCommunicationPreferences,
    ) -> AppResult<CommunicationPreferences> {
        let current = Self::get_or_create(pool, customer_id).await?;
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, CommunicationPreferences>(
            r#"
            UPDATE customer_communication_preferences
            SET email_marketing = ?,
                sms_marketing = ?,
                push_notifications = ?,
                email_transactional = ?,
                sms_transactional = ?,
                updated_at = ?
            WHERE customer_id = ?
            RETURNING *
            "#,
        )
        .bind(update.email_marketing.unwrap_or(current.email_marketing))
        .bind(update.sms_marketing.unwrap_or(current.sms_marketing))
        .bind(update.push_notifications.unwrap_or(current.push_notifications))
        .bind(update.email_transactional.unwrap_or(current.email_transactional))
        .bind(update.sms_transactional.unwrap_or(current.sms_transactional))
        .bind(now)
        .bind(customer_id)
        .fetch_one(pool)
        .await
        .context("Error updating communication preferences")
    }

    /// Customers who explicitly opted out of marketing on this channel.
    /// Customers without a preferences row are treated as opted in.
    pub async fn opted_out_customer_ids(
        pool: &SqlitePool,
        campaign_type: CampaignType,
    ) -> AppResult<HashSet<String>> {
        let column = match campaign_type {
            CampaignType::Email => "email_marketing",
            CampaignType::Sms => "sms_marketing",
            CampaignType::Push => "push_notifications",
        };
        let sql = format!(
            "SELECT customer_id FROM customer_communication_preferences WHERE {} = 0",
            column
        );

        let ids = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(pool)
            .await
            .context("Error fetching communication preferences")?;

        Ok(ids.into_iter().collect())
    }
}
