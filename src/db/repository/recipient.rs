use chrono::Utc;
use sqlx::{SqliteConnection, SqliteExecutor};
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppResult, StorageContext};

// ============================================================================
// Campaign Recipient Repository
// ============================================================================

pub struct RecipientRepository;

impl RecipientRepository {
    /// Insert one pending recipient per customer. Customers already attached
    /// to the campaign are skipped. Returns the number of new rows.
    pub async fn insert_many(
        conn: &mut SqliteConnection,
        campaign_id: &str,
        customer_ids: &[String],
    ) -> AppResult<u64> {
        let now = Utc::now().naive_utc();
        let mut inserted = 0u64;

        for customer_id in customer_ids {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO campaign_recipients (
                    id, campaign_id, customer_id, status, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(campaign_id)
            .bind(customer_id)
            .bind(RecipientStatus::Pending)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await
            .context("Error adding campaign recipients")?;

            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: &str) -> AppResult<Option<CampaignRecipient>>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, CampaignRecipient>("SELECT * FROM campaign_recipients WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
            .context("Error fetching campaign recipient")
    }

    pub async fn list_by_campaign<'e, E>(
        executor: E,
        campaign_id: &str,
        status: Option<RecipientStatus>,
    ) -> AppResult<Vec<CampaignRecipient>>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, CampaignRecipient>(
            r#"
            SELECT * FROM campaign_recipients
            WHERE campaign_id = ?
            AND (? IS NULL OR status = ?)
            ORDER BY created_at, id
            "#,
        )
        .bind(campaign_id)
        .bind(status)
        .bind(status)
        .fetch_all(executor)
        .await
        .context("Error fetching campaign recipients")
    }

    pub async fn count_by_campaign<'e, E>(executor: E, campaign_id: &str) -> AppResult<i64>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM campaign_recipients WHERE campaign_id = ?")
            .bind(campaign_id)
            .fetch_one(executor)
            .await
            .context("Error counting campaign recipients")
    }

    /// Persist the milestone timestamps and derived status of a recipient.
    pub async fn save_progress<'e, E>(executor: E, recipient: &CampaignRecipient) -> AppResult<()>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query(
            r#"
            UPDATE campaign_recipients
            SET status = ?,
                sent_at = ?,
                delivered_at = ?,
                opened_at = ?,
                clicked_at = ?,
                converted_at = ?,
                failed_at = ?,
                unsubscribed_at = ?,
                error_message = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(recipient.status)
        .bind(recipient.sent_at)
        .bind(recipient.delivered_at)
        .bind(recipient.opened_at)
        .bind(recipient.clicked_at)
        .bind(recipient.converted_at)
        .bind(recipient.failed_at)
        .bind(recipient.unsubscribed_at)
        .bind(recipient.error_message.as_deref())
        .bind(Utc::now().naive_utc())
        .bind(&recipient.id)
        .execute(executor)
        .await
        .context("Error updating campaign recipient")?;

        Ok(())
    }
}
