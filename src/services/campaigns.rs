use chrono::{NaiveDateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::{
    Campaign, CampaignMetrics, CampaignRecipient, CampaignRepository, CampaignType,
    CreateCampaign, CustomerRepository, EmailTemplateRepository, MarketingOverview, NewCampaign,
    PreferencesRepository, RecipientRepository, RecipientStatus, SegmentRepository,
    SmsTemplateRepository, UpdateCampaign,
};
use crate::error::{AppError, AppResult, StorageContext};
use crate::services::lifecycle::CampaignEvent;
use crate::services::metrics::{record_milestone, Milestone};
use crate::services::segments::SegmentService;

/// Outcome of attaching customers to a campaign.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecipientImport {
    pub requested: usize,
    pub added: u64,
    pub skipped_opted_out: usize,
    pub audience_count: i64,
}

pub struct CampaignService;

impl CampaignService {
    pub async fn create(pool: &SqlitePool, input: CreateCampaign) -> AppResult<Campaign> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Campaign name cannot be empty".to_string()));
        }

        let mut subject = input.subject.clone();
        let mut content = input.content.clone();

        // Template content is copied; later template edits do not reach the campaign.
        if let Some(template_id) = input.email_template_id.as_deref() {
            if input.campaign_type != CampaignType::Email {
                return Err(AppError::Validation(
                    "Email templates can only be used by email campaigns".to_string(),
                ));
            }
            let template = EmailTemplateRepository::find_by_id(pool, template_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Email template {} not found", template_id))
                })?;
            subject = subject.or(Some(template.subject));
            content = content.or(Some(template.content));
        }
        if let Some(template_id) = input.sms_template_id.as_deref() {
            if input.campaign_type != CampaignType::Sms {
                return Err(AppError::Validation(
                    "SMS templates can only be used by SMS campaigns".to_string(),
                ));
            }
            let template = SmsTemplateRepository::find_by_id(pool, template_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("SMS template {} not found", template_id))
                })?;
            content = content.or(Some(template.content));
        }

        let audience_count = match input.segment_id.as_deref() {
            Some(segment_id) => Self::segment_audience(pool, segment_id).await?,
            None => 0,
        };

        let campaign = CampaignRepository::create(
            pool,
            NewCampaign {
                name,
                description: input.description.as_deref(),
                campaign_type: input.campaign_type,
                segment_id: input.segment_id.as_deref(),
                audience_count,
                email_template_id: input.email_template_id.as_deref(),
                sms_template_id: input.sms_template_id.as_deref(),
                subject: subject.as_deref(),
                content: content.as_deref().unwrap_or_default(),
            },
        )
        .await?;

        tracing::info!(
            "Created {:?} campaign {} with audience {}",
            campaign.campaign_type,
            campaign.id,
            audience_count
        );
        Ok(campaign)
    }

    async fn segment_audience(pool: &SqlitePool, segment_id: &str) -> AppResult<i64> {
        let segment = SegmentRepository::find_by_id(pool, segment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Segment {} not found", segment_id)))?;
        SegmentService::count_customers(pool, &segment.criteria).await
    }

    pub async fn get(pool: &SqlitePool, id: &str) -> AppResult<Campaign> {
        CampaignRepository::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {} not found", id)))
    }

    pub async fn list(
        pool: &SqlitePool,
        status: Option<crate::db::CampaignStatus>,
        campaign_type: Option<CampaignType>,
    ) -> AppResult<Vec<Campaign>> {
        CampaignRepository::list(pool, status, campaign_type).await
    }

    pub async fn update(pool: &SqlitePool, id: &str, update: UpdateCampaign) -> AppResult<Campaign> {
        let current = Self::get(pool, id).await?;
        if !current.status.is_editable() {
            return Err(AppError::Conflict(format!(
                "Campaign {} cannot be edited while {}",
                id, current.status
            )));
        }

        let name = update.name.unwrap_or(current.name);
        if name.trim().is_empty() {
            return Err(AppError::Validation("Campaign name cannot be empty".to_string()));
        }

        let segment_id = update.segment_id.or(current.segment_id.clone());
        let audience_count = match segment_id.as_deref() {
            Some(segment_id) if Some(segment_id) != current.segment_id.as_deref() => {
                Self::segment_audience(pool, segment_id).await?
            }
            _ => current.audience_count,
        };
        // Once recipients are attached they are the audience, whatever the
        // segment now says.
        let recipients = RecipientRepository::count_by_campaign(pool, id).await?;
        let audience_count = if recipients > 0 { recipients } else { audience_count };

        CampaignRepository::update_details(
            pool,
            id,
            name.trim(),
            update.description.unwrap_or(current.description).as_deref(),
            segment_id.as_deref(),
            audience_count,
            update.subject.or(current.subject).as_deref(),
            &update.content.unwrap_or(current.content),
        )
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
        if !CampaignRepository::delete(pool, id).await? {
            return Err(AppError::NotFound(format!("Campaign {} not found", id)));
        }
        tracing::info!("Deleted campaign {}", id);
        Ok(())
    }

    /// Apply a lifecycle event. The write only lands if the stored status is
    /// still the one the event was validated against.
    pub async fn transition(
        pool: &SqlitePool,
        id: &str,
        event: CampaignEvent,
    ) -> AppResult<Campaign> {
        let current = Self::get(pool, id).await?;
        let next = current.status.apply(&event)?;

        let now = Utc::now().naive_utc();
        let (scheduled_at, completed_at) = match &event {
            CampaignEvent::Schedule { at } => (Some(*at), None),
            CampaignEvent::Complete => (None, Some(now)),
            CampaignEvent::Resume | CampaignEvent::Pause => (None, None),
        };

        let updated = CampaignRepository::transition(
            pool,
            id,
            current.status,
            next,
            scheduled_at,
            completed_at,
        )
        .await?
        .ok_or_else(|| {
            tracing::warn!(
                "Campaign {} changed status concurrently, {} rejected",
                id,
                event.name()
            );
            AppError::Conflict(format!(
                "Campaign {} is no longer {}; reload and retry",
                id, current.status
            ))
        })?;

        tracing::info!(
            "Campaign {} {} -> {} ({})",
            id,
            current.status,
            updated.status,
            event.name()
        );
        Ok(updated)
    }

    /// Attach customers as pending recipients. Duplicates are ignored.
    pub async fn add_recipients(
        pool: &SqlitePool,
        campaign_id: &str,
        customer_ids: &[String],
    ) -> AppResult<RecipientImport> {
        Self::get(pool, campaign_id).await?;
        Self::import(pool, campaign_id, customer_ids, 0).await
    }

    /// Materialize the campaign's segment as recipients, skipping customers
    /// who opted out of the campaign's channel.
    pub async fn add_segment_recipients(
        pool: &SqlitePool,
        campaign_id: &str,
    ) -> AppResult<RecipientImport> {
        let campaign = Self::get(pool, campaign_id).await?;
        let segment_id = campaign.segment_id.as_deref().ok_or_else(|| {
            AppError::BadRequest(format!("Campaign {} has no segment", campaign_id))
        })?;

        let customers = SegmentService::customers(pool, segment_id).await?;
        let opted_out =
            PreferencesRepository::opted_out_customer_ids(pool, campaign.campaign_type).await?;

        let (allowed, skipped): (Vec<_>, Vec<_>) = customers
            .into_iter()
            .map(|c| c.id)
            .partition(|id| !opted_out.contains(id));

        if !skipped.is_empty() {
            tracing::debug!(
                "Skipping {} opted-out customers for campaign {}",
                skipped.len(),
                campaign_id
            );
        }

        Self::import(pool, campaign_id, &allowed, skipped.len()).await
    }

    async fn import(
        pool: &SqlitePool,
        campaign_id: &str,
        customer_ids: &[String],
        skipped_opted_out: usize,
    ) -> AppResult<RecipientImport> {
        let mut tx = pool.begin().await.context("Error starting transaction")?;

        let added = RecipientRepository::insert_many(&mut tx, campaign_id, customer_ids).await?;
        let metrics = Self::recompute_in(&mut tx, campaign_id).await?;

        tx.commit().await.context("Error committing recipients")?;

        tracing::info!(
            "Added {} of {} recipients to campaign {}",
            added,
            customer_ids.len(),
            campaign_id
        );

        Ok(RecipientImport {
            requested: customer_ids.len() + skipped_opted_out,
            added,
            skipped_opted_out,
            audience_count: metrics.total as i64,
        })
    }

    pub async fn list_recipients(
        pool: &SqlitePool,
        campaign_id: &str,
        status: Option<RecipientStatus>,
    ) -> AppResult<Vec<CampaignRecipient>> {
        Self::get(pool, campaign_id).await?;
        RecipientRepository::list_by_campaign(pool, campaign_id, status).await
    }

    /// Record a delivery milestone for one recipient and refresh the
    /// campaign aggregate in the same transaction.
    pub async fn record_recipient_event(
        pool: &SqlitePool,
        recipient_id: &str,
        milestone: Milestone,
        error_message: Option<String>,
        at: Option<NaiveDateTime>,
    ) -> AppResult<CampaignRecipient> {
        let at = at.unwrap_or_else(|| Utc::now().naive_utc());
        let mut tx = pool.begin().await.context("Error starting transaction")?;

        let mut recipient = RecipientRepository::find_by_id(&mut *tx, recipient_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recipient {} not found", recipient_id)))?;

        let mut changed = record_milestone(&mut recipient, milestone, at);
        if milestone == Milestone::Failed && error_message.is_some() {
            recipient.error_message = error_message;
            changed = true;
        }

        if changed {
            RecipientRepository::save_progress(&mut *tx, &recipient).await?;
            Self::recompute_in(&mut tx, &recipient.campaign_id).await?;
        }

        tx.commit().await.context("Error committing recipient event")?;

        tracing::debug!(
            "Recipient {} reached {:?} (status {:?})",
            recipient.id,
            milestone,
            recipient.status
        );
        Ok(recipient)
    }

    /// Aggregate the campaign's recipients and persist the result.
    pub async fn recompute_campaign_metrics(
        pool: &SqlitePool,
        campaign_id: &str,
    ) -> AppResult<CampaignMetrics> {
        let mut tx = pool.begin().await.context("Error starting transaction")?;
        let metrics = Self::recompute_in(&mut tx, campaign_id).await?;
        tx.commit().await.context("Error committing campaign metrics")?;
        Ok(metrics)
    }

    async fn recompute_in(
        conn: &mut SqliteConnection,
        campaign_id: &str,
    ) -> AppResult<CampaignMetrics> {
        let campaign = CampaignRepository::find_by_id(&mut *conn, campaign_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {} not found", campaign_id)))?;

        let recipients = RecipientRepository::list_by_campaign(&mut *conn, campaign_id, None).await?;
        let metrics = CampaignMetrics::from_recipients(&recipients, Utc::now().naive_utc());

        // Once recipients exist they are the audience; before that the
        // segment snapshot stands.
        let audience_count = if recipients.is_empty() {
            campaign.audience_count
        } else {
            recipients.len() as i64
        };

        CampaignRepository::update_metrics(&mut *conn, campaign_id, &metrics, audience_count)
            .await?;

        tracing::debug!(
            "Recomputed metrics for campaign {}: {} recipients, {} delivered",
            campaign_id,
            metrics.total,
            metrics.delivered
        );
        Ok(metrics)
    }

    pub async fn overview(pool: &SqlitePool) -> AppResult<MarketingOverview> {
        let campaigns_by_status = CampaignRepository::counts_by_status(pool).await?;
        let total_customers = CustomerRepository::count_all(pool).await?;
        let all_metrics = CampaignRepository::all_metrics(pool).await?;

        let mut overview = MarketingOverview {
            total_campaigns: campaigns_by_status.values().sum(),
            campaigns_by_status,
            total_customers,
            ..Default::default()
        };

        for m in all_metrics {
            overview.total_recipients += m.total;
            overview.total_delivered += m.delivered;
            overview.total_opened += m.opened;
            overview.total_clicked += m.clicked;
            overview.total_converted += m.converted;
        }

        Ok(overview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        test_pool, CampaignStatus, CreateCustomer, CreateEmailTemplate, CreateSegment,
        SegmentCriteria, UpdateCommunicationPreferences, UpdateEmailTemplate,
    };

    fn email_campaign(name: &str) -> CreateCampaign {
        CreateCampaign {
            name: name.to_string(),
            description: None,
            campaign_type: CampaignType::Email,
            segment_id: None,
            email_template_id: None,
            sms_template_id: None,
            subject: Some("Spring tune-up".to_string()),
            content: Some("<p>Bring your bike in</p>".to_string()),
        }
    }

    async fn customer(pool: &SqlitePool, spent: f64, tags: &[&str]) -> String {
        CustomerRepository::create(
            pool,
            CreateCustomer {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                total_spent: spent,
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    fn schedule() -> CampaignEvent {
        CampaignEvent::Schedule {
            at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn create_copies_template_content() {
        let pool = test_pool().await;
        let template = EmailTemplateRepository::create(
            &pool,
            CreateEmailTemplate {
                name: "Welcome".to_string(),
                subject: "Welcome to the shop".to_string(),
                content: "<p>Hello</p>".to_string(),
                plain_text: None,
                category: None,
                tags: vec![],
                is_active: None,
            },
        )
        .await
        .unwrap();

        let mut input = email_campaign("Welcome wave");
        input.subject = None;
        input.content = None;
        input.email_template_id = Some(template.id.clone());
        let campaign = CampaignService::create(&pool, input).await.unwrap();

        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert_eq!(campaign.subject.as_deref(), Some("Welcome to the shop"));
        assert_eq!(campaign.content, "<p>Hello</p>");

        EmailTemplateRepository::update(
            &pool,
            template,
            UpdateEmailTemplate {
                subject: Some("Changed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let reloaded = CampaignService::get(&pool, &campaign.id).await.unwrap();
        assert_eq!(reloaded.subject.as_deref(), Some("Welcome to the shop"));
    }

    #[tokio::test]
    async fn sms_template_on_email_campaign_is_rejected() {
        let pool = test_pool().await;
        let mut input = email_campaign("Mixed");
        input.sms_template_id = Some("whatever".to_string());
        let err = CampaignService::create(&pool, input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn pausing_a_paused_campaign_is_rejected_and_status_kept() {
        let pool = test_pool().await;
        let campaign = CampaignService::create(&pool, email_campaign("Promo"))
            .await
            .unwrap();

        let active = CampaignService::transition(&pool, &campaign.id, schedule())
            .await
            .unwrap();
        assert_eq!(active.status, CampaignStatus::Active);
        assert!(active.scheduled_at.is_some());

        CampaignService::transition(&pool, &campaign.id, CampaignEvent::Pause)
            .await
            .unwrap();
        let err = CampaignService::transition(&pool, &campaign.id, CampaignEvent::Pause)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        let stored = CampaignService::get(&pool, &campaign.id).await.unwrap();
        assert_eq!(stored.status, CampaignStatus::Paused);
    }

    #[tokio::test]
    async fn complete_stamps_completed_at_and_is_terminal() {
        let pool = test_pool().await;
        let campaign = CampaignService::create(&pool, email_campaign("Done"))
            .await
            .unwrap();

        let done = CampaignService::transition(&pool, &campaign.id, CampaignEvent::Complete)
            .await
            .unwrap();
        assert_eq!(done.status, CampaignStatus::Completed);
        assert!(done.completed_at.is_some());

        let err = CampaignService::transition(&pool, &campaign.id, schedule())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn stale_status_write_does_not_land() {
        let pool = test_pool().await;
        let campaign = CampaignService::create(&pool, email_campaign("Race"))
            .await
            .unwrap();
        CampaignService::transition(&pool, &campaign.id, schedule())
            .await
            .unwrap();

        // A writer still believing the campaign is a draft.
        let stale = CampaignRepository::transition(
            &pool,
            &campaign.id,
            CampaignStatus::Draft,
            CampaignStatus::Completed,
            None,
            None,
        )
        .await
        .unwrap();
        assert!(stale.is_none());
        let stored = CampaignService::get(&pool, &campaign.id).await.unwrap();
        assert_eq!(stored.status, CampaignStatus::Active);
    }

    #[tokio::test]
    async fn active_campaign_cannot_be_edited() {
        let pool = test_pool().await;
        let campaign = CampaignService::create(&pool, email_campaign("Locked"))
            .await
            .unwrap();
        CampaignService::transition(&pool, &campaign.id, schedule())
            .await
            .unwrap();

        let err = CampaignService::update(
            &pool,
            &campaign.id,
            UpdateCampaign {
                content: Some("new".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn recipient_events_keep_metrics_current() {
        let pool = test_pool().await;
        let campaign = CampaignService::create(&pool, email_campaign("Funnel"))
            .await
            .unwrap();

        let mut customer_ids = Vec::new();
        for _ in 0..6 {
            customer_ids.push(customer(&pool, 10.0, &[]).await);
        }
        let import = CampaignService::add_recipients(&pool, &campaign.id, &customer_ids)
            .await
            .unwrap();
        assert_eq!(import.added, 6);
        assert_eq!(import.audience_count, 6);

        // Adding the same customers again is a no-op.
        let again = CampaignService::add_recipients(&pool, &campaign.id, &customer_ids)
            .await
            .unwrap();
        assert_eq!(again.added, 0);

        let recipients = CampaignService::list_recipients(&pool, &campaign.id, None)
            .await
            .unwrap();
        let milestones = [
            Milestone::Sent,
            Milestone::Delivered,
            Milestone::Opened,
            Milestone::Clicked,
            Milestone::Converted,
            Milestone::Failed,
        ];
        for (recipient, milestone) in recipients.iter().zip(milestones) {
            let error = (milestone == Milestone::Failed).then(|| "mailbox full".to_string());
            CampaignService::record_recipient_event(&pool, &recipient.id, milestone, error, None)
                .await
                .unwrap();
        }

        let stored = CampaignService::get(&pool, &campaign.id).await.unwrap();
        let m = &stored.metrics.0;
        assert_eq!(
            (m.total, m.sent, m.delivered, m.opened, m.clicked, m.converted, m.failed),
            (6, 6, 4, 3, 2, 1, 1)
        );
        assert!((m.delivery_rate - 66.67).abs() < 0.01);
        assert!((m.bounce_rate - 16.67).abs() < 0.01);
        assert!(m.computed_at.is_some());

        let failed = CampaignService::list_recipients(
            &pool,
            &campaign.id,
            Some(RecipientStatus::Failed),
        )
        .await
        .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error_message.as_deref(), Some("mailbox full"));
        assert!(failed[0].sent_at.is_some());

        let recomputed = CampaignService::recompute_campaign_metrics(&pool, &campaign.id)
            .await
            .unwrap();
        assert_eq!(recomputed.converted, 1);

        let overview = CampaignService::overview(&pool).await.unwrap();
        assert_eq!(overview.total_campaigns, 1);
        assert_eq!(overview.total_customers, 6);
        assert_eq!(overview.total_recipients, 6);
        assert_eq!(overview.total_converted, 1);
        assert_eq!(overview.campaigns_by_status.get("draft"), Some(&1));
    }

    #[tokio::test]
    async fn segment_recipients_skip_opted_out_customers() {
        let pool = test_pool().await;
        let vip = customer(&pool, 250.0, &["vip"]).await;
        let opted_out = customer(&pool, 400.0, &["vip"]).await;
        customer(&pool, 20.0, &[]).await;

        PreferencesRepository::update(
            &pool,
            &opted_out,
            UpdateCommunicationPreferences {
                email_marketing: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let segment = SegmentService::create(
            &pool,
            CreateSegment {
                name: "VIPs".to_string(),
                description: None,
                criteria: SegmentCriteria {
                    tags: vec!["vip".to_string()],
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();

        let mut input = email_campaign("VIP night");
        input.segment_id = Some(segment.id.clone());
        let campaign = CampaignService::create(&pool, input).await.unwrap();
        assert_eq!(campaign.audience_count, 2);

        let import = CampaignService::add_segment_recipients(&pool, &campaign.id)
            .await
            .unwrap();
        assert_eq!(import.added, 1);
        assert_eq!(import.skipped_opted_out, 1);

        let recipients = CampaignService::list_recipients(&pool, &campaign.id, None)
            .await
            .unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].customer_id, vip);
        assert_eq!(
            CampaignService::get(&pool, &campaign.id).await.unwrap().audience_count,
            1
        );
    }

    #[tokio::test]
    async fn segment_change_keeps_recipient_audience() {
        let pool = test_pool().await;
        let mut ids = Vec::new();
        for spent in [10.0, 20.0, 30.0, 40.0] {
            ids.push(customer(&pool, spent, &[]).await);
        }
        let everyone = SegmentService::create(
            &pool,
            CreateSegment {
                name: "Everyone".to_string(),
                description: None,
                criteria: SegmentCriteria::default(),
            },
        )
        .await
        .unwrap();

        let attached = CampaignService::create(&pool, email_campaign("Hand picked"))
            .await
            .unwrap();
        CampaignService::add_recipients(&pool, &attached.id, &ids[..2])
            .await
            .unwrap();
        CampaignService::transition(&pool, &attached.id, schedule())
            .await
            .unwrap();
        CampaignService::transition(&pool, &attached.id, CampaignEvent::Pause)
            .await
            .unwrap();

        let updated = CampaignService::update(
            &pool,
            &attached.id,
            UpdateCampaign {
                segment_id: Some(everyone.id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.segment_id.as_deref(), Some(everyone.id.as_str()));
        assert_eq!(updated.audience_count, 2);

        // Without recipients the new segment's live count is the audience.
        let empty = CampaignService::create(&pool, email_campaign("Broadcast"))
            .await
            .unwrap();
        let updated = CampaignService::update(
            &pool,
            &empty.id,
            UpdateCampaign {
                segment_id: Some(everyone.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.audience_count, 4);
    }

    #[tokio::test]
    async fn null_description_clears_and_missing_keeps() {
        let pool = test_pool().await;
        let mut input = email_campaign("Described");
        input.description = Some("Spring push".to_string());
        let campaign = CampaignService::create(&pool, input).await.unwrap();

        let keep: UpdateCampaign =
            serde_json::from_value(serde_json::json!({ "name": "Renamed" })).unwrap();
        let kept = CampaignService::update(&pool, &campaign.id, keep).await.unwrap();
        assert_eq!(kept.name, "Renamed");
        assert_eq!(kept.description.as_deref(), Some("Spring push"));

        let clear: UpdateCampaign =
            serde_json::from_value(serde_json::json!({ "description": null })).unwrap();
        assert_eq!(clear.description, Some(None));
        let cleared = CampaignService::update(&pool, &campaign.id, clear).await.unwrap();
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.name, "Renamed");
    }

    #[tokio::test]
    async fn resume_starts_a_draft() {
        let pool = test_pool().await;
        let campaign = CampaignService::create(&pool, email_campaign("Straight to send"))
            .await
            .unwrap();
        let resumed = CampaignService::transition(&pool, &campaign.id, CampaignEvent::Resume)
            .await
            .unwrap();
        assert_eq!(resumed.status, CampaignStatus::Active);
        assert!(resumed.scheduled_at.is_none());
    }

    #[tokio::test]
    async fn delete_cascades_recipients() {
        let pool = test_pool().await;
        let campaign = CampaignService::create(&pool, email_campaign("Gone"))
            .await
            .unwrap();
        let id = customer(&pool, 1.0, &[]).await;
        CampaignService::add_recipients(&pool, &campaign.id, &[id])
            .await
            .unwrap();

        CampaignService::delete(&pool, &campaign.id).await.unwrap();
        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM campaign_recipients")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(left, 0);
        assert!(matches!(
            CampaignService::delete(&pool, &campaign.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
