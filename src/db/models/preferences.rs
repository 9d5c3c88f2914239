use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::CampaignType;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CommunicationPreferences {
    pub id: String,
    pub customer_id: String,
    pub email_marketing: bool,
    pub sms_marketing: bool,
    pub push_notifications: bool,
    pub email_transactional: bool,
    pub sms_transactional: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CommunicationPreferences {
    /// Whether a marketing campaign of this type may reach the customer.
    pub fn allows(&self, campaign_type: CampaignType) -> bool {
        match campaign_type {
            CampaignType::Email => self.email_marketing,
            CampaignType::Sms => self.sms_marketing,
            CampaignType::Push => self.push_notifications,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCommunicationPreferences {
    pub email_marketing: Option<bool>,
    pub sms_marketing: Option<bool>,
    pub push_notifications: Option<bool>,
    pub email_transactional: Option<bool>,
    pub sms_transactional: Option<bool>,
}
