use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::CampaignType;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MarketingAutomation {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// e.g. "repair_completed", "customer_created", "no_visit"
    pub trigger_type: String,
    pub trigger_config: Json<serde_json::Value>,
    pub campaign_type: CampaignType,
    pub email_template_id: Option<String>,
    pub sms_template_id: Option<String>,
    pub delay_hours: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAutomation {
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: String,
    #[serde(default)]
    pub trigger_config: serde_json::Value,
    pub campaign_type: CampaignType,
    pub email_template_id: Option<String>,
    pub sms_template_id: Option<String>,
    #[serde(default)]
    pub delay_hours: i64,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAutomation {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    pub trigger_type: Option<String>,
    pub trigger_config: Option<serde_json::Value>,
    pub email_template_id: Option<String>,
    pub sms_template_id: Option<String>,
    pub delay_hours: Option<i64>,
    pub is_active: Option<bool>,
}
