use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Append-only behavioral event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MarketingEvent {
    pub id: String,
    pub customer_id: String,
    pub event_type: String,
    pub event_data: Json<serde_json::Value>,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMarketingEvent {
    pub customer_id: String,
    pub event_type: String,
    #[serde(default)]
    pub event_data: serde_json::Value,
    /// Defaults to now.
    pub occurred_at: Option<NaiveDateTime>,
}
