use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A shop customer as seen by the segment evaluator.
///
/// The `customers` table is owned by the shop application; this service only
/// reads spend, visit and tag data from it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub total_spent: f64,
    pub visit_count: i64,
    pub last_visit_at: Option<NaiveDateTime>,
    pub tags: Json<Vec<String>>,
    pub created_at: NaiveDateTime,
}

impl Customer {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.0.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub total_spent: f64,
    pub visit_count: i64,
    pub last_visit_at: Option<NaiveDateTime>,
    pub tags: Vec<String>,
}
