use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Declarative audience filter. Every present bound is ANDed; an empty
/// criteria object matches every customer.
///
/// `last_visit_min` / `last_visit_max` are expressed in "days ago" and are
/// resolved against the clock at evaluation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visits_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visits_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visit_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visit_max: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CustomerSegment {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub criteria: Json<SegmentCriteria>,
    /// Snapshot of the matching customer count at `counted_at`.
    pub customer_count: i64,
    pub counted_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSegment {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub criteria: SegmentCriteria,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSegment {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    pub criteria: Option<SegmentCriteria>,
}
