//! Segment criteria evaluation and saved-segment management.
//!
//! A criteria object is resolved against a clock into a [`ResolvedCriteria`]
//! which both the SQL filter (`CustomerRepository`) and the in-memory
//! [`SegmentCriteria::matches`] consume, so the two cannot drift apart.

use chrono::{Duration, NaiveDateTime, Utc};
use sqlx::SqlitePool;

use crate::db::{
    CreateSegment, Customer, CustomerRepository, CustomerSegment, SegmentCriteria,
    SegmentRepository, UpdateSegment,
};
use crate::error::{AppError, AppResult};

/// Longest recency bound accepted, in days.
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// `now - days`, saturating at the earliest representable instant.
fn days_before(now: NaiveDateTime, days: i64) -> NaiveDateTime {
    Duration::try_days(days)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Criteria with "days ago" recency bounds turned into absolute instants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedCriteria {
    pub spent_min: Option<f64>,
    pub spent_max: Option<f64>,
    pub visits_min: Option<i64>,
    pub visits_max: Option<i64>,
    /// From `last_visit_min`: the visit happened at least that many days ago.
    pub last_visit_on_or_before: Option<NaiveDateTime>,
    /// From `last_visit_max`: the visit happened at most that many days ago.
    pub last_visit_on_or_after: Option<NaiveDateTime>,
    pub tags: Vec<String>,
}

impl SegmentCriteria {
    pub fn is_empty(&self) -> bool {
        *self == SegmentCriteria::default()
    }

    pub fn validate(&self) -> AppResult<()> {
        fn check_range<T: PartialOrd + Default + Copy>(
            name: &str,
            min: Option<T>,
            max: Option<T>,
        ) -> AppResult<()> {
            for (bound, value) in [("min", min), ("max", max)] {
                if let Some(v) = value {
                    if v < T::default() {
                        return Err(AppError::Validation(format!(
                            "{}_{} cannot be negative",
                            name, bound
                        )));
                    }
                }
            }
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    return Err(AppError::Validation(format!(
                        "{}_min cannot exceed {}_max",
                        name, name
                    )));
                }
            }
            Ok(())
        }

        check_range("spent", self.spent_min, self.spent_max)?;
        check_range("visits", self.visits_min, self.visits_max)?;
        check_range("last_visit", self.last_visit_min, self.last_visit_max)?;
        for (name, value) in [
            ("last_visit_min", self.last_visit_min),
            ("last_visit_max", self.last_visit_max),
        ] {
            if value.is_some_and(|days| days > MAX_LOOKBACK_DAYS) {
                return Err(AppError::Validation(format!(
                    "{} cannot exceed {} days",
                    name, MAX_LOOKBACK_DAYS
                )));
            }
        }

        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(AppError::Validation("tags cannot contain empty values".to_string()));
        }

        Ok(())
    }

    /// Pin the relative recency bounds to `now`.
    pub fn resolve(&self, now: NaiveDateTime) -> ResolvedCriteria {
        let mut tags = self.tags.clone();
        tags.sort();
        tags.dedup();

        ResolvedCriteria {
            spent_min: self.spent_min,
            spent_max: self.spent_max,
            visits_min: self.visits_min,
            visits_max: self.visits_max,
            last_visit_on_or_before: self.last_visit_min.map(|days| days_before(now, days)),
            last_visit_on_or_after: self.last_visit_max.map(|days| days_before(now, days)),
            tags,
        }
    }

    pub fn matches(&self, customer: &Customer, now: NaiveDateTime) -> bool {
        self.resolve(now).matches(customer)
    }
}

impl ResolvedCriteria {
    pub fn matches(&self, customer: &Customer) -> bool {
        if self.spent_min.is_some_and(|min| customer.total_spent < min) {
            return false;
        }
        if self.spent_max.is_some_and(|max| customer.total_spent > max) {
            return false;
        }
        if self.visits_min.is_some_and(|min| customer.visit_count < min) {
            return false;
        }
        if self.visits_max.is_some_and(|max| customer.visit_count > max) {
            return false;
        }
        if let Some(before) = self.last_visit_on_or_before {
            match customer.last_visit_at {
                Some(at) if at <= before => {}
                _ => return false,
            }
        }
        if let Some(after) = self.last_visit_on_or_after {
            match customer.last_visit_at {
                Some(at) if at >= after => {}
                _ => return false,
            }
        }
        self.tags.iter().all(|tag| customer.has_tag(tag))
    }
}

pub struct SegmentService;

impl SegmentService {
    pub async fn count_customers(pool: &SqlitePool, criteria: &SegmentCriteria) -> AppResult<i64> {
        let resolved = criteria.resolve(Utc::now().naive_utc());
        CustomerRepository::count_matching(pool, &resolved).await
    }

    pub async fn customers_for_criteria(
        pool: &SqlitePool,
        criteria: &SegmentCriteria,
    ) -> AppResult<Vec<Customer>> {
        let resolved = criteria.resolve(Utc::now().naive_utc());
        CustomerRepository::find_matching(pool, &resolved).await
    }

    /// Count without saving anything.
    pub async fn preview(pool: &SqlitePool, criteria: &SegmentCriteria) -> AppResult<i64> {
        criteria.validate()?;
        Self::count_customers(pool, criteria).await
    }

    pub async fn create(pool: &SqlitePool, segment: CreateSegment) -> AppResult<CustomerSegment> {
        let name = segment.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Segment name cannot be empty".to_string()));
        }
        segment.criteria.validate()?;

        let count = Self::count_customers(pool, &segment.criteria).await?;
        let created = SegmentRepository::create(
            pool,
            name,
            segment.description.as_deref(),
            &segment.criteria,
            count,
        )
        .await?;

        tracing::info!("Created segment {} matching {} customers", created.id, count);
        Ok(created)
    }

    pub async fn get(pool: &SqlitePool, id: &str) -> AppResult<CustomerSegment> {
        SegmentRepository::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Segment {} not found", id)))
    }

    pub async fn list(pool: &SqlitePool) -> AppResult<Vec<CustomerSegment>> {
        SegmentRepository::list(pool).await
    }

    /// Apply a partial update and recompute the cached customer count.
    pub async fn update(
        pool: &SqlitePool,
        id: &str,
        update: UpdateSegment,
    ) -> AppResult<CustomerSegment> {
        let current = Self::get(pool, id).await?;

        let name = update.name.unwrap_or(current.name);
        if name.trim().is_empty() {
            return Err(AppError::Validation("Segment name cannot be empty".to_string()));
        }
        let description = update.description.unwrap_or(current.description);
        let criteria = update.criteria.unwrap_or(current.criteria.0);
        criteria.validate()?;

        let count = Self::count_customers(pool, &criteria).await?;
        SegmentRepository::update(pool, id, name.trim(), description.as_deref(), &criteria, count)
            .await
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
        if !SegmentRepository::delete(pool, id).await? {
            return Err(AppError::NotFound(format!("Segment {} not found", id)));
        }
        Ok(())
    }

    pub async fn customers(pool: &SqlitePool, id: &str) -> AppResult<Vec<Customer>> {
        let segment = Self::get(pool, id).await?;
        Self::customers_for_criteria(pool, &segment.criteria).await
    }

    /// Recompute every cached `customer_count`. Returns how many segments
    /// changed.
    pub async fn refresh_counts(pool: &SqlitePool) -> AppResult<usize> {
        let segments = SegmentRepository::list(pool).await?;
        let mut changed = 0usize;

        for segment in segments {
            let now = Utc::now().naive_utc();
            let count =
                CustomerRepository::count_matching(pool, &segment.criteria.resolve(now)).await?;
            SegmentRepository::set_customer_count(pool, &segment.id, count, now).await?;
            if count != segment.customer_count {
                tracing::debug!(
                    "Segment {} count changed {} -> {}",
                    segment.id,
                    segment.customer_count,
                    count
                );
                changed += 1;
            }
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, CreateCustomer};
    use chrono::NaiveDate;
    use sqlx::types::Json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn customer(spent: f64, visits: i64, days_ago: Option<i64>, tags: &[&str]) -> Customer {
        Customer {
            id: uuid::Uuid::new_v4().to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: None,
            phone: None,
            total_spent: spent,
            visit_count: visits,
            last_visit_at: days_ago.map(|d| now() - Duration::days(d)),
            tags: Json(tags.iter().map(|t| t.to_string()).collect()),
            created_at: now(),
        }
    }

    fn population() -> Vec<Customer> {
        vec![
            customer(0.0, 0, None, &[]),
            customer(50.0, 1, Some(3), &["new"]),
            customer(150.0, 4, Some(10), &["vip"]),
            customer(320.0, 9, Some(45), &["vip", "phone-repair"]),
            customer(99.99, 2, Some(200), &["vip"]),
            customer(100.0, 12, Some(30), &["laptop"]),
        ]
    }

    fn matching<'a>(criteria: &SegmentCriteria, customers: &'a [Customer]) -> Vec<&'a str> {
        customers
            .iter()
            .filter(|c| criteria.matches(c, now()))
            .map(|c| c.id.as_str())
            .collect()
    }

    #[test]
    fn empty_criteria_matches_everyone() {
        let customers = population();
        let criteria = SegmentCriteria::default();
        assert!(criteria.is_empty());
        assert_eq!(matching(&criteria, &customers).len(), customers.len());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let customers = population();
        let criteria = SegmentCriteria {
            spent_min: Some(100.0),
            spent_max: Some(150.0),
            ..Default::default()
        };
        let ids = matching(&criteria, &customers);
        assert_eq!(ids, vec![customers[2].id.as_str(), customers[5].id.as_str()]);
    }

    #[test]
    fn tags_require_every_listed_tag() {
        let customers = population();
        let criteria = SegmentCriteria {
            tags: vec!["vip".to_string(), "phone-repair".to_string()],
            ..Default::default()
        };
        assert_eq!(matching(&criteria, &customers), vec![customers[3].id.as_str()]);
    }

    #[test]
    fn recency_bounds_are_days_ago_and_skip_never_visited() {
        let customers = population();
        // Visited between 7 and 60 days ago.
        let criteria = SegmentCriteria {
            last_visit_min: Some(7),
            last_visit_max: Some(60),
            ..Default::default()
        };
        let ids = matching(&criteria, &customers);
        assert_eq!(
            ids,
            vec![
                customers[2].id.as_str(),
                customers[3].id.as_str(),
                customers[5].id.as_str()
            ]
        );
        assert!(!ids.contains(&customers[0].id.as_str()));
    }

    #[test]
    fn adding_bounds_never_grows_the_result() {
        let customers = population();
        let chain = [
            SegmentCriteria::default(),
            SegmentCriteria {
                spent_min: Some(50.0),
                ..Default::default()
            },
            SegmentCriteria {
                spent_min: Some(50.0),
                tags: vec!["vip".to_string()],
                ..Default::default()
            },
            SegmentCriteria {
                spent_min: Some(50.0),
                tags: vec!["vip".to_string()],
                last_visit_max: Some(60),
                ..Default::default()
            },
            SegmentCriteria {
                spent_min: Some(50.0),
                tags: vec!["vip".to_string()],
                last_visit_max: Some(60),
                visits_max: Some(5),
                ..Default::default()
            },
        ];

        for pair in chain.windows(2) {
            let wider = matching(&pair[0], &customers);
            let narrower = matching(&pair[1], &customers);
            assert!(narrower.iter().all(|id| wider.contains(id)));
        }
    }

    #[test]
    fn validate_rejects_inverted_and_negative_ranges() {
        let inverted = SegmentCriteria {
            visits_min: Some(5),
            visits_max: Some(2),
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(AppError::Validation(_))));

        let negative = SegmentCriteria {
            spent_min: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(negative.validate(), Err(AppError::Validation(_))));

        let blank_tag = SegmentCriteria {
            tags: vec!["  ".to_string()],
            ..Default::default()
        };
        assert!(blank_tag.validate().is_err());
        assert!(SegmentCriteria::default().validate().is_ok());
    }

    #[test]
    fn huge_recency_bound_saturates_instead_of_overflowing() {
        let criteria = SegmentCriteria {
            last_visit_min: Some(i64::MAX),
            last_visit_max: Some(i64::MAX),
            ..Default::default()
        };
        let resolved = criteria.resolve(now());
        assert_eq!(resolved.last_visit_on_or_before, Some(NaiveDateTime::MIN));
        assert_eq!(resolved.last_visit_on_or_after, Some(NaiveDateTime::MIN));

        // Any recorded visit is after the earliest instant.
        let customers = population();
        let max_only = SegmentCriteria {
            last_visit_max: Some(1_000_000_000),
            ..Default::default()
        };
        assert_eq!(matching(&max_only, &customers).len(), 5);
    }

    #[tokio::test]
    async fn preview_rejects_recency_bound_beyond_limit() {
        let pool = test_pool().await;
        seed(&pool, 10.0, 1, Some(3), &[]).await;

        let criteria = SegmentCriteria {
            last_visit_max: Some(1_000_000_000),
            ..Default::default()
        };
        let err = SegmentService::preview(&pool, &criteria).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let at_limit = SegmentCriteria {
            last_visit_max: Some(MAX_LOOKBACK_DAYS),
            ..Default::default()
        };
        assert_eq!(SegmentService::preview(&pool, &at_limit).await.unwrap(), 1);

        // Counting skips validation and must still answer.
        assert_eq!(SegmentService::count_customers(&pool, &criteria).await.unwrap(), 1);
    }

    async fn seed(pool: &SqlitePool, spent: f64, visits: i64, days_ago: Option<i64>, tags: &[&str]) {
        CustomerRepository::create(
            pool,
            CreateCustomer {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                total_spent: spent,
                visit_count: visits,
                last_visit_at: days_ago.map(|d| Utc::now().naive_utc() - Duration::days(d)),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn spend_and_tag_segment_counts_one_of_three() {
        let pool = test_pool().await;
        seed(&pool, 150.0, 3, Some(5), &["vip"]).await;
        seed(&pool, 40.0, 1, Some(5), &["vip"]).await;
        seed(&pool, 500.0, 7, Some(5), &["regular"]).await;

        let criteria = SegmentCriteria {
            spent_min: Some(100.0),
            tags: vec!["vip".to_string()],
            ..Default::default()
        };
        assert_eq!(SegmentService::count_customers(&pool, &criteria).await.unwrap(), 1);

        let all = SegmentService::count_customers(&pool, &SegmentCriteria::default())
            .await
            .unwrap();
        assert_eq!(all, CustomerRepository::count_all(&pool).await.unwrap());
        assert_eq!(all, 3);
    }

    #[tokio::test]
    async fn sql_filter_agrees_with_in_memory_evaluation() {
        let pool = test_pool().await;
        seed(&pool, 0.0, 0, None, &[]).await;
        seed(&pool, 120.0, 2, Some(2), &["vip"]).await;
        seed(&pool, 80.0, 6, Some(40), &["vip", "tablet"]).await;
        seed(&pool, 900.0, 15, Some(400), &["tablet"]).await;

        let criteria = SegmentCriteria {
            visits_min: Some(2),
            last_visit_max: Some(90),
            tags: vec!["vip".to_string()],
            ..Default::default()
        };

        let from_sql = SegmentService::customers_for_criteria(&pool, &criteria)
            .await
            .unwrap();
        let everyone =
            SegmentService::customers_for_criteria(&pool, &SegmentCriteria::default())
                .await
                .unwrap();
        let now = Utc::now().naive_utc();
        let in_memory: Vec<_> = everyone
            .iter()
            .filter(|c| criteria.matches(c, now))
            .map(|c| c.id.clone())
            .collect();

        let mut sql_ids: Vec<_> = from_sql.into_iter().map(|c| c.id).collect();
        let mut mem_ids = in_memory;
        sql_ids.sort();
        mem_ids.sort();
        assert_eq!(sql_ids, mem_ids);
        assert_eq!(sql_ids.len(), 2);
    }

    #[tokio::test]
    async fn saved_segment_count_is_recomputed_on_update_and_refresh() {
        let pool = test_pool().await;
        seed(&pool, 200.0, 5, Some(1), &["vip"]).await;

        let segment = SegmentService::create(
            &pool,
            CreateSegment {
                name: "Big spenders".to_string(),
                description: None,
                criteria: SegmentCriteria {
                    spent_min: Some(100.0),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();
        assert_eq!(segment.customer_count, 1);

        seed(&pool, 300.0, 2, Some(1), &[]).await;
        let stale = SegmentService::get(&pool, &segment.id).await.unwrap();
        assert_eq!(stale.customer_count, 1);

        assert_eq!(SegmentService::refresh_counts(&pool).await.unwrap(), 1);
        let fresh = SegmentService::get(&pool, &segment.id).await.unwrap();
        assert_eq!(fresh.customer_count, 2);

        let narrowed = SegmentService::update(
            &pool,
            &segment.id,
            UpdateSegment {
                criteria: Some(SegmentCriteria {
                    spent_min: Some(100.0),
                    tags: vec!["vip".to_string()],
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(narrowed.customer_count, 1);
        assert_eq!(narrowed.name, "Big spenders");
    }

    #[tokio::test]
    async fn missing_segment_is_not_found() {
        let pool = test_pool().await;
        let err = SegmentService::get(&pool, "nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(matches!(
            SegmentService::delete(&pool, "nope").await,
            Err(AppError::NotFound(_))
        ));
    }
}
