use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::models::*;
use crate::error::{AppResult, StorageContext};
use crate::services::segments::ResolvedCriteria;

// ============================================================================
// Customer Repository (read side of the shop's customer table)
// ============================================================================

pub struct CustomerRepository;

impl CustomerRepository {
    /// Append the segment predicate to a query that selects from `customers`.
    fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, criteria: &ResolvedCriteria) {
        qb.push(" WHERE 1 = 1");

        if let Some(min) = criteria.spent_min {
            qb.push(" AND total_spent >= ").push_bind(min);
        }
        if let Some(max) = criteria.spent_max {
            qb.push(" AND total_spent <= ").push_bind(max);
        }
        if let Some(min) = criteria.visits_min {
            qb.push(" AND visit_count >= ").push_bind(min);
        }
        if let Some(max) = criteria.visits_max {
            qb.push(" AND visit_count <= ").push_bind(max);
        }
        // NULL last_visit_at never satisfies a comparison, so customers
        // without visits drop out as soon as a recency bound is present.
        if let Some(before) = criteria.last_visit_on_or_before {
            qb.push(" AND last_visit_at <= ").push_bind(before);
        }
        if let Some(after) = criteria.last_visit_on_or_after {
            qb.push(" AND last_visit_at >= ").push_bind(after);
        }
        for tag in &criteria.tags {
            qb.push(" AND EXISTS (SELECT 1 FROM json_each(customers.tags) WHERE json_each.value = ")
                .push_bind(tag.clone())
                .push(")");
        }
    }

    pub async fn count_matching(pool: &SqlitePool, criteria: &ResolvedCriteria) -> AppResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM customers");
        Self::push_filters(&mut qb, criteria);

        qb.build_query_scalar::<i64>()
            .fetch_one(pool)
            .await
            .context("Error counting segment customers")
    }

    pub async fn find_matching(
        pool: &SqlitePool,
        criteria: &ResolvedCriteria,
    ) -> AppResult<Vec<Customer>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM customers");
        Self::push_filters(&mut qb, criteria);
        qb.push(" ORDER BY last_name, first_name, id");

        qb.build_query_as::<Customer>()
            .fetch_all(pool)
            .await
            .context("Error fetching segment customers")
    }

    pub async fn count_all(pool: &SqlitePool) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(pool)
            .await
            .context("Error counting customers")
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Error fetching customer")
    }

    /// Customers are written by the shop application; tests seed them here.
    #[cfg(test)]
    pub async fn create(pool: &SqlitePool, customer: CreateCustomer) -> AppResult<Customer> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                id, first_name, last_name, email, phone,
                total_spent, visit_count, last_visit_at, tags, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(customer.first_name)
        .bind(customer.last_name)
        .bind(customer.email)
        .bind(customer.phone)
        .bind(customer.total_spent)
        .bind(customer.visit_count)
        .bind(customer.last_visit_at)
        .bind(sqlx::types::Json(customer.tags))
        .bind(now)
        .fetch_one(pool)
        .await
        .context("Error creating customer")
    }
}
