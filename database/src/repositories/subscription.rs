use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{query, query_as, PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info, warn, Span};
use uuid::Uuid;

use super::SubscriptionRepository;
use crate::error::RepositoryError;
use crate::models::{CostFilter, NewSubscription, Subscription, SubscriptionUpdate};

const INSERT_SUBSCRIPTION: &str = r#"
    INSERT INTO subscriptions (id, service_name, price, user_id, start_date, end_date, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

const SELECT_BY_USER: &str = r#"
    SELECT id, service_name, price, user_id, start_date, end_date, created_at
    FROM subscriptions
    WHERE user_id = $1
    ORDER BY created_at, id
"#;

const UPDATE_SUBSCRIPTION: &str = r#"
    UPDATE subscriptions
    SET
        service_name = COALESCE($1, service_name),
        price = COALESCE($2, price),
        start_date = COALESCE($3, start_date),
        end_date = COALESCE($4, end_date)
    WHERE id = $5
"#;

const DELETE_SUBSCRIPTION: &str = "DELETE FROM subscriptions WHERE id = $1";

/// Postgres-backed [`SubscriptionRepository`].
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
    logger: Span,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool, logger: &Span) -> Self {
        Self {
            pool,
            logger: tracing::info_span!(parent: logger, "repository"),
        }
    }
}

/// One `WHERE` condition of the cost query and the value bound into it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CostPredicate {
    StartsFrom(NaiveDate),
    EndsBy(NaiveDate),
    User(Uuid),
    /// Bound as given; both sides go through `LOWER()` in SQL.
    ServiceName(String),
}

impl CostPredicate {
    /// SQL before and after the placeholder.
    fn fragments(&self) -> (&'static str, &'static str) {
        match self {
            CostPredicate::StartsFrom(_) => ("start_date >= ", ""),
            CostPredicate::EndsBy(_) => ("(end_date IS NULL OR end_date <= ", ")"),
            CostPredicate::User(_) => ("user_id = ", ""),
            CostPredicate::ServiceName(_) => ("LOWER(service_name) = LOWER(", ")"),
        }
    }
}

/// Conditions for `filter` in placeholder order.
pub(crate) fn cost_predicates(filter: &CostFilter, today: NaiveDate) -> Vec<CostPredicate> {
    let mut predicates = vec![
        CostPredicate::StartsFrom(filter.start_date),
        CostPredicate::EndsBy(filter.effective_end_date(today)),
    ];
    if let Some(user_id) = filter.user_id {
        predicates.push(CostPredicate::User(user_id));
    }
    if let Some(service_name) = &filter.service_name {
        predicates.push(CostPredicate::ServiceName(service_name.clone()));
    }
    predicates
}

/// Aggregate query for `filter`. Every condition value is a bound parameter;
/// none is ever spliced into the SQL text.
pub(crate) fn cost_query(filter: &CostFilter, today: NaiveDate) -> QueryBuilder<'static, Postgres> {
    let mut builder =
        QueryBuilder::new("SELECT COALESCE(SUM(price), 0)::BIGINT FROM subscriptions WHERE ");

    for (index, predicate) in cost_predicates(filter, today).into_iter().enumerate() {
        if index > 0 {
            builder.push(" AND ");
        }
        let (before, after) = predicate.fragments();
        builder.push(before);
        match predicate {
            CostPredicate::StartsFrom(date) | CostPredicate::EndsBy(date) => builder.push_bind(date),
            CostPredicate::User(user_id) => builder.push_bind(user_id),
            CostPredicate::ServiceName(name) => builder.push_bind(name),
        };
        builder.push(after);
    }

    builder
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn insert(&self, subscription: NewSubscription) -> Result<Uuid, RepositoryError> {
        debug!(
            parent: &self.logger,
            user_id = %subscription.user_id,
            service = %subscription.service_name,
            "Inserting new subscription"
        );

        let id = Uuid::new_v4();
        query(INSERT_SUBSCRIPTION)
            .bind(id)
            .bind(subscription.service_name.as_str())
            .bind(subscription.price)
            .bind(subscription.user_id)
            .bind(subscription.start_date)
            .bind(subscription.end_date)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    parent: &self.logger,
                    user_id = %subscription.user_id,
                    service = %subscription.service_name,
                    error = %e,
                    "Failed to insert subscription"
                );
                RepositoryError::Storage(e)
            })?;

        info!(parent: &self.logger, subscription_id = %id, "Subscription created");
        Ok(id)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Subscription>, RepositoryError> {
        debug!(parent: &self.logger, %user_id, "Getting user subscriptions");

        let subscriptions = query_as::<_, Subscription>(SELECT_BY_USER)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(parent: &self.logger, %user_id, error = %e, "Failed to query subscriptions");
                RepositoryError::Storage(e)
            })?;

        debug!(parent: &self.logger, %user_id, count = subscriptions.len(), "Retrieved subscriptions");
        Ok(subscriptions)
    }

    async fn update(&self, id: Uuid, changes: SubscriptionUpdate) -> Result<u64, RepositoryError> {
        debug!(parent: &self.logger, subscription_id = %id, ?changes, "Updating subscription");

        if changes.is_empty() {
            return Ok(0);
        }

        let result = query(UPDATE_SUBSCRIPTION)
            .bind(changes.service_name)
            .bind(changes.price)
            .bind(changes.start_date)
            .bind(changes.end_date)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(parent: &self.logger, subscription_id = %id, error = %e, "Failed to update subscription");
                RepositoryError::Storage(e)
            })?;

        let rows_affected = result.rows_affected();
        if rows_affected == 0 {
            warn!(parent: &self.logger, subscription_id = %id, "Update matched no subscription");
        } else {
            info!(parent: &self.logger, subscription_id = %id, "Subscription updated");
        }
        Ok(rows_affected)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        debug!(parent: &self.logger, subscription_id = %id, "Deleting subscription");

        let result = query(DELETE_SUBSCRIPTION)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(parent: &self.logger, subscription_id = %id, error = %e, "Failed to delete subscription");
                RepositoryError::Storage(e)
            })?;

        if result.rows_affected() == 0 {
            warn!(parent: &self.logger, subscription_id = %id, "Subscription not found for deletion");
            return Err(RepositoryError::NotFound(id));
        }

        info!(parent: &self.logger, subscription_id = %id, "Subscription deleted");
        Ok(())
    }

    async fn total_cost(&self, filter: &CostFilter) -> Result<i64, RepositoryError> {
        debug!(parent: &self.logger, ?filter, "Calculating subscriptions cost");

        let mut builder = cost_query(filter, Utc::now().date_naive());
        let total: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(parent: &self.logger, ?filter, error = %e, "Failed to calculate subscriptions cost");
                RepositoryError::Storage(e)
            })?;

        debug!(parent: &self.logger, total_cost = total, "Subscriptions cost calculated");
        Ok(total)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).unwrap()
    }

    const BASE_SQL: &str = "SELECT COALESCE(SUM(price), 0)::BIGINT FROM subscriptions \
        WHERE start_date >= $1 AND (end_date IS NULL OR end_date <= $2)";

    #[test]
    fn cost_query_without_optional_filters() {
        let filter = CostFilter::new(month(2024, 1));
        let builder = cost_query(&filter, month(2025, 6));
        assert_eq!(builder.sql(), BASE_SQL);
    }

    #[test]
    fn cost_query_appends_user_then_service() {
        let filter = CostFilter::new(month(2024, 1))
            .with_end_date(Some(month(2024, 12)))
            .with_user(Some(Uuid::new_v4()))
            .with_service_name(Some("Netflix".to_string()));
        let builder = cost_query(&filter, month(2025, 6));

        assert_eq!(
            builder.sql(),
            format!("{BASE_SQL} AND user_id = $3 AND LOWER(service_name) = LOWER($4)")
        );
    }

    #[test]
    fn cost_query_numbers_service_filter_without_user() {
        let filter = CostFilter::new(month(2024, 1)).with_service_name(Some("Netflix".to_string()));
        let builder = cost_query(&filter, month(2025, 6));

        assert_eq!(
            builder.sql(),
            format!("{BASE_SQL} AND LOWER(service_name) = LOWER($3)")
        );
    }

    #[test]
    fn service_name_is_bound_verbatim_and_lowered_in_sql() {
        let filter = CostFilter::new(month(2024, 1)).with_service_name(Some("NetFlix".to_string()));
        let predicates = cost_predicates(&filter, month(2025, 6));

        assert_eq!(
            predicates,
            vec![
                CostPredicate::StartsFrom(month(2024, 1)),
                CostPredicate::EndsBy(month(2025, 6)),
                CostPredicate::ServiceName("NetFlix".to_string()),
            ]
        );

        let sql = cost_query(&filter, month(2025, 6)).sql().to_string();
        assert!(sql.ends_with("AND LOWER(service_name) = LOWER($3)"));
        assert!(!sql.to_lowercase().contains("netflix"));
    }

    #[test]
    fn open_filter_binds_today_as_end() {
        let filter = CostFilter::new(month(2024, 1)).with_user(Some(Uuid::nil()));
        let predicates = cost_predicates(&filter, month(2025, 6));

        assert_eq!(predicates[1], CostPredicate::EndsBy(month(2025, 6)));
        assert_eq!(predicates[2], CostPredicate::User(Uuid::nil()));
    }

    #[test]
    fn cost_query_never_inlines_values() {
        let hostile = "x'); DROP TABLE subscriptions; --";
        let filter = CostFilter::new(month(2024, 1)).with_service_name(Some(hostile.to_string()));
        let builder = cost_query(&filter, month(2025, 6));

        assert!(!builder.sql().contains(hostile));
        assert!(!builder.sql().contains("2024"));
    }
}
