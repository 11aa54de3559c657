use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn, Span};
use uuid::Uuid;

use subtrack_database::{
    CostFilter, NewSubscription, RepositoryError, Subscription, SubscriptionRepository,
    SubscriptionUpdate,
};
use subtrack_models::{
    parse_uuid, CostQuery, CreateSubscriptionRequest, MonthParseError, MonthYear,
    UpdateSubscriptionRequest,
};

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("invalid {field}: {source}")]
    InvalidDate {
        field: &'static str,
        #[source]
        source: MonthParseError,
    },

    #[error("invalid {field} '{value}': expected a UUID")]
    InvalidId { field: &'static str, value: String },

    #[error("subscription {0} not found")]
    NotFound(Uuid),

    #[error("failed to {context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl SubscriptionError {
    /// Wrap a repository failure, keeping `NotFound` as its own kind.
    fn from_repository(context: &'static str, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => SubscriptionError::NotFound(id),
            source => SubscriptionError::Storage { context, source },
        }
    }
}

/// Orchestrates request payloads into repository calls.
#[derive(Clone)]
pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepository>,
    logger: Span,
}

impl SubscriptionService {
    pub fn new(repo: Arc<dyn SubscriptionRepository>, logger: &Span) -> Self {
        Self {
            repo,
            logger: tracing::info_span!(parent: logger, "service"),
        }
    }

    fn repository_error(&self, context: &'static str, err: RepositoryError) -> SubscriptionError {
        let err = SubscriptionError::from_repository(context, err);
        if let SubscriptionError::Storage { .. } = err {
            error!(parent: &self.logger, error = %err, "Storage failure");
        }
        err
    }

    fn parse_month(&self, field: &'static str, value: &str) -> Result<MonthYear, SubscriptionError> {
        MonthYear::parse(value).map_err(|source| {
            warn!(parent: &self.logger, field, date = value, "Invalid date format");
            SubscriptionError::InvalidDate { field, source }
        })
    }

    fn parse_optional_month(
        &self,
        field: &'static str,
        value: Option<&str>,
    ) -> Result<Option<MonthYear>, SubscriptionError> {
        value.map(|v| self.parse_month(field, v)).transpose()
    }

    fn parse_id(&self, field: &'static str, value: &str) -> Result<Uuid, SubscriptionError> {
        parse_uuid(value).ok_or_else(|| {
            warn!(parent: &self.logger, field, value, "Invalid UUID");
            SubscriptionError::InvalidId {
                field,
                value: value.to_string(),
            }
        })
    }

    pub async fn create(&self, request: CreateSubscriptionRequest) -> Result<Uuid, SubscriptionError> {
        info!(
            parent: &self.logger,
            user_id = %request.user_id,
            service = %request.service_name,
            "Creating subscription"
        );

        let user_id = self.parse_id("user_id", &request.user_id)?;
        let start_date = self.parse_month("start_date", &request.start_date)?;
        let end_date = self.parse_optional_month("end_date", request.end_date.as_deref())?;

        let subscription = NewSubscription {
            service_name: request.service_name,
            price: request.price,
            user_id,
            start_date: start_date.into(),
            end_date: end_date.map(Into::into),
        };

        self.repo
            .insert(subscription)
            .await
            .map_err(|e| self.repository_error("create subscription", e))
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Subscription>, SubscriptionError> {
        info!(parent: &self.logger, %user_id, "Getting user subscriptions");

        let subscriptions = self
            .repo
            .find_by_user(user_id)
            .await
            .map_err(|e| self.repository_error("get subscriptions", e))?;

        info!(parent: &self.logger, %user_id, count = subscriptions.len(), "Retrieved subscriptions");
        Ok(subscriptions)
    }

    /// Every field present on the request is written; `end_date` is left as
    /// stored when the request omits it.
    pub async fn update(&self, request: UpdateSubscriptionRequest) -> Result<(), SubscriptionError> {
        info!(
            parent: &self.logger,
            subscription_id = %request.subscription_id,
            service = %request.service_name,
            "Updating subscription"
        );

        let id = self.parse_id("subscription_id", &request.subscription_id)?;
        let start_date = self.parse_month("start_date", &request.start_date)?;
        let end_date = self.parse_optional_month("end_date", request.end_date.as_deref())?;

        let changes = SubscriptionUpdate {
            service_name: Some(request.service_name),
            price: Some(request.price),
            start_date: Some(start_date.into()),
            end_date: end_date.map(Into::into),
        };

        let rows = self
            .repo
            .update(id, changes)
            .await
            .map_err(|e| self.repository_error("update subscription", e))?;

        info!(parent: &self.logger, subscription_id = %id, rows, "Update applied");
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), SubscriptionError> {
        info!(parent: &self.logger, subscription_id = %id, "Deleting subscription");

        self.repo
            .delete(id)
            .await
            .map_err(|e| self.repository_error("delete subscription", e))
    }

    pub async fn total_cost(&self, query: &CostQuery) -> Result<i64, SubscriptionError> {
        info!(
            parent: &self.logger,
            user_id = ?query.user_id,
            service = ?query.service_name,
            start_date = %query.start_date,
            end_date = ?query.end_date,
            "Calculating subscriptions cost"
        );

        let start_date = self.parse_month("start_date", &query.start_date)?;
        let end_date = self.parse_optional_month("end_date", query.end_date.as_deref())?;
        let user_id = query
            .user_id
            .as_deref()
            .map(|v| self.parse_id("user_id", v))
            .transpose()?;

        let filter = CostFilter::new(start_date.into())
            .with_end_date(end_date.map(Into::into))
            .with_user(user_id)
            .with_service_name(query.service_name.clone());

        self.repo
            .total_cost(&filter)
            .await
            .map_err(|e| self.repository_error("calculate subscriptions cost", e))
    }

    /// Whether the store answers.
    pub async fn is_store_reachable(&self) -> bool {
        match self.repo.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(parent: &self.logger, error = %e, "Database health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_not_found_keeps_its_kind() {
        let id = Uuid::new_v4();
        let err = SubscriptionError::from_repository("delete subscription", RepositoryError::NotFound(id));
        assert!(matches!(err, SubscriptionError::NotFound(found) if found == id));
    }

    #[test]
    fn storage_errors_gain_context() {
        let err = SubscriptionError::from_repository(
            "get subscriptions",
            RepositoryError::Storage(subtrack_database::sqlx::Error::PoolTimedOut),
        );
        assert!(matches!(err, SubscriptionError::Storage { context: "get subscriptions", .. }));
        assert!(err.to_string().starts_with("failed to get subscriptions:"));
    }

    #[test]
    fn invalid_date_names_the_field() {
        let source = MonthYear::parse("2024-01").unwrap_err();
        let err = SubscriptionError::InvalidDate {
            field: "start_date",
            source,
        };
        assert_eq!(
            err.to_string(),
            "invalid start_date: invalid date format '2024-01', expected MM-YYYY"
        );
    }
}
