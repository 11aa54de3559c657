// Repository pattern for database operations

pub mod subscription;

pub use subscription::PgSubscriptionRepository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{CostFilter, NewSubscription, Subscription, SubscriptionUpdate};

/// Storage operations on subscriptions.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a new row and return its generated id
    async fn insert(&self, subscription: NewSubscription) -> Result<Uuid, RepositoryError>;

    /// All rows owned by `user_id`, oldest first
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Subscription>, RepositoryError>;

    /// Apply a partial update; returns the number of rows touched (0 or 1)
    async fn update(&self, id: Uuid, changes: SubscriptionUpdate) -> Result<u64, RepositoryError>;

    /// Delete by id, `NotFound` when nothing matched
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Sum of `price` over rows matching `filter`, 0 when none do
    async fn total_cost(&self, filter: &CostFilter) -> Result<i64, RepositoryError>;

    /// Round-trip to the store
    async fn ping(&self) -> Result<(), RepositoryError>;
}
