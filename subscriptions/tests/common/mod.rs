#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use subtrack_database::{
    sqlx, CostFilter, NewSubscription, RepositoryError, Subscription, SubscriptionRepository,
    SubscriptionUpdate,
};
use subtrack_middleware::create_permissive_cors;
use subtrack_observability::{observability, Span};
use subtrack_subscriptions::{handlers, services::SubscriptionService, SERVICE_NAME};

/// Keep-if-absent rule of the `COALESCE` update, applied to a row in memory.
pub fn apply_update(changes: &SubscriptionUpdate, row: &mut Subscription) {
    if let Some(service_name) = &changes.service_name {
        row.service_name = service_name.clone();
    }
    if let Some(price) = changes.price {
        row.price = price;
    }
    if let Some(start_date) = changes.start_date {
        row.start_date = start_date;
    }
    if let Some(end_date) = changes.end_date {
        row.end_date = Some(end_date);
    }
}

/// In-memory reading of the cost query's `WHERE` clause. ASCII case folding
/// only; the HTTP tests use ASCII service names.
pub fn cost_matches(filter: &CostFilter, row: &Subscription, today: NaiveDate) -> bool {
    let within_period = row.start_date >= filter.start_date
        && row
            .end_date
            .map_or(true, |end| end <= filter.effective_end_date(today));
    let user_matches = filter.user_id.map_or(true, |user_id| row.user_id == user_id);
    let service_matches = filter
        .service_name
        .as_ref()
        .map_or(true, |name| row.service_name.eq_ignore_ascii_case(name));

    within_period && user_matches && service_matches
}

/// Repository keeping rows in memory, with the same filter semantics as Postgres.
#[derive(Default)]
pub struct InMemoryRepository {
    rows: Mutex<Vec<Subscription>>,
    failing: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following call fail like a lost connection.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::Storage(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryRepository {
    async fn insert(&self, subscription: NewSubscription) -> Result<Uuid, RepositoryError> {
        self.check()?;
        let id = Uuid::new_v4();
        self.rows.lock().unwrap().push(Subscription {
            id,
            service_name: subscription.service_name,
            price: subscription.price,
            user_id: subscription.user_id,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Subscription>, RepositoryError> {
        self.check()?;
        let mut found: Vec<Subscription> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(found)
    }

    async fn update(&self, id: Uuid, changes: SubscriptionUpdate) -> Result<u64, RepositoryError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|s| s.id == id) {
            Some(row) => {
                apply_update(&changes, row);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let position = rows
            .iter()
            .position(|s| s.id == id)
            .ok_or(RepositoryError::NotFound(id))?;
        rows.remove(position);
        Ok(())
    }

    async fn total_cost(&self, filter: &CostFilter) -> Result<i64, RepositoryError> {
        self.check()?;
        let today = Utc::now().date_naive();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| cost_matches(filter, s, today))
            .map(|s| i64::from(s.price))
            .sum())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check()
    }
}

/// The service's application, wired like `main` but over `repo`.
pub fn app(
    repo: Arc<InMemoryRepository>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let repo: Arc<dyn SubscriptionRepository> = repo;
    let service = SubscriptionService::new(repo, &Span::none());

    App::new()
        .app_data(web::Data::new(service))
        .wrap(create_permissive_cors())
        .wrap(observability(SERVICE_NAME))
        .configure(handlers::configure_routes(&Span::none()))
}
