pub mod subscription;

pub use subscription::{SubscriptionError, SubscriptionService};
