//! Subscription tracking service: HTTP handlers, orchestration and configuration.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod services;

pub const SERVICE_NAME: &str = "subscription-service";
