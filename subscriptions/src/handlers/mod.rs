pub mod docs;
pub mod health;
pub mod subscriptions;

use actix_web::web;
use tracing::{warn, Span};

use crate::errors::ServiceError;

/// Mount every route of the service. Rejected bodies and query strings are
/// logged under a `handlers` child of `logger`.
pub fn configure_routes(logger: &Span) -> impl FnOnce(&mut web::ServiceConfig) {
    let logger = tracing::info_span!(parent: logger, "handlers");

    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(json_config(logger.clone()))
            .app_data(query_config(logger))
            .route("/health", web::get().to(health::health_check))
            .route("/api/v1/docs/openapi.json", web::get().to(docs::openapi_document))
            .configure(subscriptions::configure_subscription_routes);
    }
}

/// Malformed bodies answer 400 with the same envelope as every other error.
pub fn json_config(logger: Span) -> web::JsonConfig {
    web::JsonConfig::default().error_handler(move |err, req| {
        warn!(parent: &logger, path = %req.path(), error = %err, "Rejected request body");
        ServiceError::BadRequest("Invalid JSON format".to_string()).into()
    })
}

pub fn query_config(logger: Span) -> web::QueryConfig {
    web::QueryConfig::default().error_handler(move |err, req| {
        warn!(parent: &logger, path = %req.path(), error = %err, "Rejected query string");
        ServiceError::BadRequest("Invalid query parameters".to_string()).into()
    })
}
