use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;

use subtrack_database::{Database, SubscriptionRepository};
use subtrack_middleware::create_permissive_cors;
use subtrack_observability::{info, init_tracing, observability, TracingConfig};
use subtrack_subscriptions::{
    config::AppConfig, handlers, services::SubscriptionService, SERVICE_NAME,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    init_tracing(TracingConfig::for_service(SERVICE_NAME));

    let config = AppConfig::from_env();
    let root = tracing::info_span!("app", service = SERVICE_NAME);

    info!(
        parent: &root,
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.name,
        "Connecting to database"
    );
    let database = Database::connect(&config.database).await?;
    database.migrate().await?;
    info!(parent: &root, "Database ready");

    info!(
        parent: &root,
        host = %config.cache.host,
        port = config.cache.port,
        db = config.cache.db,
        "Cache configured but not in use"
    );

    let repository: Arc<dyn SubscriptionRepository> = Arc::new(database.subscriptions(&root));
    let service = web::Data::new(SubscriptionService::new(repository, &root));

    let bind = (config.server.host.clone(), config.server.port);
    info!(parent: &root, host = %bind.0, port = bind.1, "Starting HTTP server");

    let handlers_span = root.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(create_permissive_cors())
            .wrap(observability(SERVICE_NAME))
            .configure(handlers::configure_routes(&handlers_span))
    })
    .bind(bind)
    .with_context(|| {
        format!(
            "failed to bind {}:{}",
            config.server.host, config.server.port
        )
    })?
    .run()
    .await?;

    info!(parent: &root, "Server stopped");
    Ok(())
}
