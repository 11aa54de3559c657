use actix_web::{web, HttpResponse};

use crate::services::SubscriptionService;
use crate::SERVICE_NAME;

pub async fn health_check(service: web::Data<SubscriptionService>) -> HttpResponse {
    let db_status = if service.is_store_reachable().await {
        "connected"
    } else {
        "disconnected"
    };

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "database": db_status,
        "timestamp": chrono::Utc::now()
    }))
}
