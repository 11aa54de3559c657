use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use subtrack_database::Subscription;
use subtrack_models::{
    parse_uuid, CostPeriod, CostQuery, CostResponse, CreateSubscriptionRequest, CreatedResponse,
    MonthYear, StatusResponse, SubscriptionIdQuery, SubscriptionResponse,
    UpdateSubscriptionRequest, UserQuery,
};

use crate::errors::ServiceError;
use crate::services::SubscriptionService;

fn required_uuid(name: &str, value: Option<&str>) -> Result<Uuid, ServiceError> {
    let value = value.ok_or_else(|| ServiceError::BadRequest(format!("Missing {}", name)))?;
    parse_uuid(value)
        .ok_or_else(|| ServiceError::BadRequest(format!("Invalid {} format, expected a UUID", name)))
}

fn to_response(subscription: Subscription) -> SubscriptionResponse {
    SubscriptionResponse {
        id: subscription.id,
        service_name: subscription.service_name,
        price: subscription.price,
        user_id: subscription.user_id,
        start_date: MonthYear::from_date(subscription.start_date),
        end_date: subscription.end_date.map(MonthYear::from_date),
        created_at: subscription.created_at,
    }
}

pub async fn create_subscription(
    service: web::Data<SubscriptionService>,
    request: web::Json<CreateSubscriptionRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = request.into_inner();
    request
        .validate()
        .map_err(|errors| ServiceError::unprocessable(&errors))?;

    let id = service.create(request).await?;
    Ok(HttpResponse::Created().json(CreatedResponse::new(id)))
}

pub async fn get_subscriptions(
    service: web::Data<SubscriptionService>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = required_uuid("user-id", query.user_id.as_deref())?;

    let subscriptions: Vec<SubscriptionResponse> = service
        .list_for_user(user_id)
        .await?
        .into_iter()
        .map(to_response)
        .collect();

    Ok(HttpResponse::Ok().json(subscriptions))
}

pub async fn update_subscription(
    service: web::Data<SubscriptionService>,
    request: web::Json<UpdateSubscriptionRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = request.into_inner();
    request
        .validate()
        .map_err(|errors| ServiceError::validation(&errors))?;

    service.update(request).await?;
    Ok(HttpResponse::Accepted().json(StatusResponse::updated()))
}

pub async fn delete_subscription(
    service: web::Data<SubscriptionService>,
    query: web::Query<SubscriptionIdQuery>,
) -> Result<HttpResponse, ServiceError> {
    let id = required_uuid("subscription-id", query.subscription_id.as_deref())?;

    service.delete(id).await?;
    Ok(HttpResponse::Ok().json(StatusResponse::deleted()))
}

pub async fn calculate_cost(
    service: web::Data<SubscriptionService>,
    query: web::Query<CostQuery>,
) -> Result<HttpResponse, ServiceError> {
    let query = query.into_inner();
    query
        .validate()
        .map_err(|errors| ServiceError::validation(&errors))?;

    let total_cost = service.total_cost(&query).await?;

    Ok(HttpResponse::Ok().json(CostResponse {
        total_cost,
        period: CostPeriod {
            start: query.start_date,
            end: query.end_date,
        },
    }))
}

pub fn configure_subscription_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/subscriptions")
            .route("/create-subscription", web::post().to(create_subscription))
            .route("/get-subscription", web::get().to(get_subscriptions))
            .route("/update-subscription", web::put().to(update_subscription))
            .route("/delete-subscription", web::delete().to(delete_subscription))
            .route("/calculate-cost", web::get().to(calculate_cost)),
    );
}
