//! OpenAPI 3 description of the subscription routes.
//!
//! Body and response schemas come from the `schemars` derives on the DTOs;
//! query parameters are listed by hand because they travel as dashed names.

use actix_web::HttpResponse;
use schemars::gen::{SchemaGenerator, SchemaSettings};
use serde_json::{json, Value};

use subtrack_models::{
    CostResponse, CreateSubscriptionRequest, CreatedResponse, StatusResponse,
    SubscriptionResponse, UpdateSubscriptionRequest,
};

use crate::SERVICE_NAME;

fn schema_ref<T: schemars::JsonSchema>(gen: &mut SchemaGenerator) -> Value {
    serde_json::to_value(gen.subschema_for::<T>()).unwrap_or(Value::Null)
}

fn query_param(name: &str, required: bool, description: &str, format: Option<&str>) -> Value {
    let mut schema = json!({ "type": "string" });
    if let Some(format) = format {
        schema["format"] = json!(format);
    }
    json!({
        "name": name,
        "in": "query",
        "required": required,
        "description": description,
        "schema": schema
    })
}

fn json_body(schema: Value) -> Value {
    json!({ "required": true, "content": { "application/json": { "schema": schema } } })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({ "description": description, "content": { "application/json": { "schema": schema } } })
}

fn error_response(description: &str) -> Value {
    json!({ "description": description })
}

pub fn build_openapi() -> Value {
    let mut gen = SchemaSettings::openapi3().into_generator();

    let create_body = schema_ref::<CreateSubscriptionRequest>(&mut gen);
    let update_body = schema_ref::<UpdateSubscriptionRequest>(&mut gen);
    let created = schema_ref::<CreatedResponse>(&mut gen);
    let status = schema_ref::<StatusResponse>(&mut gen);
    let subscriptions = json!({ "type": "array", "items": schema_ref::<SubscriptionResponse>(&mut gen) });
    let cost = schema_ref::<CostResponse>(&mut gen);

    let month = "Month in MM-YYYY form";

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "description": "CRUD for user subscriptions and aggregated cost over a period"
        },
        "paths": {
            "/api/v1/subscriptions/create-subscription": {
                "post": {
                    "summary": "Create a subscription",
                    "requestBody": json_body(create_body),
                    "responses": {
                        "201": json_response("Subscription created", created),
                        "400": error_response("Malformed JSON"),
                        "422": error_response("Validation failed"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/api/v1/subscriptions/get-subscription": {
                "get": {
                    "summary": "List the subscriptions of a user",
                    "parameters": [query_param("user-id", true, "Owner of the subscriptions", Some("uuid"))],
                    "responses": {
                        "200": json_response("Subscriptions of the user, possibly empty", subscriptions),
                        "400": error_response("Missing or invalid user-id"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/api/v1/subscriptions/update-subscription": {
                "put": {
                    "summary": "Update a subscription",
                    "requestBody": json_body(update_body),
                    "responses": {
                        "202": json_response("Update accepted", status.clone()),
                        "400": error_response("Malformed JSON or validation failed"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/api/v1/subscriptions/delete-subscription": {
                "delete": {
                    "summary": "Delete a subscription",
                    "parameters": [query_param("subscription-id", true, "Subscription to delete", Some("uuid"))],
                    "responses": {
                        "200": json_response("Subscription deleted", status),
                        "400": error_response("Missing or invalid subscription-id"),
                        "404": error_response("Subscription not found"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/api/v1/subscriptions/calculate-cost": {
                "get": {
                    "summary": "Total price of subscriptions inside a period",
                    "parameters": [
                        query_param("start-date", true, month, None),
                        query_param("end-date", false, "Month in MM-YYYY form, defaults to now", None),
                        query_param("user-id", false, "Only this user's subscriptions", Some("uuid")),
                        query_param("service-name", false, "Only this service, case-insensitive", None)
                    ],
                    "responses": {
                        "200": json_response("Total cost", cost),
                        "400": error_response("Invalid query parameters"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Liveness and database reachability",
                    "responses": { "200": error_response("Service is up") }
                }
            }
        },
        "components": {
            "schemas": gen.definitions()
        }
    })
}

pub async fn openapi_document() -> HttpResponse {
    HttpResponse::Ok().json(build_openapi())
}
