use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::billing_dto::{CreatePaymentPayload, CreatePlanPayload, SubscribePayload, VerifyPaymentPayload},
    error::Result,
    models::subscription::{Payment, Subscription, SubscriptionPlan},
    policy::Principal,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/plans",
    responses(
        (status = 200, description = "Subscription plans", body = Json<Vec<SubscriptionPlan>>)
    )
)]
#[axum::debug_handler]
pub async fn list_plans(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.billing.list_plans(&principal).await?))
}

#[axum::debug_handler]
pub async fn get_plan(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.billing.get_plan(&principal, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/plans",
    request_body = CreatePlanPayload,
    responses(
        (status = 201, description = "Plan created", body = Json<SubscriptionPlan>),
        (status = 403, description = "Admins only")
    )
)]
#[axum::debug_handler]
pub async fn create_plan(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreatePlanPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let plan = state.billing.create_plan(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions",
    request_body = SubscribePayload,
    responses(
        (status = 201, description = "Subscription started", body = Json<Subscription>),
        (status = 400, description = "Unknown plan or no company profile"),
        (status = 409, description = "Already subscribed to this plan")
    )
)]
#[axum::debug_handler]
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<SubscribePayload>,
) -> Result<impl IntoResponse> {
    let subscription = state.billing.subscribe(&principal, payload.plan_id).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

#[axum::debug_handler]
pub async fn my_subscriptions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.billing.my_subscriptions(&principal).await?))
}

#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = CreatePaymentPayload,
    responses(
        (status = 201, description = "Gateway order opened", body = Json<Payment>),
        (status = 404, description = "Subscription not found"),
        (status = 409, description = "Payment already exists"),
        (status = 502, description = "Gateway failure")
    )
)]
#[axum::debug_handler]
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreatePaymentPayload>,
) -> Result<impl IntoResponse> {
    let payment = state
        .billing
        .create_payment(&principal, payload.subscription_id)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentPayload,
    responses(
        (status = 200, description = "Payment confirmed", body = Json<Payment>),
        (status = 400, description = "Signature mismatch"),
        (status = 404, description = "Payment not found")
    )
)]
#[axum::debug_handler]
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<VerifyPaymentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(state.billing.verify_payment(&principal, payload).await?))
}
