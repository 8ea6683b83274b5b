use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::auth_dto::{
        AccessResponse, LoginPayload, LoginResponse, MessageResponse, RefreshPayload,
        RegisterPayload, RegisterResponse,
    },
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created, activation link mailed", body = Json<RegisterResponse>),
        (status = 400, description = "Invalid payload or email already registered")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let created = state.accounts.register(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/auth/activate/{uidb64}/{token}",
    params(
        ("uidb64" = String, Path, description = "Encoded user id"),
        ("token" = String, Path, description = "Activation token")
    ),
    responses(
        (status = 200, description = "Account activated", body = Json<MessageResponse>),
        (status = 400, description = "Invalid activation link")
    )
)]
#[axum::debug_handler]
pub async fn activate(
    State(state): State<AppState>,
    Path((uidb64, token)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    state.accounts.activate(&uidb64, &token).await?;
    Ok(Json(MessageResponse::new(
        "Account activated successfully.",
    )))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token pair issued", body = Json<LoginResponse>),
        (status = 401, description = "Invalid credentials or inactive account")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let tokens = state.accounts.login(payload).await?;
    Ok(Json(tokens))
}

#[utoipa::path(
    post,
    path = "/api/auth/token/refresh",
    request_body = RefreshPayload,
    responses(
        (status = 200, description = "New access token", body = Json<AccessResponse>),
        (status = 401, description = "Refresh token invalid or expired")
    )
)]
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let access = state.accounts.refresh(&payload.refresh).await?;
    Ok(Json(access))
}
