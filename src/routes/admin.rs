use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use crate::{error::Result, models::user::User, policy::Principal, AppState};

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All accounts, newest first", body = Json<Vec<User>>),
        (status = 403, description = "Admins only")
    )
)]
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.accounts.list_users(&principal).await?))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.accounts.delete_user(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/inactive",
    responses(
        (status = 200, description = "Number of inactive accounts removed"),
        (status = 403, description = "Admins only")
    )
)]
#[axum::debug_handler]
pub async fn purge_inactive_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    let removed = state.accounts.purge_inactive(&principal).await?;
    Ok(Json(json!({ "removed": removed })))
}

#[axum::debug_handler]
pub async fn list_companies(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.profiles.admin_list_companies(&principal).await?))
}

#[axum::debug_handler]
pub async fn list_candidates(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.profiles.admin_list_candidates(&principal).await?))
}

#[axum::debug_handler]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.billing.admin_subscriptions(&principal).await?))
}

#[axum::debug_handler]
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.billing.admin_payments(&principal).await?))
}
