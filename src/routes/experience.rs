use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::profile_dto::{ExperiencePayload, UpdateExperiencePayload},
    error::Result,
    models::experience::Experience,
    policy::Principal,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/experiences",
    responses(
        (status = 200, description = "Caller's work history", body = Json<Vec<Experience>>),
        (status = 400, description = "No candidate profile yet")
    )
)]
#[axum::debug_handler]
pub async fn list_experiences(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.experiences.list(&principal).await?))
}

#[utoipa::path(
    post,
    path = "/api/experiences",
    request_body = ExperiencePayload,
    responses(
        (status = 201, description = "Experience added", body = Json<Experience>),
        (status = 400, description = "Invalid payload or no candidate profile")
    )
)]
#[axum::debug_handler]
pub async fn create_experience(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ExperiencePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let row = state.experiences.create(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[axum::debug_handler]
pub async fn get_experience(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.experiences.get(&principal, id).await?))
}

#[axum::debug_handler]
pub async fn update_experience(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExperiencePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(state.experiences.update(&principal, id, payload).await?))
}

#[axum::debug_handler]
pub async fn delete_experience(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.experiences.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
