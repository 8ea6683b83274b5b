use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::application_dto::{ApplyPayload, UpdateStatusPayload},
    error::Result,
    models::application::{Application, ApplicationDetail},
    policy::Principal,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = ApplyPayload,
    responses(
        (status = 201, description = "Application submitted", body = Json<Application>),
        (status = 400, description = "No candidate profile"),
        (status = 404, description = "Job not found or closed"),
        (status = 409, description = "Already applied")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ApplyPayload>,
) -> Result<impl IntoResponse> {
    let application = state.applications.apply(&principal, payload.job_id).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    responses(
        (status = 200, description = "Applications visible to the caller", body = Json<Vec<ApplicationDetail>>)
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.applications.list(&principal).await?))
}

#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.applications.get(&principal, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Json<ApplicationDetail>),
        (status = 403, description = "Not the company that posted the job"),
        (status = 409, description = "Transition not allowed")
    )
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse> {
    let detail = state
        .applications
        .update_status(&principal, id, payload.status)
        .await?;
    Ok(Json(detail))
}

#[axum::debug_handler]
pub async fn delete_application(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.applications.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/applications/resumes",
    responses(
        (status = 200, description = "ZIP of applicant resumes", content_type = "application/zip"),
        (status = 403, description = "Companies only")
    )
)]
#[axum::debug_handler]
pub async fn download_resumes(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    let archive = state.applications.resume_archive(&principal).await?;
    let filename = format!("resumes_{}.zip", chrono::Utc::now().format("%Y%m%d"));
    let disposition = format!("attachment; filename=\"{}\"", filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive,
    ))
}
