use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::job_dto::{CreateJobPayload, JobListQuery, JobPage, JobWrite, TopicStats, UpdateJobPayload},
    error::{Error, Result},
    models::job::Job,
    policy::Principal,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(
        ("keyword" = Option<String>, Query, description = "Title contains"),
        ("location" = Option<String>, Query, description = "Location contains"),
        ("search" = Option<String>, Query, description = "Title, location or company contains"),
        ("job_type" = Option<String>, Query, description = "Exact job type"),
        ("education" = Option<String>, Query, description = "Exact education level"),
        ("experience" = Option<String>, Query, description = "Exact experience level"),
        ("it_industry" = Option<String>, Query, description = "Exact industry"),
        ("min_salary" = Option<i32>, Query, description = "Minimum salary"),
        ("max_salary" = Option<i32>, Query, description = "Maximum salary"),
        ("page" = Option<usize>, Query, description = "Page number"),
        ("page_size" = Option<usize>, Query, description = "Items per page, max 100")
    ),
    responses(
        (status = 200, description = "Open jobs", body = Json<JobPage>)
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.jobs.list(&principal, &query).await?))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job posted", body = Json<Job>),
        (status = 200, description = "Last date already passed; nothing stored", body = Json<JobWrite>),
        (status = 400, description = "Invalid payload or no company profile"),
        (status = 409, description = "Title already used by this company")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = match state.jobs.create(&principal, payload).await? {
        JobWrite::Saved { job } => (StatusCode::CREATED, Json(job)).into_response(),
        expired => (StatusCode::OK, Json(expired)).into_response(),
    };
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job found", body = Json<Job>),
        (status = 404, description = "Job not found or no longer open")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.jobs.get(&principal, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job saved, or removed because it expired", body = Json<JobWrite>),
        (status = 403, description = "Not the owning company"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(state.jobs.update(&principal, id, payload).await?))
}

#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.jobs.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn my_jobs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.jobs.company_jobs(&principal).await?))
}

#[utoipa::path(
    get,
    path = "/api/jobs/stats/{topic}",
    params(
        ("topic" = String, Path, description = "Title fragment")
    ),
    responses(
        (status = 200, description = "Aggregates over open jobs", body = Json<TopicStats>),
        (status = 404, description = "No job matches the topic")
    )
)]
#[axum::debug_handler]
pub async fn topic_stats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(topic): Path<String>,
) -> Result<impl IntoResponse> {
    let stats = state
        .jobs
        .topic_stats(&principal, &topic)
        .await?
        .ok_or(Error::NotFound("Jobs for this topic"))?;
    Ok(Json(stats))
}
