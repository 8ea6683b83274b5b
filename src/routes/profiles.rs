use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use bytes::Bytes;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::profile_dto::{
        CandidateProfilePayload, CompanyProfilePayload, PublicCompany,
        UpdateCandidateProfilePayload, UpdateCompanyProfilePayload,
    },
    error::{Error, Result},
    models::profile::{CandidateProfile, CompanyProfile, ProfileFile},
    policy::Principal,
    AppState,
};

/// Pulls the `file` part out of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Bytes)> {
    while let Some(field) = multipart.next_field().await.map_err(Error::Multipart)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await.map_err(Error::Multipart)?;
        return Ok((file_name, data));
    }
    Err(Error::Validation("Missing multipart field `file`.".into()))
}

#[utoipa::path(
    post,
    path = "/api/profiles/company",
    request_body = CompanyProfilePayload,
    responses(
        (status = 201, description = "Company profile created", body = Json<CompanyProfile>),
        (status = 409, description = "Profile already exists")
    )
)]
#[axum::debug_handler]
pub async fn create_company(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CompanyProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state.profiles.create_company(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[utoipa::path(
    get,
    path = "/api/profiles/company/me",
    responses(
        (status = 200, description = "Caller's company profile", body = Json<CompanyProfile>),
        (status = 400, description = "No company profile yet")
    )
)]
#[axum::debug_handler]
pub async fn my_company(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.profiles.my_company(&principal).await?))
}

#[axum::debug_handler]
pub async fn get_company(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.profiles.get_company(&principal, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/profiles/company/{id}",
    params(
        ("id" = Uuid, Path, description = "Company profile ID")
    ),
    request_body = UpdateCompanyProfilePayload,
    responses(
        (status = 200, description = "Company profile updated", body = Json<CompanyProfile>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Profile not found")
    )
)]
#[axum::debug_handler]
pub async fn update_company(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCompanyProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(state.profiles.update_company(&principal, id, payload).await?))
}

#[axum::debug_handler]
pub async fn delete_company(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.profiles.delete_company(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/profiles/company/{id}/image",
    params(
        ("id" = Uuid, Path, description = "Company profile ID")
    ),
    responses(
        (status = 200, description = "Image stored", body = Json<CompanyProfile>),
        (status = 400, description = "Unsupported or empty file")
    )
)]
#[axum::debug_handler]
pub async fn upload_company_image(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (file_name, data) = read_upload(multipart).await?;
    let profile = state
        .profiles
        .attach_company_image(&principal, id, &file_name, data)
        .await?;
    Ok(Json(profile))
}

#[utoipa::path(
    post,
    path = "/api/profiles/candidate",
    request_body = CandidateProfilePayload,
    responses(
        (status = 201, description = "Candidate profile created", body = Json<CandidateProfile>),
        (status = 409, description = "Profile already exists")
    )
)]
#[axum::debug_handler]
pub async fn create_candidate(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CandidateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state.profiles.create_candidate(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[axum::debug_handler]
pub async fn my_candidate(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.profiles.my_candidate(&principal).await?))
}

#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.profiles.get_candidate(&principal, id).await?))
}

#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCandidateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(state.profiles.update_candidate(&principal, id, payload).await?))
}

#[axum::debug_handler]
pub async fn delete_candidate(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.profiles.delete_candidate(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/profiles/candidate/{id}/resume",
    params(
        ("id" = Uuid, Path, description = "Candidate profile ID")
    ),
    responses(
        (status = 200, description = "Resume stored", body = Json<CandidateProfile>),
        (status = 400, description = "Unsupported or empty file"),
        (status = 403, description = "Not the owner")
    )
)]
#[axum::debug_handler]
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (file_name, data) = read_upload(multipart).await?;
    let profile = state
        .profiles
        .attach_candidate_file(&principal, id, ProfileFile::Resume, &file_name, data)
        .await?;
    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn upload_candidate_image(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (file_name, data) = read_upload(multipart).await?;
    let profile = state
        .profiles
        .attach_candidate_file(&principal, id, ProfileFile::CandidateImage, &file_name, data)
        .await?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    responses(
        (status = 200, description = "Public company directory", body = Json<Vec<PublicCompany>>)
    )
)]
#[axum::debug_handler]
pub async fn list_companies(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.profiles.list_public_companies(&principal).await?))
}

#[axum::debug_handler]
pub async fn get_public_company(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.profiles.get_public_company(&principal, id).await?))
}
