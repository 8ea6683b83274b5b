use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::json;

use crate::database::StoreError;
use crate::models::application::ApplicationStatus;
use crate::services::mail_service::MailError;
use crate::services::payment_gateway::GatewayError;
use crate::services::storage_service::StorageError;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes every error collapses into at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    PermissionDenied,
    NotFound,
    Conflict,
    Authentication,
    Gateway,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("A user with this email already exists.")]
    DuplicateEmail,

    #[error("A profile already exists for this user.")]
    DuplicateProfile,

    #[error("You have already posted a job with the same title.")]
    DuplicateJobTitle,

    #[error("You have already applied for this job.")]
    DuplicateApplication,

    #[error("An active subscription already exists for this plan.")]
    DuplicateActiveSubscription,

    #[error("Payment already exists for this subscription.")]
    DuplicatePayment,

    #[error("Cannot move application from {from} to {to}.")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("User does not have a company profile.")]
    NoCompanyProfile,

    #[error("Candidate profile not found.")]
    NoCandidateProfile,

    #[error("Invalid plan_id.")]
    InvalidPlan,

    #[error("Invalid activation link.")]
    InvalidLink,

    #[error("Job not found.")]
    JobNotFound,

    #[error("Subscription not found.")]
    SubscriptionNotFound,

    #[error("{0} not found.")]
    NotFound(&'static str),

    #[error("You do not have permission to perform this action.")]
    PermissionDenied,

    #[error("Authentication required: {0}")]
    Unauthenticated(&'static str),

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("User account is disabled.")]
    AccountDisabled,

    #[error("Payment verification failed.")]
    PaymentVerificationFailed,

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Mail transport error: {0}")]
    Mail(#[from] MailError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_)
            | Error::InvalidInput(_)
            | Error::DuplicateEmail
            | Error::NoCompanyProfile
            | Error::NoCandidateProfile
            | Error::InvalidPlan
            | Error::InvalidLink
            | Error::Multipart(_) => ErrorKind::Validation,
            Error::DuplicateProfile
            | Error::DuplicateJobTitle
            | Error::DuplicateApplication
            | Error::DuplicateActiveSubscription
            | Error::DuplicatePayment
            | Error::InvalidTransition { .. } => ErrorKind::Conflict,
            Error::JobNotFound | Error::SubscriptionNotFound | Error::NotFound(_) => {
                ErrorKind::NotFound
            }
            Error::PermissionDenied => ErrorKind::PermissionDenied,
            Error::Unauthenticated(_) | Error::InvalidCredentials | Error::AccountDisabled => {
                ErrorKind::Authentication
            }
            Error::PaymentVerificationFailed | Error::Gateway(_) | Error::Mail(_) => {
                ErrorKind::Gateway
            }
            Error::Config(_)
            | Error::Storage(_)
            | Error::Database(_)
            | Error::Store(_)
            | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Gateway => match self {
                // The caller sent a bad signature; nothing upstream failed.
                Error::PaymentVerificationFailed => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a store conflict onto the domain duplicate it backstops.
    pub fn on_conflict(err: StoreError, duplicate: Error) -> Error {
        match err {
            StoreError::Conflict(_) => duplicate,
            other => Error::from(other),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let kind = self.kind();
        let error_message = match kind {
            ErrorKind::Internal => {
                tracing::error!(error = %self, "request failed");
                "An unexpected error occurred".to_string()
            }
            ErrorKind::Authentication => match &self {
                Error::AccountDisabled => self.to_string(),
                Error::Unauthenticated(_) => self.to_string(),
                _ => Error::InvalidCredentials.to_string(),
            },
            ErrorKind::Gateway => {
                tracing::warn!(error = %self, "external collaborator failed");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({ "error": error_message, "code": kind }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource"),
            other => Error::Database(other),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Error::NotFound("Resource"),
            other => Error::Store(other),
        }
    }
}
