use serde::Deserialize;
use uuid::Uuid;

use crate::models::application::ApplicationStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyPayload {
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: ApplicationStatus,
}
