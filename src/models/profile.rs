use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CompanyProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub industry: String,
    pub location: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub birthday: Option<NaiveDate>,
    pub location: String,
    pub skills: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub resume: Option<String>,
    pub image: Option<String>,
}

/// Which blob slot of a profile an upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFile {
    Resume,
    CandidateImage,
    CompanyImage,
}

impl ProfileFile {
    pub fn prefix(&self) -> &'static str {
        match self {
            ProfileFile::Resume => "resumes",
            ProfileFile::CandidateImage => "candidate_images",
            ProfileFile::CompanyImage => "company_images",
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            ProfileFile::Resume => &["pdf", "doc", "docx", "txt", "rtf"],
            ProfileFile::CandidateImage | ProfileFile::CompanyImage => {
                &["jpg", "jpeg", "png", "webp"]
            }
        }
    }
}
