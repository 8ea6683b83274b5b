use std::sync::Arc;

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::database::Store;
use crate::dto::profile_dto::{
    CandidateProfilePayload, CompanyProfilePayload, PublicCompany, UpdateCandidateProfilePayload,
    UpdateCompanyProfilePayload,
};
use crate::error::{Error, Result};
use crate::models::profile::{CandidateProfile, CompanyProfile, ProfileFile};
use crate::models::user::Role;
use crate::policy::{self, Capability, Operation, Ownership, Principal};
use crate::services::storage_service::{blob_key, BlobStore};
use crate::utils::validation::{file_extension, sniff_matches};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const EVERYONE: &[Capability] = &[Capability::Company, Capability::Candidate, Capability::Admin];

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn Store>,
    blobs: Arc<dyn BlobStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    pub async fn create_company(
        &self,
        principal: &Principal,
        payload: CompanyProfilePayload,
    ) -> Result<CompanyProfile> {
        let user = principal.require_user()?;
        if user.role != Role::Company {
            return Err(Error::Validation(
                "Only company users can create a company profile.".into(),
            ));
        }
        if self.store.find_company_profile_by_user(user.id).await?.is_some() {
            return Err(Error::DuplicateProfile);
        }
        let profile = CompanyProfile {
            id: Uuid::new_v4(),
            user_id: user.id,
            company_name: payload.company_name.trim().to_string(),
            industry: payload.industry,
            location: payload.location,
            website: payload.website,
            description: payload.description,
            image: None,
        };
        let profile = self
            .store
            .insert_company_profile(&profile)
            .await
            .map_err(|e| Error::on_conflict(e, Error::DuplicateProfile))?;
        info!(profile_id = %profile.id, user_id = %user.id, "company profile created");
        Ok(profile)
    }

    /// Role first, then existence, then ownership.
    async fn owned_company(
        &self,
        principal: &Principal,
        id: Uuid,
        operation: Operation,
    ) -> Result<CompanyProfile> {
        let user = principal.require_user()?;
        policy::require(principal, &[Capability::Company], operation)?;
        let profile = self
            .store
            .find_company_profile(id)
            .await?
            .ok_or(Error::NotFound("Company profile"))?;
        policy::check(
            principal,
            &[Capability::Company],
            operation,
            Ownership::of(profile.user_id, user.id),
        )
        .into_result()?;
        Ok(profile)
    }

    pub async fn my_company(&self, principal: &Principal) -> Result<CompanyProfile> {
        let user = principal.require_user()?;
        policy::require(principal, &[Capability::Company], Operation::Retrieve)?;
        self.store
            .find_company_profile_by_user(user.id)
            .await?
            .ok_or(Error::NoCompanyProfile)
    }

    pub async fn get_company(&self, principal: &Principal, id: Uuid) -> Result<CompanyProfile> {
        self.owned_company(principal, id, Operation::Retrieve).await
    }

    pub async fn update_company(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: UpdateCompanyProfilePayload,
    ) -> Result<CompanyProfile> {
        let mut profile = self.owned_company(principal, id, Operation::Update).await?;
        if let Some(name) = payload.company_name {
            profile.company_name = name.trim().to_string();
        }
        if let Some(industry) = payload.industry {
            profile.industry = industry;
        }
        if let Some(location) = payload.location {
            profile.location = location;
        }
        if payload.website.is_some() {
            profile.website = payload.website;
        }
        if payload.description.is_some() {
            profile.description = payload.description;
        }
        Ok(self.store.update_company_profile(&profile).await?)
    }

    pub async fn delete_company(&self, principal: &Principal, id: Uuid) -> Result<()> {
        let profile = self.owned_company(principal, id, Operation::Delete).await?;
        self.store.delete_company_profile(profile.id).await?;
        info!(profile_id = %profile.id, "company profile deleted");
        Ok(())
    }

    pub async fn create_candidate(
        &self,
        principal: &Principal,
        payload: CandidateProfilePayload,
    ) -> Result<CandidateProfile> {
        let user = principal.require_user()?;
        if user.role != Role::Candidate {
            return Err(Error::Validation(
                "Only candidate users can create a candidate profile.".into(),
            ));
        }
        if self.store.find_candidate_profile_by_user(user.id).await?.is_some() {
            return Err(Error::DuplicateProfile);
        }
        let profile = CandidateProfile {
            id: Uuid::new_v4(),
            user_id: user.id,
            name: payload.name.trim().to_string(),
            birthday: payload.birthday,
            location: payload.location,
            skills: payload.skills,
            experience: payload.experience,
            education: payload.education,
            resume: None,
            image: None,
        };
        let profile = self
            .store
            .insert_candidate_profile(&profile)
            .await
            .map_err(|e| Error::on_conflict(e, Error::DuplicateProfile))?;
        info!(profile_id = %profile.id, user_id = %user.id, "candidate profile created");
        Ok(profile)
    }

    async fn owned_candidate(
        &self,
        principal: &Principal,
        id: Uuid,
        operation: Operation,
    ) -> Result<CandidateProfile> {
        let user = principal.require_user()?;
        policy::require(principal, &[Capability::Candidate], operation)?;
        let profile = self
            .store
            .find_candidate_profile(id)
            .await?
            .ok_or(Error::NotFound("Candidate profile"))?;
        policy::check(
            principal,
            &[Capability::Candidate],
            operation,
            Ownership::of(profile.user_id, user.id),
        )
        .into_result()?;
        Ok(profile)
    }

    pub async fn my_candidate(&self, principal: &Principal) -> Result<CandidateProfile> {
        let user = principal.require_user()?;
        policy::require(principal, &[Capability::Candidate], Operation::Retrieve)?;
        self.store
            .find_candidate_profile_by_user(user.id)
            .await?
            .ok_or(Error::NoCandidateProfile)
    }

    pub async fn get_candidate(&self, principal: &Principal, id: Uuid) -> Result<CandidateProfile> {
        self.owned_candidate(principal, id, Operation::Retrieve).await
    }

    pub async fn update_candidate(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: UpdateCandidateProfilePayload,
    ) -> Result<CandidateProfile> {
        let mut profile = self.owned_candidate(principal, id, Operation::Update).await?;
        if let Some(name) = payload.name {
            profile.name = name.trim().to_string();
        }
        if payload.birthday.is_some() {
            profile.birthday = payload.birthday;
        }
        if let Some(location) = payload.location {
            profile.location = location;
        }
        if payload.skills.is_some() {
            profile.skills = payload.skills;
        }
        if payload.experience.is_some() {
            profile.experience = payload.experience;
        }
        if payload.education.is_some() {
            profile.education = payload.education;
        }
        Ok(self.store.update_candidate_profile(&profile).await?)
    }

    pub async fn delete_candidate(&self, principal: &Principal, id: Uuid) -> Result<()> {
        let profile = self.owned_candidate(principal, id, Operation::Delete).await?;
        self.store.delete_candidate_profile(profile.id).await?;
        info!(profile_id = %profile.id, "candidate profile deleted");
        Ok(())
    }

    async fn store_upload(&self, kind: ProfileFile, file_name: &str, data: Bytes) -> Result<String> {
        if data.is_empty() {
            return Err(Error::Validation("Uploaded file is empty.".into()));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(Error::Validation("Uploaded file exceeds 5 MB.".into()));
        }
        let ext = file_extension(file_name)
            .filter(|ext| kind.allowed_extensions().contains(&ext.as_str()))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Unsupported file type. Allowed: {}.",
                    kind.allowed_extensions().join(", ")
                ))
            })?;
        if !sniff_matches(&ext, &data) {
            return Err(Error::Validation(
                "File contents do not match its extension.".into(),
            ));
        }
        let key = blob_key(kind, file_name);
        self.blobs.put(&key, data).await?;
        Ok(key)
    }

    pub async fn attach_candidate_file(
        &self,
        principal: &Principal,
        id: Uuid,
        kind: ProfileFile,
        file_name: &str,
        data: Bytes,
    ) -> Result<CandidateProfile> {
        let mut profile = self.owned_candidate(principal, id, Operation::Update).await?;
        let key = self.store_upload(kind, file_name, data).await?;
        match kind {
            ProfileFile::Resume => profile.resume = Some(key),
            ProfileFile::CandidateImage => profile.image = Some(key),
            ProfileFile::CompanyImage => {
                return Err(Error::Validation("Not a candidate attachment.".into()))
            }
        }
        info!(profile_id = %profile.id, ?kind, "candidate file attached");
        Ok(self.store.update_candidate_profile(&profile).await?)
    }

    pub async fn attach_company_image(
        &self,
        principal: &Principal,
        id: Uuid,
        file_name: &str,
        data: Bytes,
    ) -> Result<CompanyProfile> {
        let mut profile = self.owned_company(principal, id, Operation::Update).await?;
        let key = self
            .store_upload(ProfileFile::CompanyImage, file_name, data)
            .await?;
        profile.image = Some(key);
        Ok(self.store.update_company_profile(&profile).await?)
    }

    pub async fn list_public_companies(&self, principal: &Principal) -> Result<Vec<PublicCompany>> {
        policy::require(principal, EVERYONE, Operation::List)?;
        let rows = self.store.list_company_profiles().await?;
        Ok(rows.into_iter().map(PublicCompany::from).collect())
    }

    pub async fn get_public_company(&self, principal: &Principal, id: Uuid) -> Result<PublicCompany> {
        policy::require(principal, EVERYONE, Operation::Retrieve)?;
        let profile = self
            .store
            .find_company_profile(id)
            .await?
            .ok_or(Error::NotFound("Company"))?;
        Ok(profile.into())
    }

    pub async fn admin_list_companies(&self, principal: &Principal) -> Result<Vec<CompanyProfile>> {
        policy::require(principal, &[Capability::Admin], Operation::List)?;
        Ok(self.store.list_company_profiles().await?)
    }

    pub async fn admin_list_candidates(&self, principal: &Principal) -> Result<Vec<CandidateProfile>> {
        policy::require(principal, &[Capability::Admin], Operation::List)?;
        Ok(self.store.list_candidate_profiles().await?)
    }
}
