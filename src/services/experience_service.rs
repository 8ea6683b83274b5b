use std::sync::Arc;

use uuid::Uuid;

use crate::database::Store;
use crate::dto::profile_dto::{ExperiencePayload, UpdateExperiencePayload};
use crate::error::{Error, Result};
use crate::models::experience::Experience;
use crate::models::profile::CandidateProfile;
use crate::policy::{self, Capability, Operation, Principal};
use crate::utils::validation::check_date_range;

/// Work history rows, always scoped to the caller's own candidate profile.
#[derive(Clone)]
pub struct ExperienceService {
    store: Arc<dyn Store>,
}

impl ExperienceService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn caller_profile(
        &self,
        principal: &Principal,
        operation: Operation,
    ) -> Result<CandidateProfile> {
        let user = principal.require_user()?;
        policy::require(principal, &[Capability::Candidate], operation)?;
        self.store
            .find_candidate_profile_by_user(user.id)
            .await?
            .ok_or(Error::NoCandidateProfile)
    }

    async fn owned(&self, principal: &Principal, id: Uuid, operation: Operation) -> Result<Experience> {
        let profile = self.caller_profile(principal, operation).await?;
        match self.store.find_experience(id).await? {
            Some(row) if row.candidate_id == profile.id => Ok(row),
            _ => Err(Error::NotFound("Experience")),
        }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<Experience>> {
        let profile = self.caller_profile(principal, Operation::List).await?;
        Ok(self.store.list_experiences(profile.id).await?)
    }

    pub async fn create(&self, principal: &Principal, payload: ExperiencePayload) -> Result<Experience> {
        let profile = self.caller_profile(principal, Operation::Create).await?;
        let row = Experience {
            id: Uuid::new_v4(),
            candidate_id: profile.id,
            company_name: payload.company_name,
            position: payload.position,
            salary: payload.salary,
            start_date: payload.start_date,
            end_date: payload.end_date,
        };
        Ok(self.store.insert_experience(&row).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<Experience> {
        self.owned(principal, id, Operation::Retrieve).await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: UpdateExperiencePayload,
    ) -> Result<Experience> {
        let mut row = self.owned(principal, id, Operation::Update).await?;
        if let Some(company_name) = payload.company_name {
            row.company_name = company_name;
        }
        if let Some(position) = payload.position {
            row.position = position;
        }
        if payload.salary.is_some() {
            row.salary = payload.salary;
        }
        if let Some(start_date) = payload.start_date {
            row.start_date = start_date;
        }
        if payload.end_date.is_some() {
            row.end_date = payload.end_date;
        }
        if !check_date_range(row.start_date, row.end_date) {
            return Err(Error::Validation(
                "end_date must not be earlier than start_date.".into(),
            ));
        }
        Ok(self.store.update_experience(&row).await?)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<()> {
        let row = self.owned(principal, id, Operation::Delete).await?;
        self.store.delete_experience(row.id).await?;
        Ok(())
    }
}
