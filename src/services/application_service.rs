use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::database::{ApplicationScope, Store};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationDetail, ApplicationStatus};
use crate::models::profile::{CandidateProfile, CompanyProfile};
use crate::policy::{self, Capability, Operation, Ownership, Principal};
use crate::services::storage_service::BlobStore;
use crate::utils::time::Clock;

const READERS: &[Capability] = &[Capability::Admin, Capability::Company, Capability::Candidate];

/// Zips `(entry name, contents)` pairs into an in-memory archive.
pub fn build_archive(entries: &[(String, Bytes)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in entries {
        zip.start_file(name.as_str(), options)
            .map_err(|e| Error::Internal(format!("zip entry {name}: {e}")))?;
        zip.write_all(data)
            .map_err(|e| Error::Internal(format!("zip write {name}: {e}")))?;
    }
    let cursor = zip
        .finish()
        .map_err(|e| Error::Internal(format!("zip finish: {e}")))?;
    Ok(cursor.into_inner())
}

/// `<candidate id>_<file name>` with the storage prefix stripped.
fn archive_entry_name(candidate_id: Uuid, key: &str) -> String {
    let base = key.rsplit('/').next().unwrap_or(key);
    format!("{candidate_id}_{base}")
}

#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn Store>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, blobs, clock }
    }

    async fn company_of(&self, user_id: Uuid) -> Result<Option<CompanyProfile>> {
        Ok(self.store.find_company_profile_by_user(user_id).await?)
    }

    async fn candidate_of(&self, user_id: Uuid) -> Result<Option<CandidateProfile>> {
        Ok(self.store.find_candidate_profile_by_user(user_id).await?)
    }

    async fn find(&self, id: Uuid) -> Result<ApplicationDetail> {
        self.store
            .find_application(id)
            .await?
            .ok_or(Error::NotFound("Application"))
    }

    /// Whether the caller is the company behind the job or the candidate who
    /// applied.
    async fn ownership(&self, principal: &Principal, detail: &ApplicationDetail) -> Result<Ownership> {
        let Some(user) = principal.user() else {
            return Ok(Ownership::NotOwned);
        };
        if let Some(company) = self.company_of(user.id).await? {
            if company.id == detail.company_id {
                return Ok(Ownership::Owned);
            }
        }
        if let Some(candidate) = self.candidate_of(user.id).await? {
            if candidate.id == detail.application.candidate_id {
                return Ok(Ownership::Owned);
            }
        }
        Ok(Ownership::NotOwned)
    }

    pub async fn apply(&self, principal: &Principal, job_id: Uuid) -> Result<Application> {
        let user = principal.require_user()?;
        policy::require(principal, &[Capability::Candidate], Operation::Create)?;
        let candidate = self
            .candidate_of(user.id)
            .await?
            .ok_or(Error::NoCandidateProfile)?;

        let now = self.clock.now();
        match self.store.find_job(job_id).await? {
            Some(job) if job.is_listed(now) => {}
            _ => return Err(Error::JobNotFound),
        }
        if self
            .store
            .find_application_for(candidate.id, job_id)
            .await?
            .is_some()
        {
            return Err(Error::DuplicateApplication);
        }

        let application = Application {
            id: Uuid::new_v4(),
            candidate_id: candidate.id,
            job_id,
            application_date: now,
            status: ApplicationStatus::default(),
        };
        let application = self
            .store
            .insert_application(&application)
            .await
            .map_err(|e| match e {
                crate::database::StoreError::NotFound => Error::JobNotFound,
                other => Error::on_conflict(other, Error::DuplicateApplication),
            })?;
        info!(application_id = %application.id, candidate_id = %candidate.id, %job_id, "application submitted");
        Ok(application)
    }

    /// Only the company that posted the job may move an application, and only
    /// along the forward transition table. Setting the current status again
    /// changes nothing.
    pub async fn update_status(
        &self,
        principal: &Principal,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<ApplicationDetail> {
        let user = principal.require_user()?;
        policy::require(principal, &[Capability::Company], Operation::Update)?;
        let mut detail = self.find(id).await?;
        let owner = match self.company_of(user.id).await? {
            Some(company) => Ownership::of(detail.company_id, company.id),
            None => Ownership::NotOwned,
        };
        policy::check(principal, &[Capability::Company], Operation::Update, owner).into_result()?;

        let current = detail.application.status;
        if current == status {
            return Ok(detail);
        }
        if !current.can_transition_to(status) {
            return Err(Error::InvalidTransition {
                from: current,
                to: status,
            });
        }
        detail.application = self.store.update_application_status(id, status).await?;
        info!(application_id = %id, from = %current, to = %status, "application status changed");
        Ok(detail)
    }

    /// Admin sees everything, a company sees applications to its jobs and a
    /// candidate sees their own.
    pub async fn list(&self, principal: &Principal) -> Result<Vec<ApplicationDetail>> {
        let user = principal.require_user()?;
        policy::require(principal, READERS, Operation::List)?;
        let scope = if principal.is_admin() {
            ApplicationScope::All
        } else if policy::require(principal, &[Capability::Company], Operation::List).is_ok() {
            let company = self.company_of(user.id).await?.ok_or(Error::NoCompanyProfile)?;
            ApplicationScope::Company(company.id)
        } else {
            let candidate = self
                .candidate_of(user.id)
                .await?
                .ok_or(Error::NoCandidateProfile)?;
            ApplicationScope::Candidate(candidate.id)
        };
        Ok(self.store.list_applications(scope).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<ApplicationDetail> {
        principal.require_user()?;
        policy::require(principal, READERS, Operation::Retrieve)?;
        let detail = self.find(id).await?;
        let owner = self.ownership(principal, &detail).await?;
        policy::check(principal, READERS, Operation::Retrieve, owner).into_result()?;
        Ok(detail)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<()> {
        let user = principal.require_user()?;
        let deleters = &[Capability::Admin, Capability::Company];
        policy::require(principal, deleters, Operation::Delete)?;
        let detail = self.find(id).await?;
        let owner = match self.company_of(user.id).await? {
            Some(company) => Ownership::of(detail.company_id, company.id),
            None => Ownership::NotOwned,
        };
        policy::check(principal, deleters, Operation::Delete, owner).into_result()?;
        self.store.delete_application(id).await?;
        info!(application_id = %id, "application deleted");
        Ok(())
    }

    /// Every resume submitted to the caller's jobs, one entry per candidate.
    /// Resumes whose blob has gone missing are skipped.
    pub async fn resume_archive(&self, principal: &Principal) -> Result<Vec<u8>> {
        let user = principal.require_user()?;
        policy::require(principal, &[Capability::Company], Operation::List)?;
        let company = self.company_of(user.id).await?.ok_or(Error::NoCompanyProfile)?;

        let applications = self
            .store
            .list_applications(ApplicationScope::Company(company.id))
            .await?;
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for detail in applications {
            let candidate_id = detail.application.candidate_id;
            if !seen.insert(candidate_id) {
                continue;
            }
            let Some(profile) = self.store.find_candidate_profile(candidate_id).await? else {
                continue;
            };
            let Some(key) = profile.resume else {
                continue;
            };
            match self.blobs.read(&key).await? {
                Some(data) => entries.push((archive_entry_name(candidate_id, &key), data)),
                None => warn!(%candidate_id, %key, "resume blob missing; skipped"),
            }
        }

        let archive = build_archive(&entries)?;
        info!(company_id = %company.id, resumes = entries.len(), "resume archive built");
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{ApplicationStore, JobStore, MemoryStore, ProfileStore};
    use crate::models::job::Job;
    use crate::models::user::Role;
    use crate::policy::AuthUser;
    use crate::services::storage_service::MemoryBlobStore;
    use crate::utils::time::ManualClock;
    use chrono::Duration;

    fn principal(role: Role) -> Principal {
        Principal::User(AuthUser {
            id: Uuid::new_v4(),
            email: "u@x.com".into(),
            role,
            is_staff: role == Role::Admin,
            is_superuser: role == Role::Admin,
        })
    }

    struct World {
        store: Arc<MemoryStore>,
        blobs: Arc<MemoryBlobStore>,
        clock: ManualClock,
        svc: ApplicationService,
    }

    fn world() -> World {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let clock = ManualClock::default();
        let svc = ApplicationService::new(store.clone(), blobs.clone(), Arc::new(clock.clone()));
        World { store, blobs, clock, svc }
    }

    async fn company(w: &World, who: &Principal) -> CompanyProfile {
        w.store
            .insert_company_profile(&CompanyProfile {
                id: Uuid::new_v4(),
                user_id: who.user().unwrap().id,
                company_name: "Acme".into(),
                industry: "Software".into(),
                location: "Pune".into(),
                website: None,
                description: None,
                image: None,
            })
            .await
            .unwrap()
    }

    async fn candidate(w: &World, who: &Principal, resume: Option<&str>) -> CandidateProfile {
        w.store
            .insert_candidate_profile(&CandidateProfile {
                id: Uuid::new_v4(),
                user_id: who.user().unwrap().id,
                name: "Asha".into(),
                birthday: None,
                location: "Delhi".into(),
                skills: None,
                experience: None,
                education: None,
                resume: resume.map(String::from),
                image: None,
            })
            .await
            .unwrap()
    }

    async fn job(w: &World, company: &CompanyProfile, title: &str) -> Job {
        let now = w.clock.now();
        w.store
            .insert_job(&Job {
                id: Uuid::new_v4(),
                company_id: company.id,
                company_name: company.company_name.clone(),
                title: title.into(),
                description: None,
                location: None,
                job_type: Default::default(),
                education: Default::default(),
                it_industry: Default::default(),
                experience: Default::default(),
                salary: 10_000,
                positions: 1,
                last_date: now + Duration::days(3),
                is_active: true,
                created_at: now,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn applying_twice_keeps_one_row() {
        let w = world();
        let acme = principal(Role::Company);
        let asha = principal(Role::Candidate);
        let c = company(&w, &acme).await;
        candidate(&w, &asha, None).await;
        let j = job(&w, &c, "Engineer").await;

        let first = w.svc.apply(&asha, j.id).await.unwrap();
        assert_eq!(first.status, ApplicationStatus::Applied);
        assert!(matches!(w.svc.apply(&asha, j.id).await, Err(Error::DuplicateApplication)));
        assert_eq!(w.svc.list(&acme).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn apply_requires_a_profile_and_a_live_job() {
        let w = world();
        let acme = principal(Role::Company);
        let asha = principal(Role::Candidate);
        let c = company(&w, &acme).await;
        let j = job(&w, &c, "Engineer").await;

        assert!(matches!(w.svc.apply(&asha, j.id).await, Err(Error::NoCandidateProfile)));
        candidate(&w, &asha, None).await;
        assert!(matches!(w.svc.apply(&asha, Uuid::new_v4()).await, Err(Error::JobNotFound)));

        w.clock.advance(Duration::days(4));
        assert!(matches!(w.svc.apply(&asha, j.id).await, Err(Error::JobNotFound)));
        assert!(w.store.list_applications(ApplicationScope::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn companies_cannot_apply() {
        let w = world();
        let acme = principal(Role::Company);
        company(&w, &acme).await;
        assert!(matches!(w.svc.apply(&acme, Uuid::new_v4()).await, Err(Error::PermissionDenied)));
    }

    #[tokio::test]
    async fn only_the_posting_company_moves_status() {
        let w = world();
        let acme = principal(Role::Company);
        let rival = principal(Role::Company);
        let asha = principal(Role::Candidate);
        let c = company(&w, &acme).await;
        company(&w, &rival).await;
        candidate(&w, &asha, None).await;
        let j = job(&w, &c, "Engineer").await;
        let app = w.svc.apply(&asha, j.id).await.unwrap();

        assert!(matches!(
            w.svc.update_status(&rival, app.id, ApplicationStatus::Hired).await,
            Err(Error::PermissionDenied)
        ));
        assert!(matches!(
            w.svc.update_status(&asha, app.id, ApplicationStatus::Hired).await,
            Err(Error::PermissionDenied)
        ));
        let detail = w.svc.get(&asha, app.id).await.unwrap();
        assert_eq!(detail.application.status, ApplicationStatus::Applied);

        let moved = w
            .svc
            .update_status(&acme, app.id, ApplicationStatus::Interviewed)
            .await
            .unwrap();
        assert_eq!(moved.application.status, ApplicationStatus::Interviewed);
        assert!(matches!(
            w.svc.update_status(&acme, app.id, ApplicationStatus::Reviewed).await,
            Err(Error::InvalidTransition { .. })
        ));
        let same = w
            .svc
            .update_status(&acme, app.id, ApplicationStatus::Interviewed)
            .await
            .unwrap();
        assert_eq!(same.application.status, ApplicationStatus::Interviewed);
    }

    #[tokio::test]
    async fn strangers_cannot_read_or_delete() {
        let w = world();
        let acme = principal(Role::Company);
        let rival = principal(Role::Company);
        let asha = principal(Role::Candidate);
        let ravi = principal(Role::Candidate);
        let c = company(&w, &acme).await;
        company(&w, &rival).await;
        candidate(&w, &asha, None).await;
        candidate(&w, &ravi, None).await;
        let j = job(&w, &c, "Engineer").await;
        let app = w.svc.apply(&asha, j.id).await.unwrap();

        assert!(matches!(w.svc.get(&ravi, app.id).await, Err(Error::PermissionDenied)));
        assert!(matches!(w.svc.delete(&rival, app.id).await, Err(Error::PermissionDenied)));
        assert!(matches!(w.svc.delete(&asha, app.id).await, Err(Error::PermissionDenied)));
        assert!(w.svc.list(&ravi).await.unwrap().is_empty());
        assert!(w.svc.get(&principal(Role::Admin), app.id).await.is_ok());
        w.svc.delete(&acme, app.id).await.unwrap();
        assert!(matches!(w.svc.get(&acme, app.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn archive_bundles_available_resumes() {
        let w = world();
        let acme = principal(Role::Company);
        let asha = principal(Role::Candidate);
        let ravi = principal(Role::Candidate);
        let c = company(&w, &acme).await;
        let asha_profile = candidate(&w, &asha, Some("resumes/ab12_asha.pdf")).await;
        candidate(&w, &ravi, Some("resumes/cd34_gone.pdf")).await;
        w.blobs
            .put("resumes/ab12_asha.pdf", Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap();
        let j1 = job(&w, &c, "Engineer").await;
        let j2 = job(&w, &c, "Designer").await;
        w.svc.apply(&asha, j1.id).await.unwrap();
        w.svc.apply(&asha, j2.id).await.unwrap();
        w.svc.apply(&ravi, j1.id).await.unwrap();

        let bytes = w.svc.resume_archive(&acme).await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), format!("{}_ab12_asha.pdf", asha_profile.id));
    }

    #[test]
    fn entry_names_drop_the_prefix() {
        let id = Uuid::nil();
        assert_eq!(
            archive_entry_name(id, "resumes/x_cv.pdf"),
            format!("{id}_x_cv.pdf")
        );
    }
}
