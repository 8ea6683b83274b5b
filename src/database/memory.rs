use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    ApplicationScope, ApplicationStore, BillingStore, ExperienceStore, JobStore, ProfileStore,
    StoreError, StoreResult, UserStore,
};
use crate::models::application::{Application, ApplicationDetail, ApplicationStatus};
use crate::models::experience::Experience;
use crate::models::job::Job;
use crate::models::profile::{CandidateProfile, CompanyProfile};
use crate::models::subscription::{Payment, Subscription, SubscriptionPlan};
use crate::models::user::User;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    company_profiles: Vec<CompanyProfile>,
    candidate_profiles: Vec<CandidateProfile>,
    experiences: Vec<Experience>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
    plans: Vec<SubscriptionPlan>,
    subscriptions: Vec<Subscription>,
    payments: Vec<Payment>,
}

impl Tables {
    fn drop_company_profile(&mut self, id: Uuid) {
        self.company_profiles.retain(|p| p.id != id);
        let jobs: Vec<Uuid> = self
            .jobs
            .iter()
            .filter(|j| j.company_id == id)
            .map(|j| j.id)
            .collect();
        for job in jobs {
            self.drop_job(job);
        }
        let subscriptions: Vec<Uuid> = self
            .subscriptions
            .iter()
            .filter(|s| s.company_id == id)
            .map(|s| s.id)
            .collect();
        self.subscriptions.retain(|s| s.company_id != id);
        self.payments
            .retain(|p| !subscriptions.contains(&p.subscription_id));
    }

    fn drop_candidate_profile(&mut self, id: Uuid) {
        self.candidate_profiles.retain(|p| p.id != id);
        self.experiences.retain(|e| e.candidate_id != id);
        self.applications.retain(|a| a.candidate_id != id);
    }

    fn drop_job(&mut self, id: Uuid) {
        self.jobs.retain(|j| j.id != id);
        self.applications.retain(|a| a.job_id != id);
    }

    fn drop_user(&mut self, id: Uuid) {
        self.users.retain(|u| u.id != id);
        let company = self
            .company_profiles
            .iter()
            .find(|p| p.user_id == id)
            .map(|p| p.id);
        if let Some(company) = company {
            self.drop_company_profile(company);
        }
        let candidate = self
            .candidate_profiles
            .iter()
            .find(|p| p.user_id == id)
            .map(|p| p.id);
        if let Some(candidate) = candidate {
            self.drop_candidate_profile(candidate);
        }
    }

    fn detail(&self, application: &Application) -> Option<ApplicationDetail> {
        let candidate = self
            .candidate_profiles
            .iter()
            .find(|p| p.id == application.candidate_id)?;
        let job = self.jobs.iter().find(|j| j.id == application.job_id)?;
        Some(ApplicationDetail {
            application: application.clone(),
            candidate_name: candidate.name.clone(),
            job_title: job.title.clone(),
            company_id: job.company_id,
            company_name: job.company_name.clone(),
        })
    }
}

/// Process-local store with the same constraints as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

fn replace<T: Clone>(rows: &mut [T], row: &T, same: impl Fn(&T) -> bool) -> StoreResult<T> {
    let slot = rows.iter_mut().find(|r| same(r)).ok_or(StoreError::NotFound)?;
    *slot = row.clone();
    Ok(row.clone())
}

fn newest_first<T: Clone>(rows: &[T]) -> Vec<T> {
    rows.iter().rev().cloned().collect()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<User> {
        let mut t = self.lock()?;
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        t.users.push(user.clone());
        Ok(user.clone())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<User> {
        let mut t = self.lock()?;
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.is_active = active;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users = self.lock()?.users.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.lock()?;
        let existed = t.users.iter().any(|u| u.id == id);
        t.drop_user(id);
        Ok(existed)
    }

    async fn delete_inactive_users(&self, cutoff: Option<DateTime<Utc>>) -> StoreResult<u64> {
        let mut t = self.lock()?;
        let doomed: Vec<Uuid> = t
            .users
            .iter()
            .filter(|u| !u.is_active && cutoff.map_or(true, |c| u.created_at < c))
            .map(|u| u.id)
            .collect();
        for id in &doomed {
            t.drop_user(*id);
        }
        Ok(doomed.len() as u64)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn insert_company_profile(&self, profile: &CompanyProfile) -> StoreResult<CompanyProfile> {
        let mut t = self.lock()?;
        if t.company_profiles.iter().any(|p| p.user_id == profile.user_id) {
            return Err(StoreError::Conflict("company_profiles_user_id_key".into()));
        }
        t.company_profiles.push(profile.clone());
        Ok(profile.clone())
    }

    async fn find_company_profile(&self, id: Uuid) -> StoreResult<Option<CompanyProfile>> {
        Ok(self.lock()?.company_profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn find_company_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<CompanyProfile>> {
        Ok(self
            .lock()?
            .company_profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn update_company_profile(&self, profile: &CompanyProfile) -> StoreResult<CompanyProfile> {
        let mut t = self.lock()?;
        let updated = replace(&mut t.company_profiles, profile, |p| p.id == profile.id)?;
        // denormalised onto job rows
        for job in t.jobs.iter_mut().filter(|j| j.company_id == profile.id) {
            job.company_name = profile.company_name.clone();
        }
        Ok(updated)
    }

    async fn delete_company_profile(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.lock()?;
        let existed = t.company_profiles.iter().any(|p| p.id == id);
        t.drop_company_profile(id);
        Ok(existed)
    }

    async fn list_company_profiles(&self) -> StoreResult<Vec<CompanyProfile>> {
        let mut rows = self.lock()?.company_profiles.clone();
        rows.sort_by(|a, b| a.company_name.cmp(&b.company_name));
        Ok(rows)
    }

    async fn insert_candidate_profile(
        &self,
        profile: &CandidateProfile,
    ) -> StoreResult<CandidateProfile> {
        let mut t = self.lock()?;
        if t.candidate_profiles.iter().any(|p| p.user_id == profile.user_id) {
            return Err(StoreError::Conflict("candidate_profiles_user_id_key".into()));
        }
        t.candidate_profiles.push(profile.clone());
        Ok(profile.clone())
    }

    async fn find_candidate_profile(&self, id: Uuid) -> StoreResult<Option<CandidateProfile>> {
        Ok(self.lock()?.candidate_profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn find_candidate_profile_by_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Option<CandidateProfile>> {
        Ok(self
            .lock()?
            .candidate_profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn update_candidate_profile(
        &self,
        profile: &CandidateProfile,
    ) -> StoreResult<CandidateProfile> {
        let mut t = self.lock()?;
        replace(&mut t.candidate_profiles, profile, |p| p.id == profile.id)
    }

    async fn delete_candidate_profile(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.lock()?;
        let existed = t.candidate_profiles.iter().any(|p| p.id == id);
        t.drop_candidate_profile(id);
        Ok(existed)
    }

    async fn list_candidate_profiles(&self) -> StoreResult<Vec<CandidateProfile>> {
        let mut rows = self.lock()?.candidate_profiles.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

#[async_trait]
impl ExperienceStore for MemoryStore {
    async fn insert_experience(&self, experience: &Experience) -> StoreResult<Experience> {
        let mut t = self.lock()?;
        if !t.candidate_profiles.iter().any(|p| p.id == experience.candidate_id) {
            return Err(StoreError::NotFound);
        }
        t.experiences.push(experience.clone());
        Ok(experience.clone())
    }

    async fn find_experience(&self, id: Uuid) -> StoreResult<Option<Experience>> {
        Ok(self.lock()?.experiences.iter().find(|e| e.id == id).cloned())
    }

    async fn list_experiences(&self, candidate_id: Uuid) -> StoreResult<Vec<Experience>> {
        let mut rows: Vec<Experience> = self
            .lock()?
            .experiences
            .iter()
            .filter(|e| e.candidate_id == candidate_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn update_experience(&self, experience: &Experience) -> StoreResult<Experience> {
        let mut t = self.lock()?;
        replace(&mut t.experiences, experience, |e| e.id == experience.id)
    }

    async fn delete_experience(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.lock()?;
        let before = t.experiences.len();
        t.experiences.retain(|e| e.id != id);
        Ok(t.experiences.len() != before)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: &Job) -> StoreResult<Job> {
        let mut t = self.lock()?;
        let company_name = t
            .company_profiles
            .iter()
            .find(|p| p.id == job.company_id)
            .map(|p| p.company_name.clone())
            .ok_or(StoreError::NotFound)?;
        if t
            .jobs
            .iter()
            .any(|j| j.company_id == job.company_id && j.title == job.title)
        {
            return Err(StoreError::Conflict("jobs_company_id_title_key".into()));
        }
        let job = Job {
            company_name,
            ..job.clone()
        };
        t.jobs.push(job.clone());
        Ok(job)
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(self.lock()?.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn update_job(&self, job: &Job) -> StoreResult<Job> {
        let mut t = self.lock()?;
        if t
            .jobs
            .iter()
            .any(|j| j.id != job.id && j.company_id == job.company_id && j.title == job.title)
        {
            return Err(StoreError::Conflict("jobs_company_id_title_key".into()));
        }
        replace(&mut t.jobs, job, |j| j.id == job.id)
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.lock()?;
        let existed = t.jobs.iter().any(|j| j.id == id);
        t.drop_job(id);
        Ok(existed)
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        Ok(newest_first(&self.lock()?.jobs))
    }

    async fn list_company_jobs(&self, company_id: Uuid) -> StoreResult<Vec<Job>> {
        let t = self.lock()?;
        Ok(t.jobs
            .iter()
            .rev()
            .filter(|j| j.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn delete_expired_jobs(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut t = self.lock()?;
        let expired: Vec<Uuid> = t
            .jobs
            .iter()
            .filter(|j| j.is_expired(now))
            .map(|j| j.id)
            .collect();
        for id in &expired {
            t.drop_job(*id);
        }
        Ok(expired.len() as u64)
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert_application(&self, application: &Application) -> StoreResult<Application> {
        let mut t = self.lock()?;
        if t.applications.iter().any(|a| {
            a.candidate_id == application.candidate_id && a.job_id == application.job_id
        }) {
            return Err(StoreError::Conflict(
                "applications_candidate_id_job_id_key".into(),
            ));
        }
        if !t.jobs.iter().any(|j| j.id == application.job_id) {
            return Err(StoreError::NotFound);
        }
        t.applications.push(application.clone());
        Ok(application.clone())
    }

    async fn find_application(&self, id: Uuid) -> StoreResult<Option<ApplicationDetail>> {
        let t = self.lock()?;
        Ok(t.applications
            .iter()
            .find(|a| a.id == id)
            .and_then(|a| t.detail(a)))
    }

    async fn find_application_for(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> StoreResult<Option<Application>> {
        Ok(self
            .lock()?
            .applications
            .iter()
            .find(|a| a.candidate_id == candidate_id && a.job_id == job_id)
            .cloned())
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application> {
        let mut t = self.lock()?;
        let application = t
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;
        application.status = status;
        Ok(application.clone())
    }

    async fn delete_application(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.lock()?;
        let before = t.applications.len();
        t.applications.retain(|a| a.id != id);
        Ok(t.applications.len() != before)
    }

    async fn list_applications(
        &self,
        scope: ApplicationScope,
    ) -> StoreResult<Vec<ApplicationDetail>> {
        let t = self.lock()?;
        Ok(t.applications
            .iter()
            .rev()
            .filter_map(|a| t.detail(a))
            .filter(|d| match scope {
                ApplicationScope::All => true,
                ApplicationScope::Company(id) => d.company_id == id,
                ApplicationScope::Candidate(id) => d.application.candidate_id == id,
            })
            .collect())
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn insert_plan(&self, plan: &SubscriptionPlan) -> StoreResult<SubscriptionPlan> {
        self.lock()?.plans.push(plan.clone());
        Ok(plan.clone())
    }

    async fn find_plan(&self, id: Uuid) -> StoreResult<Option<SubscriptionPlan>> {
        Ok(self.lock()?.plans.iter().find(|p| p.id == id).cloned())
    }

    async fn list_plans(&self) -> StoreResult<Vec<SubscriptionPlan>> {
        let mut plans = self.lock()?.plans.clone();
        plans.sort_by(|a, b| a.price.cmp(&b.price));
        Ok(plans)
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<Subscription> {
        let mut t = self.lock()?;
        if subscription.is_active
            && t.subscriptions.iter().any(|s| {
                s.is_active
                    && s.company_id == subscription.company_id
                    && s.plan_id == subscription.plan_id
            })
        {
            return Err(StoreError::Conflict(
                "subscriptions_active_company_plan_idx".into(),
            ));
        }
        t.subscriptions.push(subscription.clone());
        Ok(subscription.clone())
    }

    async fn find_subscription(&self, id: Uuid) -> StoreResult<Option<Subscription>> {
        Ok(self.lock()?.subscriptions.iter().find(|s| s.id == id).cloned())
    }

    async fn find_active_subscription(
        &self,
        company_id: Uuid,
        plan_id: Uuid,
    ) -> StoreResult<Option<Subscription>> {
        Ok(self
            .lock()?
            .subscriptions
            .iter()
            .find(|s| s.is_active && s.company_id == company_id && s.plan_id == plan_id)
            .cloned())
    }

    async fn deactivate_subscription(&self, id: Uuid) -> StoreResult<()> {
        let mut t = self.lock()?;
        let subscription = t
            .subscriptions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound)?;
        subscription.is_active = false;
        Ok(())
    }

    async fn list_subscriptions(&self, company_id: Option<Uuid>) -> StoreResult<Vec<Subscription>> {
        let t = self.lock()?;
        Ok(t.subscriptions
            .iter()
            .rev()
            .filter(|s| company_id.map_or(true, |c| s.company_id == c))
            .cloned()
            .collect())
    }

    async fn insert_payment(&self, payment: &Payment) -> StoreResult<Payment> {
        let mut t = self.lock()?;
        if t
            .payments
            .iter()
            .any(|p| p.subscription_id == payment.subscription_id)
        {
            return Err(StoreError::Conflict("payments_subscription_id_key".into()));
        }
        t.payments.push(payment.clone());
        Ok(payment.clone())
    }

    async fn find_payment_for_subscription(
        &self,
        subscription_id: Uuid,
    ) -> StoreResult<Option<Payment>> {
        Ok(self
            .lock()?
            .payments
            .iter()
            .find(|p| p.subscription_id == subscription_id)
            .cloned())
    }

    async fn update_payment(&self, payment: &Payment) -> StoreResult<Payment> {
        let mut t = self.lock()?;
        replace(&mut t.payments, payment, |p| p.id == payment.id)
    }

    async fn list_payments(&self) -> StoreResult<Vec<Payment>> {
        Ok(newest_first(&self.lock()?.payments))
    }
}
