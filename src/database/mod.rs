//! Storage seams. Services talk to these traits; `PgStore` backs production
//! and `MemoryStore` backs tests and throwaway local runs. Both enforce the
//! same uniqueness and cascade rules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::application::{Application, ApplicationDetail, ApplicationStatus};
use crate::models::experience::Experience;
use crate::models::job::Job;
use crate::models::profile::{CandidateProfile, CompanyProfile};
use crate::models::subscription::{Payment, Subscription, SubscriptionPlan};
use crate::models::user::User;

pub mod memory;
pub mod pool;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. Carries the constraint name.
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("row not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Which applications a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationScope {
    All,
    Company(Uuid),
    Candidate(Uuid),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<User>;
    /// Newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;
    /// Removes inactive accounts created before `cutoff`, or all inactive
    /// accounts when `cutoff` is `None`.
    async fn delete_inactive_users(&self, cutoff: Option<DateTime<Utc>>) -> StoreResult<u64>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert_company_profile(&self, profile: &CompanyProfile) -> StoreResult<CompanyProfile>;
    async fn find_company_profile(&self, id: Uuid) -> StoreResult<Option<CompanyProfile>>;
    async fn find_company_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<CompanyProfile>>;
    async fn update_company_profile(&self, profile: &CompanyProfile) -> StoreResult<CompanyProfile>;
    async fn delete_company_profile(&self, id: Uuid) -> StoreResult<bool>;
    async fn list_company_profiles(&self) -> StoreResult<Vec<CompanyProfile>>;

    async fn insert_candidate_profile(
        &self,
        profile: &CandidateProfile,
    ) -> StoreResult<CandidateProfile>;
    async fn find_candidate_profile(&self, id: Uuid) -> StoreResult<Option<CandidateProfile>>;
    async fn find_candidate_profile_by_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Option<CandidateProfile>>;
    async fn update_candidate_profile(
        &self,
        profile: &CandidateProfile,
    ) -> StoreResult<CandidateProfile>;
    async fn delete_candidate_profile(&self, id: Uuid) -> StoreResult<bool>;
    async fn list_candidate_profiles(&self) -> StoreResult<Vec<CandidateProfile>>;
}

#[async_trait]
pub trait ExperienceStore: Send + Sync {
    async fn insert_experience(&self, experience: &Experience) -> StoreResult<Experience>;
    async fn find_experience(&self, id: Uuid) -> StoreResult<Option<Experience>>;
    async fn list_experiences(&self, candidate_id: Uuid) -> StoreResult<Vec<Experience>>;
    async fn update_experience(&self, experience: &Experience) -> StoreResult<Experience>;
    async fn delete_experience(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &Job) -> StoreResult<Job>;
    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>>;
    async fn update_job(&self, job: &Job) -> StoreResult<Job>;
    async fn delete_job(&self, id: Uuid) -> StoreResult<bool>;
    /// Every stored job, newest first, expired rows included.
    async fn list_jobs(&self) -> StoreResult<Vec<Job>>;
    async fn list_company_jobs(&self, company_id: Uuid) -> StoreResult<Vec<Job>>;
    async fn delete_expired_jobs(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn insert_application(&self, application: &Application) -> StoreResult<Application>;
    async fn find_application(&self, id: Uuid) -> StoreResult<Option<ApplicationDetail>>;
    async fn find_application_for(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> StoreResult<Option<Application>>;
    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application>;
    async fn delete_application(&self, id: Uuid) -> StoreResult<bool>;
    /// Newest first.
    async fn list_applications(&self, scope: ApplicationScope)
        -> StoreResult<Vec<ApplicationDetail>>;
}

#[async_trait]
pub trait BillingStore: Send + Sync {
    async fn insert_plan(&self, plan: &SubscriptionPlan) -> StoreResult<SubscriptionPlan>;
    async fn find_plan(&self, id: Uuid) -> StoreResult<Option<SubscriptionPlan>>;
    async fn list_plans(&self) -> StoreResult<Vec<SubscriptionPlan>>;

    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<Subscription>;
    async fn find_subscription(&self, id: Uuid) -> StoreResult<Option<Subscription>>;
    async fn find_active_subscription(
        &self,
        company_id: Uuid,
        plan_id: Uuid,
    ) -> StoreResult<Option<Subscription>>;
    async fn deactivate_subscription(&self, id: Uuid) -> StoreResult<()>;
    /// All subscriptions, or only one company's. Newest first.
    async fn list_subscriptions(&self, company_id: Option<Uuid>) -> StoreResult<Vec<Subscription>>;

    async fn insert_payment(&self, payment: &Payment) -> StoreResult<Payment>;
    async fn find_payment_for_subscription(
        &self,
        subscription_id: Uuid,
    ) -> StoreResult<Option<Payment>>;
    async fn update_payment(&self, payment: &Payment) -> StoreResult<Payment>;
    async fn list_payments(&self) -> StoreResult<Vec<Payment>>;
}

/// Everything the services need from persistence.
pub trait Store:
    UserStore + ProfileStore + ExperienceStore + JobStore + ApplicationStore + BillingStore
{
}

impl<T> Store for T where
    T: UserStore + ProfileStore + ExperienceStore + JobStore + ApplicationStore + BillingStore
{
}
