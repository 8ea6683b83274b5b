use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::database::Store;
use crate::dto::job_dto::{CreateJobPayload, JobListQuery, JobPage, JobWrite, TopicStats, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::Job;
use crate::models::profile::CompanyProfile;
use crate::policy::{self, Capability, Operation, Ownership, Principal};
use crate::services::job_cache::JobCache;
use crate::utils::time::Clock;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

const BROWSERS: &[Capability] = &[Capability::Company, Capability::Candidate, Capability::Admin];

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// True when `job` satisfies every filter present in `q`.
pub fn matches_filters(job: &Job, q: &JobListQuery) -> bool {
    let location = job.location.as_deref().unwrap_or("");
    if let Some(keyword) = q.keyword.as_deref().filter(|s| !s.is_empty()) {
        if !contains_ci(&job.title, keyword) {
            return false;
        }
    }
    if let Some(wanted) = q.location.as_deref().filter(|s| !s.is_empty()) {
        if !contains_ci(location, wanted) {
            return false;
        }
    }
    if let Some(term) = q.search.as_deref().filter(|s| !s.is_empty()) {
        if !(contains_ci(&job.title, term)
            || contains_ci(location, term)
            || contains_ci(&job.company_name, term))
        {
            return false;
        }
    }
    q.job_type.map_or(true, |v| job.job_type == v)
        && q.education.map_or(true, |v| job.education == v)
        && q.experience.map_or(true, |v| job.experience == v)
        && q.it_industry.map_or(true, |v| job.it_industry == v)
        && q.min_salary.map_or(true, |v| job.salary >= v)
        && q.max_salary.map_or(true, |v| job.salary <= v)
}

pub fn paginate(jobs: Vec<Job>, page: Option<usize>, page_size: Option<usize>) -> JobPage {
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = page.unwrap_or(1).max(1);
    let total = jobs.len();
    let total_pages = total.div_ceil(page_size);
    let items = jobs
        .into_iter()
        .skip(page.saturating_sub(1).saturating_mul(page_size))
        .take(page_size)
        .collect();
    JobPage {
        items,
        total,
        page,
        page_size,
        total_pages,
    }
}

/// Aggregates over jobs whose title contains `topic`; `None` when nothing
/// matches.
pub fn topic_stats<'a>(topic: &str, jobs: impl Iterator<Item = &'a Job>) -> Option<TopicStats> {
    let matching: Vec<&Job> = jobs.filter(|j| contains_ci(&j.title, topic)).collect();
    if matching.is_empty() {
        return None;
    }
    let count = matching.len();
    let positions: i64 = matching.iter().map(|j| i64::from(j.positions)).sum();
    let salaries: i64 = matching.iter().map(|j| i64::from(j.salary)).sum();
    let max_salary = matching.iter().map(|j| j.salary).max().unwrap_or_default();
    Some(TopicStats {
        topic: topic.to_string(),
        count,
        avg_positions: positions as f64 / count as f64,
        avg_salary: salaries as f64 / count as f64,
        max_salary,
    })
}

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn Store>,
    cache: JobCache,
    clock: Arc<dyn Clock>,
    default_lifetime: Duration,
}

impl JobService {
    pub fn new(
        store: Arc<dyn Store>,
        cache: JobCache,
        clock: Arc<dyn Clock>,
        default_lifetime: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            default_lifetime,
        }
    }

    async fn caller_company(&self, principal: &Principal, operation: Operation) -> Result<CompanyProfile> {
        let user = principal.require_user()?;
        policy::require(principal, &[Capability::Company], operation)?;
        self.store
            .find_company_profile_by_user(user.id)
            .await?
            .ok_or(Error::NoCompanyProfile)
    }

    async fn owned_job(&self, principal: &Principal, id: Uuid, operation: Operation) -> Result<Job> {
        let company = self.caller_company(principal, operation).await?;
        let job = self.store.find_job(id).await?.ok_or(Error::JobNotFound)?;
        policy::check(
            principal,
            &[Capability::Company],
            operation,
            Ownership::of(job.company_id, company.id),
        )
        .into_result()?;
        Ok(job)
    }

    async fn title_taken(&self, company_id: Uuid, title: &str, except: Option<Uuid>) -> Result<bool> {
        let jobs = self.store.list_company_jobs(company_id).await?;
        Ok(jobs
            .iter()
            .any(|j| j.title == title && Some(j.id) != except))
    }

    /// Posts a job for the caller's company. A posting whose last date has
    /// already passed is never stored.
    pub async fn create(&self, principal: &Principal, payload: CreateJobPayload) -> Result<JobWrite> {
        let company = self.caller_company(principal, Operation::Create).await?;
        let now = self.clock.now();
        let last_date = payload.last_date.unwrap_or(now + self.default_lifetime);
        let title = payload.title.trim().to_string();
        if self.title_taken(company.id, &title, None).await? {
            return Err(Error::DuplicateJobTitle);
        }

        let job = Job {
            id: Uuid::new_v4(),
            company_id: company.id,
            company_name: company.company_name.clone(),
            title,
            description: payload.description,
            location: payload.location,
            job_type: payload.job_type.unwrap_or_default(),
            education: payload.education.unwrap_or_default(),
            it_industry: payload.it_industry.unwrap_or_default(),
            experience: payload.experience.unwrap_or_default(),
            salary: payload.salary,
            positions: payload.positions.unwrap_or(1),
            last_date,
            is_active: true,
            created_at: now,
        };
        if job.is_expired(now) {
            info!(company_id = %company.id, title = %job.title, "job expired on write; not stored");
            return Ok(JobWrite::Expired { id: job.id });
        }
        let job = self
            .store
            .insert_job(&job)
            .await
            .map_err(|e| Error::on_conflict(e, Error::DuplicateJobTitle))?;
        self.cache.invalidate();
        info!(job_id = %job.id, company_id = %company.id, title = %job.title, "job posted");
        Ok(JobWrite::Saved { job })
    }

    /// Applies the changes. If the result is already past its last date the
    /// job is removed instead of saved.
    pub async fn update(&self, principal: &Principal, id: Uuid, payload: UpdateJobPayload) -> Result<JobWrite> {
        let mut job = self.owned_job(principal, id, Operation::Update).await?;
        if let Some(title) = payload.title {
            let title = title.trim().to_string();
            if title != job.title && self.title_taken(job.company_id, &title, Some(job.id)).await? {
                return Err(Error::DuplicateJobTitle);
            }
            job.title = title;
        }
        if payload.description.is_some() {
            job.description = payload.description;
        }
        if payload.location.is_some() {
            job.location = payload.location;
        }
        if let Some(v) = payload.job_type {
            job.job_type = v;
        }
        if let Some(v) = payload.education {
            job.education = v;
        }
        if let Some(v) = payload.it_industry {
            job.it_industry = v;
        }
        if let Some(v) = payload.experience {
            job.experience = v;
        }
        if let Some(v) = payload.salary {
            job.salary = v;
        }
        if let Some(v) = payload.positions {
            job.positions = v;
        }
        if let Some(v) = payload.last_date {
            job.last_date = v;
        }
        if let Some(v) = payload.is_active {
            job.is_active = v;
        }

        self.cache.invalidate();
        if job.is_expired(self.clock.now()) {
            self.store.delete_job(job.id).await?;
            info!(job_id = %job.id, "job expired on write; removed");
            return Ok(JobWrite::Expired { id: job.id });
        }
        let job = self
            .store
            .update_job(&job)
            .await
            .map_err(|e| Error::on_conflict(e, Error::DuplicateJobTitle))?;
        info!(job_id = %job.id, "job updated");
        Ok(JobWrite::Saved { job })
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<()> {
        let job = self.owned_job(principal, id, Operation::Delete).await?;
        self.store.delete_job(job.id).await?;
        self.cache.invalidate();
        info!(job_id = %job.id, "job deleted");
        Ok(())
    }

    async fn all_jobs(&self) -> Result<Arc<Vec<Job>>> {
        if let Some(jobs) = self.cache.get() {
            return Ok(jobs);
        }
        let jobs = self.store.list_jobs().await?;
        Ok(self.cache.put(jobs))
    }

    /// Only jobs that are active and not past their last date are visible.
    pub async fn list(&self, principal: &Principal, query: &JobListQuery) -> Result<JobPage> {
        policy::require(principal, BROWSERS, Operation::List)?;
        let now = self.clock.now();
        let jobs = self.all_jobs().await?;
        let visible: Vec<Job> = jobs
            .iter()
            .filter(|j| j.is_listed(now) && matches_filters(j, query))
            .cloned()
            .collect();
        Ok(paginate(visible, query.page, query.page_size))
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<Job> {
        policy::require(principal, BROWSERS, Operation::Retrieve)?;
        self.listed_job(id).await
    }

    /// A job that can currently be viewed or applied to.
    pub async fn listed_job(&self, id: Uuid) -> Result<Job> {
        match self.store.find_job(id).await? {
            Some(job) if job.is_listed(self.clock.now()) => Ok(job),
            _ => Err(Error::JobNotFound),
        }
    }

    /// The caller's own postings, expired ones included.
    pub async fn company_jobs(&self, principal: &Principal) -> Result<Vec<Job>> {
        let company = self.caller_company(principal, Operation::List).await?;
        Ok(self.store.list_company_jobs(company.id).await?)
    }

    pub async fn topic_stats(&self, principal: &Principal, topic: &str) -> Result<Option<TopicStats>> {
        policy::require(principal, BROWSERS, Operation::List)?;
        let now = self.clock.now();
        let jobs = self.all_jobs().await?;
        Ok(topic_stats(topic, jobs.iter().filter(|j| j.is_listed(now))))
    }

    pub async fn reap_expired(&self) -> Result<u64> {
        let now: DateTime<Utc> = self.clock.now();
        let removed = self.store.delete_expired_jobs(now).await?;
        if removed > 0 {
            self.cache.invalidate();
            info!(removed, "expired jobs reaped");
        }
        Ok(removed)
    }
}
