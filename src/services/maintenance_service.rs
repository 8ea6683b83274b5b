use chrono::Duration;
use serde::Serialize;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};

use crate::error::Result;
use crate::services::account_service::AccountService;
use crate::services::job_service::JobService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub users_removed: u64,
    pub jobs_removed: u64,
}

/// Periodic cleanup: abandoned registrations and expired jobs.
#[derive(Clone)]
pub struct MaintenanceService {
    accounts: AccountService,
    jobs: JobService,
    retention: Duration,
}

impl MaintenanceService {
    pub fn new(accounts: AccountService, jobs: JobService, retention: Duration) -> Self {
        Self {
            accounts,
            jobs,
            retention,
        }
    }

    pub async fn run_once(&self) -> Result<SweepReport> {
        let users_removed = self.accounts.sweep_inactive(self.retention).await?;
        let jobs_removed = self.jobs.reap_expired().await?;
        Ok(SweepReport {
            users_removed,
            jobs_removed,
        })
    }

    /// Operator purge from the command line.
    pub async fn purge_inactive_users(&self) -> Result<u64> {
        self.accounts.purge_all_inactive().await
    }

    /// Registers the sweep on `cron` (six fields, seconds first) and starts
    /// the scheduler. The returned handle must be kept alive.
    pub async fn schedule(self, cron: &str) -> std::result::Result<JobScheduler, JobSchedulerError> {
        let scheduler = JobScheduler::new().await?;
        let job = Job::new_async(cron, move |_id, _scheduler| {
            let service = self.clone();
            Box::pin(async move {
                match service.run_once().await {
                    Ok(report) => info!(
                        users_removed = report.users_removed,
                        jobs_removed = report.jobs_removed,
                        "maintenance sweep finished"
                    ),
                    Err(e) => error!(error = %e, "maintenance sweep failed"),
                }
            })
        })?;
        scheduler.add(job).await?;
        scheduler.start().await?;
        info!(%cron, "maintenance sweep scheduled");
        Ok(scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::database::{MemoryStore, UserStore};
    use crate::models::user::{Role, User};
    use crate::services::job_cache::JobCache;
    use crate::services::mail_service::LogMailer;
    use crate::services::token_service::TokenService;
    use crate::utils::time::{Clock, ManualClock};
    use crate::utils::token::ActivationTokens;
    use uuid::Uuid;

    #[tokio::test]
    async fn sweep_spares_recent_and_active_accounts() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::default();
        let now = clock.now();
        for (age_hours, active) in [(30, false), (2, false), (30, true)] {
            let created = now - Duration::hours(age_hours);
            store
                .insert_user(&User {
                    id: Uuid::new_v4(),
                    email: format!("u{age_hours}{active}@x.com"),
                    password_hash: String::new(),
                    phone_number: "1".into(),
                    role: Role::Candidate,
                    is_active: active,
                    is_staff: false,
                    is_superuser: false,
                    created_at: created,
                    updated_at: created,
                })
                .await
                .unwrap();
        }

        let accounts = AccountService::new(
            store.clone(),
            Arc::new(LogMailer),
            TokenService::new("secret", Duration::minutes(5), Duration::days(1)),
            ActivationTokens::new("secret", Duration::hours(1)),
            Arc::new(clock.clone()),
            "http://localhost".into(),
        );
        let jobs = JobService::new(
            store.clone(),
            JobCache::new(std::time::Duration::ZERO),
            Arc::new(clock.clone()),
            Duration::days(10),
        );
        let sweeper = MaintenanceService::new(accounts, jobs, Duration::hours(24));

        let report = sweeper.run_once().await.unwrap();
        assert_eq!(report, SweepReport { users_removed: 1, jobs_removed: 0 });
        assert_eq!(store.list_users().await.unwrap().len(), 2);
    }
}
