pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use chrono::Duration;
use sqlx::PgPool;

use crate::config::Config;
use crate::database::{PgStore, Store};
use crate::error::Result;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::{
    account_service::AccountService,
    application_service::ApplicationService,
    billing_service::BillingService,
    experience_service::ExperienceService,
    job_cache::JobCache,
    job_service::JobService,
    mail_service::{LogMailer, Mailer, SmtpMailer},
    maintenance_service::MaintenanceService,
    payment_gateway::{PaymentGateway, RazorpayGateway, UnconfiguredGateway},
    profile_service::ProfileService,
    storage_service::{BlobStore, LocalBlobStore},
    token_service::TokenService,
};
use crate::utils::time::{Clock, SystemClock};
use crate::utils::token::ActivationTokens;

/// External collaborators the services are wired over. Tests swap in
/// in-memory and scripted versions.
pub struct Collaborators {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub blobs: Arc<dyn BlobStore>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Production wiring: Postgres when a pool is given, SMTP and Razorpay
    /// when configured, local disk for uploads.
    pub fn from_config(config: &Config, pool: Option<PgPool>) -> Result<Self> {
        let store: Arc<dyn Store> = match pool {
            Some(pool) => Arc::new(PgStore::new(pool)),
            None => Arc::new(database::MemoryStore::new()),
        };
        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(
                &smtp.host,
                &smtp.username,
                &smtp.password,
                &config.mail_from,
            )?),
            None => Arc::new(LogMailer),
        };
        let gateway: Arc<dyn PaymentGateway> = match &config.razorpay {
            Some(razorpay) => Arc::new(RazorpayGateway::new(razorpay)?),
            None => Arc::new(UnconfiguredGateway),
        };
        Ok(Self {
            store,
            mailer,
            gateway,
            blobs: Arc::new(LocalBlobStore::new(&config.uploads_dir)),
            clock: Arc::new(SystemClock),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub profiles: ProfileService,
    pub experiences: ExperienceService,
    pub jobs: JobService,
    pub applications: ApplicationService,
    pub billing: BillingService,
    pub maintenance: MaintenanceService,
    pub auth_limiter: RateLimiter,
    pub cors_origins: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(config: &Config, parts: Collaborators) -> Self {
        let Collaborators {
            store,
            mailer,
            gateway,
            blobs,
            clock,
        } = parts;

        let tokens = TokenService::new(
            &config.jwt_secret,
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::days(config.refresh_token_ttl_days),
        );
        let activation = ActivationTokens::new(
            config.jwt_secret.clone(),
            Duration::hours(config.activation_token_ttl_hours),
        );
        let accounts = AccountService::new(
            store.clone(),
            mailer,
            tokens,
            activation,
            clock.clone(),
            config.public_base_url.clone(),
        );
        let jobs = JobService::new(
            store.clone(),
            JobCache::new(std::time::Duration::from_secs(config.job_cache_ttl_secs)),
            clock.clone(),
            Duration::days(config.default_job_lifetime_days),
        );
        let maintenance = MaintenanceService::new(
            accounts.clone(),
            jobs.clone(),
            Duration::hours(config.inactive_user_retention_hours),
        );

        Self {
            profiles: ProfileService::new(store.clone(), blobs.clone()),
            experiences: ExperienceService::new(store.clone()),
            applications: ApplicationService::new(store.clone(), blobs, clock.clone()),
            billing: BillingService::new(store, gateway, clock, config.payment_currency.clone()),
            accounts,
            jobs,
            maintenance,
            auth_limiter: RateLimiter::new(config.auth_rps),
            cors_origins: Arc::new(config.cors_allowed_origins.clone()),
        }
    }
}
