use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub storage_backend: StorageBackend,
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub activation_token_ttl_hours: i64,
    pub public_base_url: String,
    pub job_cache_ttl_secs: u64,
    pub default_job_lifetime_days: i64,
    pub inactive_user_retention_hours: i64,
    pub maintenance_cron: String,
    pub auth_rps: u32,
    pub uploads_dir: String,
    pub cors_allowed_origins: Vec<String>,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub razorpay: Option<RazorpayConfig>,
    pub payment_currency: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:8000".to_string(),
            storage_backend: StorageBackend::Memory,
            database_url: String::new(),
            jwt_secret: "insecure-development-secret".to_string(),
            access_token_ttl_minutes: 60,
            refresh_token_ttl_days: 7,
            activation_token_ttl_hours: 72,
            public_base_url: "http://localhost:8000".to_string(),
            job_cache_ttl_secs: 60,
            default_job_lifetime_days: 10,
            inactive_user_retention_hours: 24,
            maintenance_cron: "0 0 * * * *".to_string(),
            auth_rps: 20,
            uploads_dir: "./uploads".to_string(),
            cors_allowed_origins: Vec::new(),
            smtp: None,
            mail_from: "no-reply@localhost".to_string(),
            razorpay: None,
            payment_currency: "INR".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Config::default();

        let storage_backend = match get_env_or("STORAGE_BACKEND", "postgres").as_str() {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(Error::Config(format!(
                    "Invalid value for STORAGE_BACKEND: {}",
                    other
                )))
            }
        };
        let database_url = match storage_backend {
            StorageBackend::Postgres => get_env("DATABASE_URL")?,
            StorageBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };

        let smtp = match env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty()) {
            Some(host) => Some(SmtpConfig {
                host,
                username: get_env("SMTP_USERNAME")?,
                password: get_env("SMTP_PASSWORD")?,
            }),
            None => None,
        };

        let razorpay = match env::var("RAZORPAY_KEY_ID").ok().filter(|k| !k.trim().is_empty()) {
            Some(key_id) => Some(RazorpayConfig {
                key_id,
                key_secret: get_env("RAZORPAY_KEY_SECRET")?,
                base_url: get_env_url_or("RAZORPAY_BASE_URL", "https://api.razorpay.com")?,
            }),
            None => None,
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            storage_backend,
            database_url,
            jwt_secret: get_env("JWT_SECRET")?,
            access_token_ttl_minutes: get_env_parse_or(
                "ACCESS_TOKEN_TTL_MINUTES",
                defaults.access_token_ttl_minutes,
            )?,
            refresh_token_ttl_days: get_env_parse_or(
                "REFRESH_TOKEN_TTL_DAYS",
                defaults.refresh_token_ttl_days,
            )?,
            activation_token_ttl_hours: get_env_parse_or(
                "ACTIVATION_TOKEN_TTL_HOURS",
                defaults.activation_token_ttl_hours,
            )?,
            public_base_url: get_env_url_or("PUBLIC_BASE_URL", &defaults.public_base_url)?,
            job_cache_ttl_secs: get_env_parse_or("JOB_CACHE_TTL_SECS", defaults.job_cache_ttl_secs)?,
            default_job_lifetime_days: get_env_parse_or(
                "DEFAULT_JOB_LIFETIME_DAYS",
                defaults.default_job_lifetime_days,
            )?,
            inactive_user_retention_hours: get_env_parse_or(
                "INACTIVE_USER_RETENTION_HOURS",
                defaults.inactive_user_retention_hours,
            )?,
            maintenance_cron: get_env_or("MAINTENANCE_CRON", &defaults.maintenance_cron),
            auth_rps: get_env_parse_or("AUTH_RPS", defaults.auth_rps)?,
            uploads_dir: get_env_or("UPLOADS_DIR", &defaults.uploads_dir),
            cors_allowed_origins,
            smtp,
            mail_from: get_env_or("MAIL_FROM", &defaults.mail_from),
            razorpay,
            payment_currency: get_env_or("PAYMENT_CURRENCY", &defaults.payment_currency),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, fallback: &str) -> String {
    env::var(name).unwrap_or_else(|_| fallback.to_string())
}

/// Absolute http(s) URL without a trailing slash.
fn get_env_url_or(name: &str, fallback: &str) -> Result<String> {
    let raw = get_env_or(name, fallback);
    let parsed = Url::parse(raw.trim())
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!("{} must be an http(s) URL", name)));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn get_env_parse_or<T>(name: &str, fallback: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(fallback),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
