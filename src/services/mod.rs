pub mod account_service;
pub mod application_service;
pub mod billing_service;
pub mod experience_service;
pub mod job_cache;
pub mod job_service;
pub mod maintenance_service;
pub mod mail_service;
pub mod payment_gateway;
pub mod profile_service;
pub mod storage_service;
pub mod token_service;
