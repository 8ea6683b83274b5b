use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{auth::resolve_principal, cors::configured_cors, rate_limit::rps_middleware};
use crate::services::profile_service::MAX_UPLOAD_BYTES;
use crate::AppState;

pub mod admin;
pub mod applications;
pub mod auth;
pub mod billing;
pub mod experience;
pub mod health;
pub mod jobs;
pub mod profiles;

/// Multipart framing on top of the largest accepted upload.
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub fn router(state: AppState) -> Router {
    let auth_api = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/activate/:uidb64/:token", get(auth::activate))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/token/refresh", post(auth::refresh))
        .route_layer(middleware::from_fn_with_state(
            state.auth_limiter.clone(),
            rps_middleware,
        ));

    let profile_api = Router::new()
        .route("/api/profiles/company", post(profiles::create_company))
        .route("/api/profiles/company/me", get(profiles::my_company))
        .route(
            "/api/profiles/company/:id",
            get(profiles::get_company)
                .patch(profiles::update_company)
                .delete(profiles::delete_company),
        )
        .route(
            "/api/profiles/company/:id/image",
            post(profiles::upload_company_image),
        )
        .route("/api/profiles/candidate", post(profiles::create_candidate))
        .route("/api/profiles/candidate/me", get(profiles::my_candidate))
        .route(
            "/api/profiles/candidate/:id",
            get(profiles::get_candidate)
                .patch(profiles::update_candidate)
                .delete(profiles::delete_candidate),
        )
        .route(
            "/api/profiles/candidate/:id/resume",
            post(profiles::upload_resume),
        )
        .route(
            "/api/profiles/candidate/:id/image",
            post(profiles::upload_candidate_image),
        )
        .route("/api/companies", get(profiles::list_companies))
        .route("/api/companies/:id", get(profiles::get_public_company))
        .route(
            "/api/experiences",
            get(experience::list_experiences).post(experience::create_experience),
        )
        .route(
            "/api/experiences/:id",
            get(experience::get_experience)
                .patch(experience::update_experience)
                .delete(experience::delete_experience),
        );

    let job_api = Router::new()
        .route("/api/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route("/api/jobs/mine", get(jobs::my_jobs))
        .route("/api/jobs/stats/:topic", get(jobs::topic_stats))
        .route(
            "/api/jobs/:id",
            get(jobs::get_job)
                .patch(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route(
            "/api/applications",
            get(applications::list_applications).post(applications::apply),
        )
        .route(
            "/api/applications/resumes",
            get(applications::download_resumes),
        )
        .route(
            "/api/applications/:id",
            get(applications::get_application).delete(applications::delete_application),
        )
        .route(
            "/api/applications/:id/status",
            patch(applications::update_status),
        );

    let billing_api = Router::new()
        .route("/api/plans", get(billing::list_plans).post(billing::create_plan))
        .route("/api/plans/:id", get(billing::get_plan))
        .route(
            "/api/subscriptions",
            get(billing::my_subscriptions).post(billing::subscribe),
        )
        .route("/api/payments", post(billing::create_payment))
        .route("/api/payments/verify", post(billing::verify_payment));

    let admin_api = Router::new()
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/inactive", delete(admin::purge_inactive_users))
        .route("/api/admin/users/:id", delete(admin::delete_user))
        .route("/api/admin/companies", get(admin::list_companies))
        .route("/api/admin/candidates", get(admin::list_candidates))
        .route("/api/admin/subscriptions", get(admin::list_subscriptions))
        .route("/api/admin/payments", get(admin::list_payments));

    let cors = configured_cors(&state.cors_origins);

    Router::new()
        .route("/health", get(health::health))
        .merge(auth_api)
        .merge(profile_api)
        .merge(job_api)
        .merge(billing_api)
        .merge(admin_api)
        .layer(middleware::from_fn_with_state(state.clone(), resolve_principal))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
