use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
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

const USER_COLUMNS: &str = "id, email, password_hash, phone_number, role, is_active, is_staff, \
     is_superuser, created_at, updated_at";

const JOB_SELECT: &str = r#"
    SELECT j.id, j.company_id, c.company_name, j.title, j.description, j.location,
           j.job_type, j.education, j.it_industry, j.experience, j.salary, j.positions,
           j.last_date, j.is_active, j.created_at
    FROM jobs j
    JOIN company_profiles c ON c.id = j.company_id
"#;

const APPLICATION_SELECT: &str = r#"
    SELECT a.id, a.candidate_id, a.job_id, a.application_date, a.status,
           cp.name AS candidate_name, j.title AS job_title,
           j.company_id, co.company_name
    FROM applications a
    JOIN candidate_profiles cp ON cp.id = a.candidate_id
    JOIN jobs j ON j.id = a.job_id
    JOIN company_profiles co ON co.id = j.company_id
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.constraint().unwrap_or_default().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound,
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.phone_number)
            .bind(user.role)
            .bind(user.is_active)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<User> {
        let sql = format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(active)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_inactive_users(&self, cutoff: Option<DateTime<Utc>>) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM users WHERE NOT is_active AND ($1::timestamptz IS NULL OR created_at < $1)",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn insert_company_profile(&self, p: &CompanyProfile) -> StoreResult<CompanyProfile> {
        Ok(sqlx::query_as::<_, CompanyProfile>(
            r#"
            INSERT INTO company_profiles
                (id, user_id, company_name, industry, location, website, description, image)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(p.user_id)
        .bind(&p.company_name)
        .bind(&p.industry)
        .bind(&p.location)
        .bind(&p.website)
        .bind(&p.description)
        .bind(&p.image)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_company_profile(&self, id: Uuid) -> StoreResult<Option<CompanyProfile>> {
        Ok(
            sqlx::query_as::<_, CompanyProfile>("SELECT * FROM company_profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_company_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<CompanyProfile>> {
        Ok(sqlx::query_as::<_, CompanyProfile>(
            "SELECT * FROM company_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_company_profile(&self, p: &CompanyProfile) -> StoreResult<CompanyProfile> {
        Ok(sqlx::query_as::<_, CompanyProfile>(
            r#"
            UPDATE company_profiles
            SET company_name = $2, industry = $3, location = $4,
                website = $5, description = $6, image = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(&p.company_name)
        .bind(&p.industry)
        .bind(&p.location)
        .bind(&p.website)
        .bind(&p.description)
        .bind(&p.image)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_company_profile(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM company_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_company_profiles(&self) -> StoreResult<Vec<CompanyProfile>> {
        Ok(sqlx::query_as::<_, CompanyProfile>(
            "SELECT * FROM company_profiles ORDER BY company_name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_candidate_profile(&self, p: &CandidateProfile) -> StoreResult<CandidateProfile> {
        Ok(sqlx::query_as::<_, CandidateProfile>(
            r#"
            INSERT INTO candidate_profiles
                (id, user_id, name, birthday, location, skills, experience, education, resume, image)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(p.user_id)
        .bind(&p.name)
        .bind(p.birthday)
        .bind(&p.location)
        .bind(&p.skills)
        .bind(&p.experience)
        .bind(&p.education)
        .bind(&p.resume)
        .bind(&p.image)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_candidate_profile(&self, id: Uuid) -> StoreResult<Option<CandidateProfile>> {
        Ok(sqlx::query_as::<_, CandidateProfile>(
            "SELECT * FROM candidate_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_candidate_profile_by_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Option<CandidateProfile>> {
        Ok(sqlx::query_as::<_, CandidateProfile>(
            "SELECT * FROM candidate_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_candidate_profile(&self, p: &CandidateProfile) -> StoreResult<CandidateProfile> {
        Ok(sqlx::query_as::<_, CandidateProfile>(
            r#"
            UPDATE candidate_profiles
            SET name = $2, birthday = $3, location = $4, skills = $5,
                experience = $6, education = $7, resume = $8, image = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(&p.name)
        .bind(p.birthday)
        .bind(&p.location)
        .bind(&p.skills)
        .bind(&p.experience)
        .bind(&p.education)
        .bind(&p.resume)
        .bind(&p.image)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_candidate_profile(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM candidate_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_candidate_profiles(&self) -> StoreResult<Vec<CandidateProfile>> {
        Ok(
            sqlx::query_as::<_, CandidateProfile>("SELECT * FROM candidate_profiles ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }
}

#[async_trait]
impl ExperienceStore for PgStore {
    async fn insert_experience(&self, e: &Experience) -> StoreResult<Experience> {
        Ok(sqlx::query_as::<_, Experience>(
            r#"
            INSERT INTO experiences
                (id, candidate_id, company_name, position, salary, start_date, end_date)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(e.id)
        .bind(e.candidate_id)
        .bind(&e.company_name)
        .bind(&e.position)
        .bind(e.salary)
        .bind(e.start_date)
        .bind(e.end_date)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_experience(&self, id: Uuid) -> StoreResult<Option<Experience>> {
        Ok(
            sqlx::query_as::<_, Experience>("SELECT * FROM experiences WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_experiences(&self, candidate_id: Uuid) -> StoreResult<Vec<Experience>> {
        Ok(sqlx::query_as::<_, Experience>(
            "SELECT * FROM experiences WHERE candidate_id = $1 ORDER BY start_date DESC",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_experience(&self, e: &Experience) -> StoreResult<Experience> {
        Ok(sqlx::query_as::<_, Experience>(
            r#"
            UPDATE experiences
            SET company_name = $2, position = $3, salary = $4, start_date = $5, end_date = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(e.id)
        .bind(&e.company_name)
        .bind(&e.position)
        .bind(e.salary)
        .bind(e.start_date)
        .bind(e.end_date)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_experience(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM experiences WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert_job(&self, job: &Job) -> StoreResult<Job> {
        sqlx::query(
            r#"
            INSERT INTO jobs
                (id, company_id, title, description, location, job_type, education,
                 it_industry, experience, salary, positions, last_date, is_active, created_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
            "#,
        )
        .bind(job.id)
        .bind(job.company_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.location)
        .bind(job.job_type)
        .bind(job.education)
        .bind(job.it_industry)
        .bind(job.experience)
        .bind(job.salary)
        .bind(job.positions)
        .bind(job.last_date)
        .bind(job.is_active)
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;
        self.find_job(job.id).await?.ok_or(StoreError::NotFound)
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let sql = format!("{JOB_SELECT} WHERE j.id = $1");
        Ok(sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_job(&self, job: &Job) -> StoreResult<Job> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET title = $2, description = $3, location = $4, job_type = $5, education = $6,
                it_industry = $7, experience = $8, salary = $9, positions = $10,
                last_date = $11, is_active = $12
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.location)
        .bind(job.job_type)
        .bind(job.education)
        .bind(job.it_industry)
        .bind(job.experience)
        .bind(job.salary)
        .bind(job.positions)
        .bind(job.last_date)
        .bind(job.is_active)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.find_job(job.id).await?.ok_or(StoreError::NotFound)
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        let sql = format!("{JOB_SELECT} ORDER BY j.created_at DESC");
        Ok(sqlx::query_as::<_, Job>(&sql).fetch_all(&self.pool).await?)
    }

    async fn list_company_jobs(&self, company_id: Uuid) -> StoreResult<Vec<Job>> {
        let sql = format!("{JOB_SELECT} WHERE j.company_id = $1 ORDER BY j.created_at DESC");
        Ok(sqlx::query_as::<_, Job>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn delete_expired_jobs(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM jobs WHERE last_date < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn insert_application(&self, a: &Application) -> StoreResult<Application> {
        Ok(sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (id, candidate_id, job_id, application_date, status)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(a.id)
        .bind(a.candidate_id)
        .bind(a.job_id)
        .bind(a.application_date)
        .bind(a.status)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_application(&self, id: Uuid) -> StoreResult<Option<ApplicationDetail>> {
        let sql = format!("{APPLICATION_SELECT} WHERE a.id = $1");
        Ok(sqlx::query_as::<_, ApplicationDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_application_for(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> StoreResult<Option<Application>> {
        Ok(sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE candidate_id = $1 AND job_id = $2",
        )
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application> {
        Ok(sqlx::query_as::<_, Application>(
            "UPDATE applications SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_application(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_applications(
        &self,
        scope: ApplicationScope,
    ) -> StoreResult<Vec<ApplicationDetail>> {
        let (filter, id) = match scope {
            ApplicationScope::All => ("TRUE", None),
            ApplicationScope::Company(id) => ("j.company_id = $1", Some(id)),
            ApplicationScope::Candidate(id) => ("a.candidate_id = $1", Some(id)),
        };
        let sql = format!("{APPLICATION_SELECT} WHERE {filter} ORDER BY a.application_date DESC");
        let mut query = sqlx::query_as::<_, ApplicationDetail>(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl BillingStore for PgStore {
    async fn insert_plan(&self, plan: &SubscriptionPlan) -> StoreResult<SubscriptionPlan> {
        Ok(sqlx::query_as::<_, SubscriptionPlan>(
            r#"
            INSERT INTO subscription_plans
                (id, name, plan_type, duration_days, price, job_post_limit)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(plan.id)
        .bind(&plan.name)
        .bind(plan.plan_type)
        .bind(plan.duration_days)
        .bind(plan.price)
        .bind(plan.job_post_limit)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_plan(&self, id: Uuid) -> StoreResult<Option<SubscriptionPlan>> {
        Ok(sqlx::query_as::<_, SubscriptionPlan>(
            "SELECT * FROM subscription_plans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_plans(&self) -> StoreResult<Vec<SubscriptionPlan>> {
        Ok(sqlx::query_as::<_, SubscriptionPlan>(
            "SELECT * FROM subscription_plans ORDER BY price",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_subscription(&self, s: &Subscription) -> StoreResult<Subscription> {
        Ok(sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (id, company_id, plan_id, start_date, end_date, is_active)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(s.id)
        .bind(s.company_id)
        .bind(s.plan_id)
        .bind(s.start_date)
        .bind(s.end_date)
        .bind(s.is_active)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_subscription(&self, id: Uuid) -> StoreResult<Option<Subscription>> {
        Ok(
            sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_active_subscription(
        &self,
        company_id: Uuid,
        plan_id: Uuid,
    ) -> StoreResult<Option<Subscription>> {
        Ok(sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE company_id = $1 AND plan_id = $2 AND is_active",
        )
        .bind(company_id)
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn deactivate_subscription(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("UPDATE subscriptions SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_subscriptions(&self, company_id: Option<Uuid>) -> StoreResult<Vec<Subscription>> {
        Ok(sqlx::query_as::<_, Subscription>(
            r#"
            SELECT * FROM subscriptions
            WHERE $1::uuid IS NULL OR company_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_payment(&self, p: &Payment) -> StoreResult<Payment> {
        Ok(sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments
                (id, subscription_id, order_id, payment_id, signature, amount, currency,
                 status, payment_method, created_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(p.subscription_id)
        .bind(&p.order_id)
        .bind(&p.payment_id)
        .bind(&p.signature)
        .bind(p.amount)
        .bind(&p.currency)
        .bind(p.status)
        .bind(&p.payment_method)
        .bind(p.created_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_payment_for_subscription(
        &self,
        subscription_id: Uuid,
    ) -> StoreResult<Option<Payment>> {
        Ok(sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE subscription_id = $1",
        )
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_payment(&self, p: &Payment) -> StoreResult<Payment> {
        Ok(sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET payment_id = $2, signature = $3, status = $4, payment_method = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(&p.payment_id)
        .bind(&p.signature)
        .bind(p.status)
        .bind(&p.payment_method)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_payments(&self) -> StoreResult<Vec<Payment>> {
        Ok(
            sqlx::query_as::<_, Payment>("SELECT * FROM payments ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }
}
