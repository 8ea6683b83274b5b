use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum PlanType {
        Basic => "basic",
        Advance => "advance",
    }
}

/// Allowed subscription window lengths in days.
pub const PLAN_DURATIONS: [i32; 2] = [30, 365];

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub name: String,
    pub plan_type: PlanType,
    pub duration_days: i32,
    pub price: Decimal,
    /// Zero means unlimited.
    pub job_post_limit: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub company_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

impl Subscription {
    /// Opens a new active window. The end date is fixed here and never
    /// recomputed afterwards.
    pub fn start(company_id: Uuid, plan: &SubscriptionPlan, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            plan_id: plan.id,
            start_date: now,
            end_date: now + Duration::days(i64::from(plan.duration_days)),
            is_active: true,
        }
    }

    pub fn has_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.end_date < now
    }
}

text_enum! {
    pub enum PaymentStatus {
        Pending => "pending",
        Success => "success" | "Success",
        Failed => "failed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
}
