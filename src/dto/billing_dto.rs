use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::subscription::PlanType;
use crate::utils::validation::validate_plan_duration;

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("negative_price"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePlanPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub plan_type: PlanType,
    #[validate(custom(function = "validate_plan_duration"))]
    pub duration_days: i32,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub job_post_limit: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribePayload {
    pub plan_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentPayload {
    pub subscription_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyPaymentPayload {
    #[validate(length(min = 1))]
    pub order_id: String,
    #[validate(length(min = 1))]
    pub payment_id: String,
    #[validate(length(min = 1))]
    pub signature: String,
    pub subscription_id: Uuid,
    pub payment_method: Option<String>,
}
