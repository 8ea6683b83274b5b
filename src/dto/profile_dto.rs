use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::profile::CompanyProfile;
use crate::utils::validation::{check_date_range, validate_not_blank};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompanyProfilePayload {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub company_name: String,
    #[validate(length(min = 1, max = 100))]
    pub industry: String,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    #[validate(url)]
    pub website: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCompanyProfilePayload {
    #[validate(length(min = 1, max = 100))]
    pub company_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub industry: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CandidateProfilePayload {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    pub birthday: Option<NaiveDate>,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    pub skills: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCandidateProfilePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
}

/// What anonymous visitors see of a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicCompany {
    pub id: Uuid,
    pub company_name: String,
    pub industry: String,
    pub location: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl From<CompanyProfile> for PublicCompany {
    fn from(p: CompanyProfile) -> Self {
        Self {
            id: p.id,
            company_name: p.company_name,
            industry: p.industry,
            location: p.location,
            website: p.website,
            description: p.description,
            image: p.image,
        }
    }
}

fn validate_experience_dates(payload: &ExperiencePayload) -> Result<(), ValidationError> {
    if check_date_range(payload.start_date, payload.end_date) {
        Ok(())
    } else {
        Err(ValidationError::new("end_date_before_start_date"))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_experience_dates"))]
pub struct ExperiencePayload {
    #[validate(length(min = 1, max = 100))]
    pub company_name: String,
    #[validate(length(min = 1, max = 100))]
    pub position: String,
    pub salary: Option<Decimal>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateExperiencePayload {
    #[validate(length(min = 1, max = 100))]
    pub company_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub position: Option<String>,
    pub salary: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_end_cannot_precede_start() {
        let payload = ExperiencePayload {
            company_name: "Acme".into(),
            position: "Dev".into(),
            salary: None,
            start_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 4, 1),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn public_projection_drops_owner() {
        let profile = CompanyProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            company_name: "Acme".into(),
            industry: "Software".into(),
            location: "Pune".into(),
            website: None,
            description: None,
            image: None,
        };
        let json = serde_json::to_value(PublicCompany::from(profile)).unwrap();
        assert!(json.get("user_id").is_none());
        assert_eq!(json["company_name"], "Acme");
    }
}
