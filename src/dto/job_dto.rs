use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::job::{Education, ExperienceLevel, ItIndustry, Job, JobType};
use crate::utils::validation::validate_not_blank;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub education: Option<Education>,
    pub it_industry: Option<ItIndustry>,
    pub experience: Option<ExperienceLevel>,
    #[validate(range(min = 1, max = 1_000_000))]
    pub salary: i32,
    #[validate(range(min = 1))]
    pub positions: Option<i32>,
    pub last_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub education: Option<Education>,
    pub it_industry: Option<ItIndustry>,
    pub experience: Option<ExperienceLevel>,
    #[validate(range(min = 1, max = 1_000_000))]
    pub salary: Option<i32>,
    #[validate(range(min = 1))]
    pub positions: Option<i32>,
    pub last_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListQuery {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
    pub job_type: Option<JobType>,
    pub education: Option<Education>,
    pub experience: Option<ExperienceLevel>,
    pub it_industry: Option<ItIndustry>,
    pub min_salary: Option<i32>,
    pub max_salary: Option<i32>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobPage {
    pub items: Vec<Job>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicStats {
    pub topic: String,
    pub count: usize,
    pub avg_positions: f64,
    pub avg_salary: f64,
    pub max_salary: i32,
}

/// Outcome of a job write. A write that leaves the job past its last date
/// removes it (or never stores it, on create).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum JobWrite {
    Saved { job: Job },
    Expired { id: uuid::Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_titles_are_rejected() {
        let create = CreateJobPayload {
            title: "   ".into(),
            description: None,
            location: None,
            job_type: None,
            education: None,
            it_industry: None,
            experience: None,
            salary: 10_000,
            positions: None,
            last_date: None,
        };
        assert!(create.validate().is_err());
        assert!(CreateJobPayload { title: "Engineer".into(), ..create }.validate().is_ok());

        let update = UpdateJobPayload {
            title: Some("\t ".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(UpdateJobPayload::default().validate().is_ok());
    }
}
