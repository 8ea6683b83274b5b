use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Hiring pipeline stage. The older Pending/Declined/Accepted labels are
    /// still accepted on input.
    pub enum ApplicationStatus {
        Applied => "applied" | "Pending" | "pending",
        Reviewed => "reviewed",
        Interviewed => "interviewed",
        Rejected => "rejected" | "Declined" | "declined",
        Hired => "hired" | "Accepted" | "accepted",
    }
}

impl Default for ApplicationStatus {
    fn default() -> Self {
        ApplicationStatus::Applied
    }
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Hired)
    }

    fn stage(&self) -> u8 {
        match self {
            ApplicationStatus::Applied => 0,
            ApplicationStatus::Reviewed => 1,
            ApplicationStatus::Interviewed => 2,
            ApplicationStatus::Rejected | ApplicationStatus::Hired => 3,
        }
    }

    /// Forward-only: an open application may skip ahead to any later stage or
    /// be rejected at any point. Terminal states never move.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == ApplicationStatus::Rejected || next.stage() > self.stage()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub application_date: DateTime<Utc>,
    pub status: ApplicationStatus,
}

/// Listing row joined with the names a reviewer needs.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub application: Application,
    pub candidate_name: String,
    pub job_title: String,
    pub company_id: Uuid,
    pub company_name: String,
}

#[cfg(test)]
mod tests {
    use super::ApplicationStatus::*;
    use super::*;

    #[test]
    fn legacy_labels_parse_as_aliases() {
        assert_eq!("Pending".parse::<ApplicationStatus>().unwrap(), Applied);
        assert_eq!("Declined".parse::<ApplicationStatus>().unwrap(), Rejected);
        assert_eq!("Accepted".parse::<ApplicationStatus>().unwrap(), Hired);
        assert_eq!(Hired.to_string(), "hired");
        assert!("shortlisted".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn transitions_move_forward_only() {
        assert!(Applied.can_transition_to(Reviewed));
        assert!(Applied.can_transition_to(Hired));
        assert!(Reviewed.can_transition_to(Interviewed));
        assert!(Interviewed.can_transition_to(Rejected));
        assert!(!Interviewed.can_transition_to(Applied));
        assert!(!Reviewed.can_transition_to(Reviewed));
    }

    #[test]
    fn terminal_states_are_final() {
        for next in ApplicationStatus::ALL {
            assert!(!Hired.can_transition_to(*next));
            assert!(!Rejected.can_transition_to(*next));
        }
    }
}
