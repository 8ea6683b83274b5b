//! Field rules shared by request payloads.

use chrono::NaiveDate;
use validator::ValidationError;

use crate::models::subscription::PLAN_DURATIONS;
use crate::models::user::Role;

pub const MAX_SALARY: i32 = 1_000_000;

pub fn validate_public_role(role: &Role) -> Result<(), ValidationError> {
    match role {
        Role::Candidate | Role::Company => Ok(()),
        Role::Admin => Err(ValidationError::new("role_not_self_assignable")),
    }
}

pub fn validate_plan_duration(days: i32) -> Result<(), ValidationError> {
    if PLAN_DURATIONS.contains(&days) {
        Ok(())
    } else {
        Err(ValidationError::new("unsupported_duration"))
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// `end` may be absent; when present it cannot precede `start`.
pub fn check_date_range(start: NaiveDate, end: Option<NaiveDate>) -> bool {
    end.map_or(true, |end| end >= start)
}

/// Lower-cased extension of an uploaded file name.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Rejects uploads whose leading bytes contradict the declared extension.
pub fn sniff_matches(ext: &str, bytes: &[u8]) -> bool {
    match ext {
        "pdf" => bytes.starts_with(b"%PDF"),
        "png" => bytes.starts_with(&[0x89, b'P', b'N', b'G']),
        "jpg" | "jpeg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "webp" => bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        "docx" => bytes.starts_with(b"PK\x03\x04"),
        "doc" => bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]),
        "rtf" => bytes.starts_with(b"{\\rtf"),
        "txt" => std::str::from_utf8(bytes).is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_cannot_self_register() {
        assert!(validate_public_role(&Role::Candidate).is_ok());
        assert!(validate_public_role(&Role::Admin).is_err());
    }

    #[test]
    fn only_listed_plan_durations() {
        assert!(validate_plan_duration(30).is_ok());
        assert!(validate_plan_duration(90).is_err());
    }

    #[test]
    fn date_range_allows_open_end() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let before = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert!(check_date_range(start, None));
        assert!(check_date_range(start, Some(start)));
        assert!(!check_date_range(start, Some(before)));
    }

    #[test]
    fn extension_and_magic_bytes() {
        assert_eq!(file_extension("CV.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("noext"), None);
        assert!(sniff_matches("pdf", b"%PDF-1.7 ..."));
        assert!(!sniff_matches("pdf", b"MZ\x90\x00"));
        assert!(!sniff_matches("exe", b"MZ"));
    }
}
