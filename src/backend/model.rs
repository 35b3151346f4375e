//! Row and insert types for the hosted profile collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::staging::{StagedEducation, StagedWork};

/// Collection names as exposed by the REST layer.
pub mod tables {
    pub const EDUCATION: &str = "education";
    pub const WORK_EXPERIENCE: &str = "work_experience";
    pub const PROFILES: &str = "profiles";
}

/// Database functions exposed under `/rest/v1/rpc`.
pub mod rpc {
    pub const GET_USER_PROFILE: &str = "get_user_profile_from_auth";
    pub const UPDATE_PROFILE_PHOTO: &str = "update_profile_photo";
}

/// Bucket holding profile photos.
pub const PROFILE_PHOTOS_BUCKET: &str = "profile-photos";

/// Read a year out of a free-form form value.
///
/// Takes the leading integer of the trimmed text, like a lenient `parseInt`:
/// `"2020"` and `"2020-09"` give 2020; empty, absent, or non-numeric text
/// gives `None`.
pub fn parse_year(value: Option<&str>) -> Option<i64> {
    let text = value?.trim_start();
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|year| sign * year)
}

/// Body of an education insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationInsert {
    pub user_id: String,
    pub institution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
}

impl EducationInsert {
    /// Build an insert owned by `user_id` from a staged entry.
    pub fn from_staged(user_id: &str, staged: &StagedEducation) -> Self {
        Self {
            user_id: user_id.to_string(),
            institution: staged.institution.clone(),
            field_of_study: staged.field_of_study.clone(),
            degree: staged.degree.clone(),
            start_year: parse_year(staged.start_date.as_deref()),
            end_year: parse_year(staged.end_date.as_deref()),
        }
    }
}

/// Body of a work-experience insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkExperienceInsert {
    pub user_id: String,
    pub company: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
}

impl WorkExperienceInsert {
    /// Build an insert owned by `user_id` from a staged entry.
    pub fn from_staged(user_id: &str, staged: &StagedWork) -> Self {
        Self {
            user_id: user_id.to_string(),
            company: staged.company.clone(),
            position: staged.position.clone(),
            description: staged.description.clone(),
            start_year: parse_year(staged.start_date.as_deref()),
            end_year: parse_year(staged.end_date.as_deref()),
        }
    }
}

/// A stored education row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub id: String,
    pub user_id: String,
    pub institution: String,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored work-experience row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkExperienceRecord {
    pub id: String,
    pub user_id: String,
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields written after sign-up or from the edit screen.
///
/// An absent photo URL is left out of the body so the stored one is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub legal_name: String,
    pub age: u8,
    pub payam: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo_url: Option<String>,
}

/// A profile as returned by `get_user_profile_from_auth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub legal_name: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub payam: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Skills, with a missing list read as empty.
    pub fn skills(&self) -> &[String] {
        self.skills.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_year_cases() {
        assert_eq!(parse_year(Some("2020")), Some(2020));
        assert_eq!(parse_year(Some(" 2019 ")), Some(2019));
        assert_eq!(parse_year(Some("2020-09")), Some(2020));
        assert_eq!(parse_year(Some("")), None);
        assert_eq!(parse_year(Some("   ")), None);
        assert_eq!(parse_year(Some("soon")), None);
        assert_eq!(parse_year(Some("-")), None);
        assert_eq!(parse_year(None), None);
    }

    #[test]
    fn parse_year_keeps_values_past_i32() {
        assert_eq!(parse_year(Some("99999999999")), Some(99_999_999_999));
        assert_eq!(parse_year(Some("-44")), Some(-44));
        assert_eq!(parse_year(Some("99999999999999999999")), None);
    }

    #[test]
    fn profile_update_omits_absent_photo() {
        let update = ProfileUpdate {
            legal_name: "Ayen".into(),
            age: 30,
            payam: "Bor Payam".into(),
            phone: None,
            bio: None,
            skills: vec![],
            profile_photo_url: None,
        };
        let value = serde_json::to_value(&update).unwrap();
        assert!(value.get("profile_photo_url").is_none());
        assert!(value["phone"].is_null());
    }

    #[test]
    fn profile_row_tolerates_nulls() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "legal_name": "Ayen Majok",
            "age": null,
            "email": "ayen@example.com",
            "phone": null,
            "payam": null,
            "bio": null,
            "skills": null,
            "profile_photo_url": null,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-02T00:00:00Z"
        }))
        .unwrap();
        assert!(profile.skills().is_empty());
        assert_eq!(profile.age, None);
    }

    #[test]
    fn education_insert_converts_both_years() {
        let staged = StagedEducation {
            institution: "X".into(),
            degree: Some("Y".into()),
            start_date: Some("2019".into()),
            end_date: Some("".into()),
            ..Default::default()
        };
        let insert = EducationInsert::from_staged("real-uuid", &staged);
        assert_eq!(insert.start_year, Some(2019));
        assert_eq!(insert.end_year, None);

        let staged = StagedEducation {
            start_date: None,
            end_date: Some("2023".into()),
            ..staged
        };
        let insert = EducationInsert::from_staged("real-uuid", &staged);
        assert_eq!(insert.start_year, None);
        assert_eq!(insert.end_year, Some(2023));
    }

    #[test]
    fn work_insert_converts_both_years() {
        let staged = StagedWork {
            company: "Bor Clinic".into(),
            position: "Nurse".into(),
            start_date: Some("2020".into()),
            end_date: None,
            ..Default::default()
        };
        let insert = WorkExperienceInsert::from_staged("u", &staged);
        assert_eq!(insert.start_year, Some(2020));
        assert_eq!(insert.end_year, None);

        let staged = StagedWork {
            start_date: Some("".into()),
            end_date: Some("2022".into()),
            ..staged
        };
        let insert = WorkExperienceInsert::from_staged("u", &staged);
        assert_eq!(insert.start_year, None);
        assert_eq!(insert.end_year, Some(2022));
    }

    #[test]
    fn education_insert_json_shape() {
        let staged = StagedEducation {
            institution: "X".into(),
            degree: Some("Y".into()),
            start_date: Some("2019".into()),
            end_date: Some("".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(EducationInsert::from_staged("real-uuid", &staged)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "user_id": "real-uuid",
                "institution": "X",
                "degree": "Y",
                "start_year": 2019,
                "end_year": null
            })
        );
    }
}
