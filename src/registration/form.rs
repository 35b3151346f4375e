//! Join form model and validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::backend::ProfileUpdate;
use crate::error::{FieldError, ValidationErrors};
use crate::staging::{StagedEducation, StagedPayload, StagedWork};

/// Payams a member can belong to.
pub const PAYAMS: &[&str] = &[
    "Bor Payam",
    "Anyidi Payam",
    "Kolnyang Payam",
    "Makuach Payam",
    "Panyagara Payam",
];

pub const MIN_AGE: u8 = 13;
pub const MAX_AGE: u8 = 120;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_LEGAL_NAME_LEN: usize = 2;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Education entry as typed into the form. Dates are year strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: String,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

/// Work entry as typed into the form. Dates are year strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkEntry {
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

/// Everything collected by the join screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinForm {
    pub legal_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub age: u8,
    pub payam: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub work_experience: Vec<WorkEntry>,
}

impl JoinForm {
    /// Check every field, collecting all failures.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        let mut fail = |field: String, message: &str| {
            errors.push(FieldError {
                field,
                message: message.to_string(),
            })
        };

        if self.legal_name.trim().chars().count() < MIN_LEGAL_NAME_LEN {
            fail(
                "legal_name".into(),
                "Legal name must be at least 2 characters",
            );
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            fail("email".into(), "Please enter a valid email");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            fail(
                "password".into(),
                "Password must be at least 6 characters",
            );
        }
        if self.age < MIN_AGE {
            fail("age".into(), "You must be at least 13 years old");
        } else if self.age > MAX_AGE {
            fail("age".into(), "Please enter a valid age");
        }
        if self.payam.trim().is_empty() {
            fail("payam".into(), "Please select your payam");
        } else if !PAYAMS.contains(&self.payam.as_str()) {
            fail("payam".into(), "Unknown payam");
        }

        for (i, entry) in self.education.iter().enumerate() {
            if entry.institution.trim().is_empty() {
                fail(
                    format!("education[{i}].institution"),
                    "Institution is required",
                );
            }
        }
        for (i, entry) in self.work_experience.iter().enumerate() {
            if entry.company.trim().is_empty() {
                fail(
                    format!("work_experience[{i}].company"),
                    "Company is required",
                );
            }
            if entry.position.trim().is_empty() {
                fail(
                    format!("work_experience[{i}].position"),
                    "Position is required",
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }

    /// Skills with surrounding whitespace removed and blanks dropped.
    pub fn normalized_skills(&self) -> Vec<String> {
        self.skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Profile fields for the row created by the sign-up trigger.
    pub fn profile_update(&self, profile_photo_url: Option<String>) -> ProfileUpdate {
        ProfileUpdate {
            legal_name: self.legal_name.trim().to_string(),
            age: self.age,
            payam: self.payam.clone(),
            phone: self.phone.clone(),
            bio: self.bio.clone(),
            skills: self.normalized_skills(),
            profile_photo_url,
        }
    }

    /// Nested records as they are written to the staging slot.
    pub fn staged_payload(&self, user_id: &str) -> StagedPayload {
        StagedPayload {
            education: self
                .education
                .iter()
                .map(|e| StagedEducation {
                    institution: e.institution.clone(),
                    field_of_study: e.field_of_study.clone(),
                    degree: e.degree.clone(),
                    start_date: e.start_date.clone(),
                    end_date: e.end_date.clone(),
                })
                .collect(),
            work_experience: self
                .work_experience
                .iter()
                .map(|w| StagedWork {
                    company: w.company.clone(),
                    position: w.position.clone(),
                    description: w.description.clone(),
                    start_date: w.start_date.clone(),
                    end_date: w.end_date.clone(),
                })
                .collect(),
            user_id: user_id.to_string(),
        }
    }
}
