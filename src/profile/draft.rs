//! Entries typed into the profile sections before they are saved.

use serde::{Deserialize, Serialize};

use crate::backend::{EducationInsert, WorkExperienceInsert, parse_year};
use crate::error::{FieldError, ValidationErrors};

/// A new education entry. Years are the raw text of the year inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationDraft {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field_of_study: String,
    #[serde(default)]
    pub start_year: String,
    #[serde(default)]
    pub end_year: String,
}

impl EducationDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        require(&mut errors, "institution", &self.institution, "Institution is required");
        require(&mut errors, "degree", &self.degree, "Degree is required");
        finish(errors)
    }

    pub fn to_insert(&self, user_id: &str) -> EducationInsert {
        EducationInsert {
            user_id: user_id.to_string(),
            institution: self.institution.clone(),
            field_of_study: non_blank(&self.field_of_study),
            degree: Some(self.degree.clone()),
            start_year: parse_year(Some(&self.start_year)),
            end_year: parse_year(Some(&self.end_year)),
        }
    }
}

/// A new work-experience entry. Years are the raw text of the year inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDraft {
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_year: String,
    #[serde(default)]
    pub end_year: String,
}

impl WorkDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        require(&mut errors, "company", &self.company, "Company is required");
        require(&mut errors, "position", &self.position, "Position is required");
        finish(errors)
    }

    pub fn to_insert(&self, user_id: &str) -> WorkExperienceInsert {
        WorkExperienceInsert {
            user_id: user_id.to_string(),
            company: self.company.clone(),
            position: self.position.clone(),
            description: non_blank(&self.description),
            start_year: parse_year(Some(&self.start_year)),
            end_year: parse_year(Some(&self.end_year)),
        }
    }
}

fn require(errors: &mut Vec<FieldError>, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { errors })
    }
}

fn non_blank(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
