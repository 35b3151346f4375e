//! Staged payload types: the JSON shape stored under the pending-data key.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Nested registration records waiting to be written to the backend.
///
/// Parsing is lenient: a `null` or missing list is empty, and years may be
/// stored as text or numbers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StagedPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<StagedEducation>,
    #[serde(default, rename = "workExperience", deserialize_with = "null_as_default")]
    pub work_experience: Vec<StagedWork>,
    /// Account id at staging time. Informational only: the reconciler uses the
    /// live session's id as the foreign key.
    #[serde(default, rename = "userId", deserialize_with = "null_as_default")]
    pub user_id: String,
}

impl StagedPayload {
    /// Parse the stored text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Whether there is anything to write.
    pub fn has_records(&self) -> bool {
        !self.education.is_empty() || !self.work_experience.is_empty()
    }
}

/// An education entry captured at sign-up. Dates are year strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StagedEducation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub institution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "year_text"
    )]
    pub start_date: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "year_text"
    )]
    pub end_date: Option<String>,
}

impl StagedEducation {
    pub fn new(institution: impl Into<String>) -> Self {
        Self {
            institution: institution.into(),
            ..Default::default()
        }
    }
}

/// A work-experience entry captured at sign-up. Dates are year strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StagedWork {
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "year_text"
    )]
    pub start_date: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "year_text"
    )]
    pub end_date: Option<String>,
}

impl StagedWork {
    pub fn new(company: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            position: position.into(),
            ..Default::default()
        }
    }
}

/// `null` reads as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A year as it may appear in stored form data.
#[derive(Deserialize)]
#[serde(untagged)]
enum YearValue {
    Text(String),
    Int(i64),
    Float(f64),
    Other(IgnoredAny),
}

/// Keep years as text; numbers are rendered, anything else is dropped.
fn year_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<YearValue>::deserialize(deserializer)?.and_then(|value| match value {
            YearValue::Text(text) => Some(text),
            YearValue::Int(n) => Some(n.to_string()),
            YearValue::Float(f) => Some(f.to_string()),
            YearValue::Other(_) => None,
        }),
    )
}
