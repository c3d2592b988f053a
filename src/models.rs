use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{NaiveDate, DateTime, Utc};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Cycle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cycle {
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewCycle {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub notes: Option<String>,
}

/// Field values written when a cycle is closed.
#[derive(Debug, Clone)]
pub struct CycleClose {
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Severity::Moderate),
            Some("mild") => Ok(Severity::Mild),
            Some("moderate") => Ok(Severity::Moderate),
            Some("severe") => Ok(Severity::Severe),
            Some(other) => Err(AppError::validation(format!(
                "Invalid severity '{}' (expected mild, moderate or severe)",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Severity::parse(Some(&value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SymptomEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cycle_id: Option<Uuid>,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub symptom_type: String,
    #[sqlx(try_from = "String")]
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSymptom {
    pub user_id: Uuid,
    pub cycle_id: Option<Uuid>,
    pub date: NaiveDate,
    pub symptom_type: String,
    pub severity: Severity,
}

#[derive(Serialize)]
pub struct SymptomsByDate {
    pub date: NaiveDate,
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cycle_id: Option<Uuid>,
    pub date: NaiveDate,
    pub mood: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMood {
    pub user_id: Uuid,
    pub cycle_id: Option<Uuid>,
    pub date: NaiveDate,
    pub mood: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Title, content and date of a note, used for both create and update.
#[derive(Debug, Clone)]
pub struct NoteFields {
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub reminder_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub user_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub reminder_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: u64,
}

/// Parses a `YYYY-MM-DD` form value, naming the field on failure.
pub fn parse_date(field: &str, value: Option<&str>) -> Result<NaiveDate, AppError> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
        AppError::validation(format!("Missing required field: {}", field))
    })?;

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        AppError::validation(format!(
            "Invalid {} format (expected YYYY-MM-DD)",
            field
        ))
    })
}

pub fn parse_id(field: &str, value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::validation(format!("Invalid {} (expected UUID)", field)))
}

/// Trims optional free text, mapping blank input to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
