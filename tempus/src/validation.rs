//! Client-side checks run before anything is sent to the backend

use tempus_api::models::{FolderInput, Interval, NoteInput, ProjectCreate};
use tempus_api::ApiError;
use thiserror::Error;

/// Longest time box that can be planned, in minutes.
pub const MAX_TIME_BOX_MINUTES: i64 = 8 * 60;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Description is required")]
    EmptyDescription,

    #[error("End time must be after start time")]
    EndBeforeStart,

    #[error("Time box must be at least 1 minute long")]
    TimeBoxTooShort,

    #[error("Time box cannot be longer than 8 hours")]
    TimeBoxTooLong,

    #[error("Name is required")]
    EmptyName,

    #[error("Title is required")]
    EmptyTitle,

    #[error("Invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),

    #[error("A folder cannot be moved into itself or one of its subfolders")]
    CyclicParent,
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Rules for logged entries, manual or edited.
pub fn validate_time_entry(entry: &impl Interval) -> Result<(), ValidationError> {
    if entry.description().trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if entry.end_date() < entry.start_date() {
        return Err(ValidationError::EndBeforeStart);
    }
    Ok(())
}

/// Entry rules plus the 1 minute to 8 hour length window.
pub fn validate_time_box(entry: &impl Interval) -> Result<(), ValidationError> {
    validate_time_entry(entry)?;
    let minutes = entry.duration_minutes();
    if minutes < 1 {
        return Err(ValidationError::TimeBoxTooShort);
    }
    if minutes > MAX_TIME_BOX_MINUTES {
        return Err(ValidationError::TimeBoxTooLong);
    }
    Ok(())
}

pub fn validate_project(project: &ProjectCreate) -> Result<(), ValidationError> {
    if project.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !is_hex_color(&project.color) {
        return Err(ValidationError::InvalidColor(project.color.clone()));
    }
    Ok(())
}

pub fn validate_folder(folder: &FolderInput) -> Result<(), ValidationError> {
    if folder.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

pub fn validate_note(note: &NoteInput) -> Result<(), ValidationError> {
    if note.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use tempus_api::models::EntryCreate;

    use super::*;

    fn draft(description: &str, minutes: i64) -> EntryCreate {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        EntryCreate {
            description: description.to_string(),
            project_id: None,
            start_date: start,
            end_date: start + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_time_entry_rules() {
        assert_eq!(validate_time_entry(&draft("Work", 30)), Ok(()));
        assert_eq!(validate_time_entry(&draft("Work", 0)), Ok(()));
        assert_eq!(
            validate_time_entry(&draft("  ", 30)),
            Err(ValidationError::EmptyDescription)
        );
        assert_eq!(
            validate_time_entry(&draft("Work", -5)),
            Err(ValidationError::EndBeforeStart)
        );
    }

    #[test]
    fn test_time_box_length_window() {
        assert_eq!(validate_time_box(&draft("Plan", 1)), Ok(()));
        assert_eq!(validate_time_box(&draft("Plan", 480)), Ok(()));
        assert_eq!(
            validate_time_box(&draft("Plan", 0)),
            Err(ValidationError::TimeBoxTooShort)
        );
        assert_eq!(
            validate_time_box(&draft("Plan", 481)),
            Err(ValidationError::TimeBoxTooLong)
        );
    }

    #[test]
    fn test_project_color() {
        let mut project = ProjectCreate {
            name: "Acme".to_string(),
            description: String::new(),
            color: "#0a7dff".to_string(),
        };
        assert_eq!(validate_project(&project), Ok(()));

        project.color = "blue".to_string();
        assert!(matches!(
            validate_project(&project),
            Err(ValidationError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_validation_error_becomes_api_error() {
        let err: ApiError = ValidationError::EmptyDescription.into();
        assert_eq!(err.class(), tempus_api::ErrorClass::Validation);
        assert_eq!(err.to_string(), "Invalid input: Description is required");
    }
}
