//! Wire models, named the way the backend names its JSON fields

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

id_type!(
    /// Backend id of a project
    ProjectId
);
id_type!(
    /// Backend id of a time entry or time box entry
    EntryId
);
id_type!(FolderId);
id_type!(NoteId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Email")]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    #[serde(rename = "ID")]
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectCreate {
    pub name: String,
    pub description: String,
    pub color: String,
}

/// Anything with a start and an end: logged entries and planned time boxes.
pub trait Interval {
    fn description(&self) -> &str;
    fn project_id(&self) -> Option<ProjectId>;
    fn start_date(&self) -> DateTime<Utc>;
    fn end_date(&self) -> DateTime<Utc>;

    fn duration(&self) -> Duration {
        self.end_date() - self.start_date()
    }

    fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }
}

macro_rules! interval_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "PascalCase")]
        pub struct $name {
            #[serde(rename = "ID")]
            pub id: EntryId,
            pub description: String,
            #[serde(rename = "ProjectID")]
            pub project_id: Option<ProjectId>,
            pub start_date: DateTime<Utc>,
            pub end_date: DateTime<Utc>,
        }

        impl Interval for $name {
            fn description(&self) -> &str {
                &self.description
            }

            fn project_id(&self) -> Option<ProjectId> {
                self.project_id
            }

            fn start_date(&self) -> DateTime<Utc> {
                self.start_date
            }

            fn end_date(&self) -> DateTime<Utc> {
                self.end_date
            }
        }
    };
}

interval_type!(
    /// A logged interval of actual work
    TimeEntry
);
interval_type!(
    /// A planned interval. Shares its shape with [`TimeEntry`] but has its
    /// own lifecycle.
    TimeBoxEntry
);

/// Create payload for both `/time-entries` and `/time-box-entries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryCreate {
    pub description: String,
    #[serde(rename = "ProjectID")]
    pub project_id: Option<ProjectId>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Interval for EntryCreate {
    fn description(&self) -> &str {
        &self.description
    }

    fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }
}

/// `null` clears the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignProjectPayload {
    #[serde(rename = "ProjectID")]
    pub project_id: Option<ProjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Folder {
    #[serde(rename = "ID")]
    pub id: FolderId,
    pub name: String,
    #[serde(rename = "ParentID", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<FolderId>,
    #[serde(rename = "UserID", default)]
    pub user_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Body of both folder create and folder update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FolderInput {
    pub name: String,
    #[serde(rename = "ParentID", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<FolderId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Note {
    #[serde(rename = "ID")]
    pub id: NoteId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "FolderID", default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
    #[serde(rename = "UserID", default)]
    pub user_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Body of both note create and note update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NoteInput {
    pub title: String,
    pub content: String,
    #[serde(rename = "FolderID", default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_entry_uses_backend_field_names() {
        let json = r#"{
            "ID": 7,
            "Description": "Write report",
            "ProjectID": null,
            "StartDate": "2024-05-01T14:30:00Z",
            "EndDate": "2024-05-01T16:00:00Z"
        }"#;
        let entry: TimeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, EntryId(7));
        assert_eq!(entry.project_id, None);
        assert_eq!(
            entry.start_date,
            Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap()
        );
        assert_eq!(entry.duration_minutes(), 90);
    }

    #[test]
    fn test_entry_create_keeps_null_project() {
        let draft = EntryCreate {
            description: "Focus".to_string(),
            project_id: None,
            start_date: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 5, 1, 9, 25, 0).unwrap(),
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert!(value["ProjectID"].is_null());
        assert_eq!(value["Description"], "Focus");
    }

    #[test]
    fn test_root_folder_omits_parent() {
        let input = FolderInput {
            name: "Inbox".to_string(),
            parent_id: None,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert!(value.get("ParentID").is_none());

        let input = FolderInput {
            name: "Work".to_string(),
            parent_id: Some(FolderId(3)),
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["ParentID"], 3);
    }

    #[test]
    fn test_id_parses_from_cli_text() {
        assert_eq!("42".parse::<ProjectId>().unwrap(), ProjectId(42));
        assert!("abc".parse::<FolderId>().is_err());
    }
}
