use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::ConflictReport;

/// Links a student to a course.
///
/// Only `Registered` rows count toward a course's enrollment and take part in
/// the student's conflict checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Registration {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub status: RegistrationStatus,
    pub semester: String,
    pub registered_at: DateTime<Utc>,
    pub dropped_at: Option<DateTime<Utc>>,
}

/// The status of a registration.
///
/// - `Registered`: Holds a seat
/// - `Waitlisted`: Waiting for a seat; does not count toward enrollment
/// - `Dropped`: Withdrawn by the student
/// - `Pending`: Awaiting administrator approval
/// - `Completed`: Course finished
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
    Waitlisted,
    Dropped,
    Pending,
    Completed,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Waitlisted => "waitlisted",
            Self::Dropped => "dropped",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "registered" => Some(Self::Registered),
            "waitlisted" => Some(Self::Waitlisted),
            "dropped" => Some(Self::Dropped),
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// A registration attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub student_id: Uuid,
    pub course_id: Uuid,
    /// Commit even when the gate reports conflicts. Administrators only.
    #[serde(default)]
    pub override_conflicts: bool,
    /// Record a waitlist entry instead of taking a seat. Skips the gate.
    #[serde(default)]
    pub waitlist: bool,
}

/// Input for changing a registration's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRegistrationInput {
    pub status: RegistrationStatus,
}

/// Result of a registration attempt that was committed.
///
/// `conflicts` is empty for a clean registration and holds the overridden
/// reports when an administrator forced it through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub registration: Registration,
    pub conflicts: Vec<ConflictReport>,
}

/// Dry-run request for the registration gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRegistrationInput {
    pub student_id: Uuid,
    pub course_id: Uuid,
}
