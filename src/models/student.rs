use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A student who can hold registrations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub major: Option<String>,
    /// Class year, e.g. `"Junior"`.
    pub year: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}
