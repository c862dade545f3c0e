use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{parse_schedule, MeetingInterval};

/// A course offering in the catalog.
///
/// `enrolled` and `waitlisted` are derived: the database counts
/// registrations with status `registered` and `waitlisted` on every read,
/// so they are never written independently.
///
/// `schedule` is kept as the raw meeting string (e.g. `"MWF 9:00-9:50 AM"`).
/// A schedule that does not match the grammar means the course meets never.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: Uuid,
    /// Department plus number, e.g. `CS101`.
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub credits: u32,
    pub instructor: String,
    pub schedule: String,
    /// Room label. Two courses with the identical label share a room.
    pub location: String,
    pub capacity: u32,
    pub enrolled: u32,
    pub waitlisted: u32,
    /// Course codes that must be completed first.
    pub prerequisites: Vec<String>,
    pub status: CourseStatus,
    pub semester: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Meeting intervals parsed from `schedule`.
    pub fn meetings(&self) -> Vec<MeetingInterval> {
        parse_schedule(&self.schedule)
    }

    /// Alphabetic prefix of the course code (`"CS201"` → `"CS"`).
    pub fn department(&self) -> &str {
        let end = self
            .code
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(self.code.len());
        &self.code[..end]
    }

    /// `enrolled / capacity`, or `0.0` for a zero-capacity record.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.enrolled) / f64::from(self.capacity)
    }

    pub fn is_full(&self) -> bool {
        self.enrolled >= self.capacity
    }
}

/// Lifecycle of a course listing.
///
/// - `Draft`: Being prepared, not visible to students
/// - `Active`: Open for registration and included in conflict scans
/// - `Archived`: A past offering kept for reference
/// - `Cancelled`: Withdrawn from the catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    Active,
    Archived,
    Cancelled,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Input for creating a course. Enrollment always starts at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseInput {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub credits: u32,
    pub instructor: String,
    pub schedule: String,
    pub location: String,
    pub capacity: u32,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Defaults to `Draft` if not specified.
    #[serde(default)]
    pub status: Option<CourseStatus>,
    pub semester: String,
}

/// Input for updating a course. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCourseInput {
    pub code: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub credits: Option<u32>,
    pub instructor: Option<String>,
    pub schedule: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<u32>,
    pub prerequisites: Option<Vec<String>>,
    pub status: Option<CourseStatus>,
    pub semester: Option<String>,
}

/// Query parameters for listing and searching courses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCoursesQuery {
    /// Case-insensitive match against code, title, instructor and description.
    pub q: Option<String>,
    pub department: Option<String>,
    pub status: Option<CourseStatus>,
    pub semester: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl ListCoursesQuery {
    pub fn matches(&self, course: &Course) -> bool {
        if let Some(status) = self.status {
            if course.status != status {
                return false;
            }
        }
        if let Some(department) = &self.department {
            if !course.department().eq_ignore_ascii_case(department) {
                return false;
            }
        }
        if let Some(semester) = &self.semester {
            if &course.semester != semester {
                return false;
            }
        }
        match &self.q {
            Some(q) if !q.trim().is_empty() => {
                let term = q.trim().to_lowercase();
                course.code.to_lowercase().contains(&term)
                    || course.title.to_lowercase().contains(&term)
                    || course.instructor.to_lowercase().contains(&term)
                    || course
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            }
            _ => true,
        }
    }
}
