use serde::{Deserialize, Serialize};

/// Catalog-wide counts for the administrator dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub total_students: u32,
    pub total_courses: u32,
    /// Registrations with status `registered`.
    pub total_registrations: u32,
    pub active_courses: u32,
    /// Mean enrollment across active courses, rounded.
    pub average_enrollment: u32,
}

/// Seats taken per department, derived from course codes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepartmentEnrollment {
    pub department: String,
    pub enrolled: u32,
}
