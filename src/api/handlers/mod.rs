use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::middleware::SecurityConfig;
use crate::db::{Database, RegistrationError};
use crate::engine::{
    self, ConflictReport, MeetingInterval, RegistrationDecision, Severity, WeekProjection,
};
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
///
/// Validation errors raised by the database layer ("not found", "must be",
/// "already exists") are safe to expose and come back as BAD_REQUEST.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    if msg.contains("not found") || msg.contains("must be") || msg.contains("already exists") {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Map a registration rejection to a response.
///
/// Gate rejections return 409 with the full report list so the caller can
/// show every conflict and decide what to do next.
fn registration_error(e: RegistrationError) -> Response {
    match e {
        RegistrationError::StudentNotFound | RegistrationError::CourseNotFound => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        RegistrationError::CourseNotActive => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        RegistrationError::AlreadyRegistered => {
            (StatusCode::CONFLICT, e.to_string()).into_response()
        }
        RegistrationError::Conflicts(conflicts) => (
            StatusCode::CONFLICT,
            Json(RegistrationDecision::Rejected { conflicts }),
        )
            .into_response(),
        RegistrationError::Database(e) => internal_error(e).into_response(),
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Courses
// ============================================================

pub async fn list_courses(
    State(db): State<Database>,
    Query(query): Query<ListCoursesQuery>,
) -> Result<Json<Vec<Course>>, (StatusCode, String)> {
    db.list_courses(&query).map(Json).map_err(internal_error)
}

pub async fn get_course(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, (StatusCode, String)> {
    db.get_course(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Course not found".to_string()))
}

pub async fn create_course(
    State(db): State<Database>,
    Json(input): Json<CreateCourseInput>,
) -> Result<(StatusCode, Json<Course>), (StatusCode, String)> {
    db.create_course(input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}

pub async fn update_course(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCourseInput>,
) -> Result<Json<Course>, (StatusCode, String)> {
    db.update_course(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Course not found".to_string()))
}

pub async fn delete_course(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_course(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Course not found".to_string()))
    }
}

pub async fn list_course_registrations(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Registration>>, (StatusCode, String)> {
    db.get_course(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Course not found".to_string()))?;

    db.get_registrations_by_course(id)
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Students
// ============================================================

pub async fn list_students(
    State(db): State<Database>,
) -> Result<Json<Vec<Student>>, (StatusCode, String)> {
    db.get_all_students().map(Json).map_err(internal_error)
}

pub async fn create_student(
    State(db): State<Database>,
    Json(input): Json<CreateStudentInput>,
) -> Result<(StatusCode, Json<Student>), (StatusCode, String)> {
    db.create_student(input)
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(internal_error)
}

pub async fn get_student(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Student>, (StatusCode, String)> {
    db.get_student(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Student not found".to_string()))
}

pub async fn list_student_registrations(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Registration>>, (StatusCode, String)> {
    db.get_student(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Student not found".to_string()))?;

    db.get_registrations_by_student(id)
        .map(Json)
        .map_err(internal_error)
}

/// Week grid of the student's registered courses.
pub async fn get_student_schedule(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<WeekProjection>, (StatusCode, String)> {
    db.get_student(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Student not found".to_string()))?;

    let courses = db.get_registered_courses(id).map_err(internal_error)?;
    let selected: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
    Ok(Json(engine::project_week(&courses, &selected)))
}

// ============================================================
// Registrations
// ============================================================

/// Attempt a registration through the conflict gate.
///
/// `override_conflicts` is only honored for administrators; anyone else gets
/// FORBIDDEN before the gate runs.
pub async fn register(
    State(db): State<Database>,
    State(security): State<SecurityConfig>,
    headers: HeaderMap,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<RegistrationOutcome>), Response> {
    if input.override_conflicts && !security.is_admin(&headers) {
        tracing::warn!(
            "Conflict override requested without admin credentials for student {}",
            input.student_id
        );
        return Err((
            StatusCode::FORBIDDEN,
            "Conflict override requires administrator credentials".to_string(),
        )
            .into_response());
    }

    db.register(input)
        .map(|outcome| (StatusCode::CREATED, Json(outcome)))
        .map_err(registration_error)
}

pub async fn get_registration(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Registration>, (StatusCode, String)> {
    db.get_registration(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Registration not found".to_string()))
}

pub async fn update_registration(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRegistrationInput>,
) -> Result<Json<Registration>, (StatusCode, String)> {
    db.update_registration(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Registration not found".to_string()))
}

pub async fn drop_registration(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Registration>, (StatusCode, String)> {
    db.drop_registration(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Registration not found".to_string()))
}

pub async fn delete_registration(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_registration(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Registration not found".to_string()))
    }
}

// ============================================================
// Conflicts
// ============================================================

/// Dry run of the registration gate. Always 200; the body says whether the
/// attempt would be accepted.
pub async fn check_registration(
    State(db): State<Database>,
    Json(input): Json<CheckRegistrationInput>,
) -> Result<Json<RegistrationDecision>, Response> {
    let conflicts = db
        .check_registration(input.student_id, input.course_id)
        .map_err(registration_error)?;

    Ok(Json(if conflicts.is_empty() {
        RegistrationDecision::Accepted
    } else {
        RegistrationDecision::Rejected { conflicts }
    }))
}

/// Admin-wide scan, with per-severity counts for the dashboard badges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictScanResponse {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub conflicts: Vec<ConflictReport>,
}

impl ConflictScanResponse {
    pub fn new(conflicts: Vec<ConflictReport>) -> Self {
        let count = |s: Severity| conflicts.iter().filter(|c| c.severity == s).count();
        Self {
            total: conflicts.len(),
            high: count(Severity::High),
            medium: count(Severity::Medium),
            low: count(Severity::Low),
            conflicts,
        }
    }
}

pub async fn list_conflicts(
    State(db): State<Database>,
) -> Result<Json<ConflictScanResponse>, (StatusCode, String)> {
    let active = db.get_active_courses().map_err(internal_error)?;

    // Courses in different semesters never share a week
    let mut by_semester: BTreeMap<String, Vec<Course>> = BTreeMap::new();
    for course in active {
        by_semester.entry(course.semester.clone()).or_default().push(course);
    }

    let conflicts = by_semester
        .values()
        .flat_map(|courses| engine::detect_all_conflicts(courses))
        .collect();
    Ok(Json(ConflictScanResponse::new(conflicts)))
}

/// Query parameters for parsing a schedule string.
#[derive(Debug, Deserialize)]
pub struct ParseScheduleQuery {
    pub schedule: String,
}

/// Parse a schedule string. Malformed input returns an empty list.
pub async fn parse_schedule(
    Query(query): Query<ParseScheduleQuery>,
) -> Json<Vec<MeetingInterval>> {
    Json(engine::parse_schedule(&query.schedule))
}

// ============================================================
// Analytics
// ============================================================

pub async fn get_stats(
    State(db): State<Database>,
) -> Result<Json<DashboardStats>, (StatusCode, String)> {
    db.get_dashboard_stats().map(Json).map_err(internal_error)
}

pub async fn get_department_enrollment(
    State(db): State<Database>,
) -> Result<Json<Vec<DepartmentEnrollment>>, (StatusCode, String)> {
    db.get_enrollment_by_department()
        .map(Json)
        .map_err(internal_error)
}
