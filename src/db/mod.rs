mod schema;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::engine::{self, ClassifyContext, ConflictReport};
use crate::models::*;

/// Environment variable that overrides the default database location.
pub const DB_PATH_ENV: &str = "REGISTRAR_DB_PATH";

/// Course columns, with enrollment counted from registrations on every read.
const COURSE_SELECT: &str = "SELECT c.id, c.code, c.title, c.description, c.credits, c.instructor,
        c.schedule, c.location, c.capacity,
        (SELECT COUNT(*) FROM registrations r WHERE r.course_id = c.id AND r.status = 'registered'),
        (SELECT COUNT(*) FROM registrations r WHERE r.course_id = c.id AND r.status = 'waitlisted'),
        c.prerequisites, c.status, c.semester, c.created_at, c.updated_at
     FROM courses c";

const REGISTRATION_SELECT: &str =
    "SELECT id, student_id, course_id, status, semester, registered_at, dropped_at FROM registrations";

/// Business-rule rejections of a registration attempt.
///
/// None of these are system failures; the caller decides whether to retry,
/// join the waitlist, override or give up.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Student not found")]
    StudentNotFound,

    #[error("Course not found")]
    CourseNotFound,

    #[error("Course is not open for registration")]
    CourseNotActive,

    #[error("Student is already registered for this course")]
    AlreadyRegistered,

    #[error("Registration rejected with {} conflict(s)", .0.len())]
    Conflicts(Vec<ConflictReport>),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RegistrationError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.into())
    }
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open `$REGISTRAR_DB_PATH`, or `registrar.db` in the platform data dir.
    pub fn open_default() -> Result<Self> {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            return Self::open(PathBuf::from(path));
        }
        let dirs = directories::ProjectDirs::from("", "", "registrar")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("registrar.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Course operations
    // ============================================================

    pub fn get_all_courses(&self) -> Result<Vec<Course>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_courses(&conn, "ORDER BY c.code", [])
    }

    /// Courses with status `active`, the input to the admin conflict scan.
    pub fn get_active_courses(&self) -> Result<Vec<Course>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_courses(&conn, "WHERE c.status = 'active' ORDER BY c.code", [])
    }

    /// Filter, search and paginate the catalog.
    pub fn list_courses(&self, query: &ListCoursesQuery) -> Result<Vec<Course>> {
        let courses = self.get_all_courses()?;
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);

        Ok(courses
            .into_iter()
            .filter(|c| query.matches(c))
            .skip(offset)
            .take(limit)
            .collect())
    }

    pub fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_course(&conn, id)
    }

    pub fn create_course(&self, input: CreateCourseInput) -> Result<Course> {
        validate_course_numbers(input.credits, input.capacity)?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();
        let status = input.status.unwrap_or(CourseStatus::Draft);

        conn.execute(
            "INSERT INTO courses (id, code, title, description, credits, instructor, schedule, location,
                                  capacity, prerequisites, status, semester, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                id.to_string(),
                &input.code,
                &input.title,
                &input.description,
                input.credits,
                &input.instructor,
                &input.schedule,
                &input.location,
                input.capacity,
                serde_json::to_string(&input.prerequisites)?,
                status.as_str(),
                &input.semester,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;

        if engine::parse_schedule(&input.schedule).is_empty() {
            tracing::warn!(
                "Course {} has no parseable schedule ({:?}); it will never conflict",
                input.code,
                input.schedule
            );
        }

        Ok(Course {
            id,
            code: input.code,
            title: input.title,
            description: input.description,
            credits: input.credits,
            instructor: input.instructor,
            schedule: input.schedule,
            location: input.location,
            capacity: input.capacity,
            enrolled: 0,
            waitlisted: 0,
            prerequisites: input.prerequisites,
            status,
            semester: input.semester,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_course(&self, id: Uuid, input: UpdateCourseInput) -> Result<Option<Course>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = query_course(&conn, id)? else {
            return Ok(None);
        };

        let now = Utc::now();
        let course = Course {
            id,
            code: input.code.unwrap_or(existing.code),
            title: input.title.unwrap_or(existing.title),
            description: input.description.or(existing.description),
            credits: input.credits.unwrap_or(existing.credits),
            instructor: input.instructor.unwrap_or(existing.instructor),
            schedule: input.schedule.unwrap_or(existing.schedule),
            location: input.location.unwrap_or(existing.location),
            capacity: input.capacity.unwrap_or(existing.capacity),
            enrolled: existing.enrolled,
            waitlisted: existing.waitlisted,
            prerequisites: input.prerequisites.unwrap_or(existing.prerequisites),
            status: input.status.unwrap_or(existing.status),
            semester: input.semester.unwrap_or(existing.semester),
            created_at: existing.created_at,
            updated_at: now,
        };
        validate_course_numbers(course.credits, course.capacity)?;

        conn.execute(
            "UPDATE courses SET code = ?, title = ?, description = ?, credits = ?, instructor = ?,
                    schedule = ?, location = ?, capacity = ?, prerequisites = ?, status = ?,
                    semester = ?, updated_at = ?
             WHERE id = ?",
            rusqlite::params![
                &course.code,
                &course.title,
                &course.description,
                course.credits,
                &course.instructor,
                &course.schedule,
                &course.location,
                course.capacity,
                serde_json::to_string(&course.prerequisites)?,
                course.status.as_str(),
                &course.semester,
                now.to_rfc3339(),
                id.to_string(),
            ],
        )?;

        Ok(Some(course))
    }

    /// Remove a course from the catalog. Registrations that point at it are
    /// left in place and ignored by conflict checks.
    pub fn delete_course(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM courses WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Student operations
    // ============================================================

    pub fn get_all_students(&self) -> Result<Vec<Student>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, email, major, year, created_at FROM students ORDER BY name",
        )?;

        let students = stmt
            .query_map([], student_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(students)
    }

    pub fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_student(&conn, id)
    }

    pub fn create_student(&self, input: CreateStudentInput) -> Result<Student> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let taken: i32 = conn.query_row(
            "SELECT COUNT(*) FROM students WHERE email = ?",
            [&input.email],
            |row| row.get(0),
        )?;
        if taken > 0 {
            anyhow::bail!("A student with email {} already exists", input.email);
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO students (id, name, email, major, year, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.email,
                &input.major,
                &input.year,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Student {
            id,
            name: input.name,
            email: input.email,
            major: input.major,
            year: input.year,
            created_at: now,
        })
    }

    // ============================================================
    // Registration operations
    // ============================================================

    pub fn get_registration(&self, id: Uuid) -> Result<Option<Registration>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_registration(&conn, id)
    }

    pub fn get_registrations_by_student(&self, student_id: Uuid) -> Result<Vec<Registration>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "{} WHERE student_id = ? ORDER BY registered_at",
            REGISTRATION_SELECT
        ))?;

        let registrations = stmt
            .query_map([student_id.to_string()], registration_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(registrations)
    }

    pub fn get_registrations_by_course(&self, course_id: Uuid) -> Result<Vec<Registration>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "{} WHERE course_id = ? ORDER BY registered_at",
            REGISTRATION_SELECT
        ))?;

        let registrations = stmt
            .query_map([course_id.to_string()], registration_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(registrations)
    }

    /// Courses the student currently holds a seat in. Registrations whose
    /// course no longer exists are skipped.
    pub fn get_registered_courses(&self, student_id: Uuid) -> Result<Vec<Course>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_courses(
            &conn,
            "WHERE c.id IN (SELECT course_id FROM registrations WHERE student_id = ? AND status = 'registered')
             ORDER BY c.code",
            [student_id.to_string()],
        )
    }

    /// Run the registration gate for a student and course without writing.
    pub fn check_registration(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Vec<ConflictReport>, RegistrationError> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let course = load_attempt(&conn, student_id, course_id)?;
        gate_reports(&conn, student_id, &course)
    }

    /// Attempt a registration.
    ///
    /// The snapshot read, the gate and the insert happen under one lock, so the
    /// decision is made against exactly the state it is applied to.
    pub fn register(&self, input: RegisterInput) -> Result<RegistrationOutcome, RegistrationError> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let course = load_attempt(&conn, input.student_id, input.course_id)?;

        if input.waitlist {
            let registration = insert_registration(
                &conn,
                input.student_id,
                &course,
                RegistrationStatus::Waitlisted,
            )?;
            tracing::info!(
                "Student {} waitlisted for {}",
                input.student_id,
                course.code
            );
            return Ok(RegistrationOutcome {
                registration,
                conflicts: Vec::new(),
            });
        }

        let conflicts = gate_reports(&conn, input.student_id, &course)?;

        if !conflicts.is_empty() {
            if !input.override_conflicts {
                tracing::info!(
                    "Rejected registration of student {} for {}: {} conflict(s)",
                    input.student_id,
                    course.code,
                    conflicts.len()
                );
                return Err(RegistrationError::Conflicts(conflicts));
            }
            tracing::warn!(
                "Administrator override: registering student {} for {} despite {} conflict(s)",
                input.student_id,
                course.code,
                conflicts.len()
            );
        }

        let registration = insert_registration(
            &conn,
            input.student_id,
            &course,
            RegistrationStatus::Registered,
        )?;

        Ok(RegistrationOutcome {
            registration,
            conflicts,
        })
    }

    /// Change a registration's status. Moving to `Dropped` stamps `dropped_at`.
    pub fn update_registration(
        &self,
        id: Uuid,
        input: UpdateRegistrationInput,
    ) -> Result<Option<Registration>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = query_registration(&conn, id)? else {
            return Ok(None);
        };

        let dropped_at = match input.status {
            RegistrationStatus::Dropped => Some(existing.dropped_at.unwrap_or_else(Utc::now)),
            _ => None,
        };

        conn.execute(
            "UPDATE registrations SET status = ?, dropped_at = ? WHERE id = ?",
            (
                input.status.as_str(),
                dropped_at.map(|d| d.to_rfc3339()),
                id.to_string(),
            ),
        )?;

        Ok(Some(Registration {
            status: input.status,
            dropped_at,
            ..existing
        }))
    }

    pub fn drop_registration(&self, id: Uuid) -> Result<Option<Registration>> {
        self.update_registration(
            id,
            UpdateRegistrationInput {
                status: RegistrationStatus::Dropped,
            },
        )
    }

    pub fn delete_registration(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM registrations WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Analytics
    // ============================================================

    pub fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        let courses = self.get_all_courses()?;
        let conn = self.conn.lock().expect("database lock poisoned");

        let total_students: u32 =
            conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        let total_registrations: u32 = conn.query_row(
            "SELECT COUNT(*) FROM registrations WHERE status = 'registered'",
            [],
            |row| row.get(0),
        )?;

        let active: Vec<&Course> = courses
            .iter()
            .filter(|c| c.status == CourseStatus::Active)
            .collect();
        let average_enrollment = if active.is_empty() {
            0
        } else {
            let total: u32 = active.iter().map(|c| c.enrolled).sum();
            (f64::from(total) / active.len() as f64).round() as u32
        };

        Ok(DashboardStats {
            total_students,
            total_courses: courses.len() as u32,
            total_registrations,
            active_courses: active.len() as u32,
            average_enrollment,
        })
    }

    pub fn get_enrollment_by_department(&self) -> Result<Vec<DepartmentEnrollment>> {
        let mut departments: BTreeMap<String, u32> = BTreeMap::new();
        for course in self.get_all_courses()? {
            *departments.entry(course.department().to_string()).or_default() += course.enrolled;
        }

        Ok(departments
            .into_iter()
            .map(|(department, enrolled)| DepartmentEnrollment {
                department,
                enrolled,
            })
            .collect())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

// ============================================================
// Row mapping and query helpers (caller holds the lock)
// ============================================================

fn query_courses(
    conn: &Connection,
    clause: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Course>> {
    let mut stmt = conn.prepare(&format!("{} {}", COURSE_SELECT, clause))?;
    let courses = stmt
        .query_map(params, course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(courses)
}

fn query_course(conn: &Connection, id: Uuid) -> Result<Option<Course>> {
    let mut stmt = conn.prepare(&format!("{} WHERE c.id = ?", COURSE_SELECT))?;
    let found = stmt.query_row([id.to_string()], course_from_row).optional()?;
    Ok(found)
}

fn query_student(conn: &Connection, id: Uuid) -> Result<Option<Student>> {
    let mut stmt =
        conn.prepare("SELECT id, name, email, major, year, created_at FROM students WHERE id = ?")?;
    let found = stmt.query_row([id.to_string()], student_from_row).optional()?;
    Ok(found)
}

fn query_registration(conn: &Connection, id: Uuid) -> Result<Option<Registration>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?", REGISTRATION_SELECT))?;
    let found = stmt.query_row([id.to_string()], registration_from_row).optional()?;
    Ok(found)
}

fn query_student_registrations(conn: &Connection, student_id: Uuid) -> Result<Vec<Registration>> {
    let mut stmt = conn.prepare(&format!("{} WHERE student_id = ?", REGISTRATION_SELECT))?;
    let registrations = stmt
        .query_map([student_id.to_string()], registration_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(registrations)
}

/// Resolve and check the student and course of an attempt.
///
/// Shared by the dry run and the real registration, so both reject an
/// unknown student, an unknown or closed course, and a pair that already
/// holds a non-dropped registration in the same way.
fn load_attempt(
    conn: &Connection,
    student_id: Uuid,
    course_id: Uuid,
) -> Result<Course, RegistrationError> {
    query_student(conn, student_id)?.ok_or(RegistrationError::StudentNotFound)?;
    let course = query_course(conn, course_id)?.ok_or(RegistrationError::CourseNotFound)?;
    if course.status != CourseStatus::Active {
        return Err(RegistrationError::CourseNotActive);
    }

    let already = query_student_registrations(conn, student_id)?
        .iter()
        .any(|r| r.course_id == course.id && r.status != RegistrationStatus::Dropped);
    if already {
        return Err(RegistrationError::AlreadyRegistered);
    }

    Ok(course)
}

/// Classify `course` against the student's registered set in the same
/// semester. Registered courses from other semesters are not in the catalog
/// slice and are skipped like unknown ids.
fn gate_reports(
    conn: &Connection,
    student_id: Uuid,
    course: &Course,
) -> Result<Vec<ConflictReport>, RegistrationError> {
    let registered_ids: Vec<Uuid> = query_student_registrations(conn, student_id)?
        .into_iter()
        .filter(|r| r.status == RegistrationStatus::Registered)
        .map(|r| r.course_id)
        .collect();
    let catalog = query_courses(conn, "WHERE c.semester = ?", [&course.semester])?;

    Ok(engine::classify(
        course,
        &ClassifyContext {
            all_courses: &catalog,
            registered_ids: &registered_ids,
        },
    ))
}

fn insert_registration(
    conn: &Connection,
    student_id: Uuid,
    course: &Course,
    status: RegistrationStatus,
) -> Result<Registration> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO registrations (id, student_id, course_id, status, semester, registered_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        (
            id.to_string(),
            student_id.to_string(),
            course.id.to_string(),
            status.as_str(),
            &course.semester,
            now.to_rfc3339(),
        ),
    )?;

    Ok(Registration {
        id,
        student_id,
        course_id: course.id,
        status,
        semester: course.semester.clone(),
        registered_at: now,
        dropped_at: None,
    })
}

fn validate_course_numbers(credits: u32, capacity: u32) -> Result<()> {
    if credits == 0 {
        anyhow::bail!("Credits must be a positive integer");
    }
    if capacity == 0 {
        anyhow::bail!("Capacity must be a positive integer");
    }
    Ok(())
}

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    let prerequisites: String = row.get(11)?;
    Ok(Course {
        id: parse_uuid(row.get::<_, String>(0)?),
        code: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        credits: row.get(4)?,
        instructor: row.get(5)?,
        schedule: row.get(6)?,
        location: row.get(7)?,
        capacity: row.get(8)?,
        enrolled: row.get(9)?,
        waitlisted: row.get(10)?,
        prerequisites: serde_json::from_str(&prerequisites).unwrap_or_default(),
        status: CourseStatus::from_str(&row.get::<_, String>(12)?).unwrap_or(CourseStatus::Draft),
        semester: row.get(13)?,
        created_at: parse_datetime(row.get::<_, String>(14)?),
        updated_at: parse_datetime(row.get::<_, String>(15)?),
    })
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        major: row.get(3)?,
        year: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn registration_from_row(row: &Row<'_>) -> rusqlite::Result<Registration> {
    Ok(Registration {
        id: parse_uuid(row.get::<_, String>(0)?),
        student_id: parse_uuid(row.get::<_, String>(1)?),
        course_id: parse_uuid(row.get::<_, String>(2)?),
        status: RegistrationStatus::from_str(&row.get::<_, String>(3)?)
            .unwrap_or(RegistrationStatus::Pending),
        semester: row.get(4)?,
        registered_at: parse_datetime(row.get::<_, String>(5)?),
        dropped_at: row.get::<_, Option<String>>(6)?.map(parse_datetime),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
