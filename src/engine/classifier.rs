//! Conflict classification.
//!
//! Two entry points:
//!
//! - [`classify`] / [`detect_conflicts`]: one candidate course against a
//!   student's registered set. This is what the registration gate runs.
//! - [`classify_all`] / [`detect_all_conflicts`]: every active course against
//!   every other, for the administrator's conflict review.
//!
//! Checks run in a fixed order (time, room, capacity, prerequisite) and the
//! output keeps that order. Reports are rebuilt from scratch on every call.
//!
//! # Known simplifications
//!
//! Prerequisites are never checked against a transcript, since no model of
//! completed courses exists. Any course that lists prerequisites is flagged
//! with a low-severity report so the student can confirm them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::overlap::{first_overlap, OverlapPair};
use super::schedule::{format_clock, Day, MeetingInterval};
use crate::models::Course;

/// Utilization at or above which a bulk scan emits a "near full" advisory.
pub const NEAR_FULL_THRESHOLD: f64 = 0.90;

const TIME_SUGGESTIONS: &[&str] = &[
    "Look for alternate sections of this course",
    "Consider taking this course in a different semester",
    "Check if there are online or hybrid options available",
];

const ROOM_SUGGESTIONS: &[&str] = &[
    "Move one of the sections to another room",
    "Shift one section to a non-overlapping time",
];

const CAPACITY_SUGGESTIONS: &[&str] = &[
    "Join the waitlist",
    "Check for additional sections",
    "Consider alternative courses that fulfill the same requirements",
];

const PREREQUISITE_SUGGESTIONS: &[&str] = &[
    "Complete prerequisite courses first",
    "Contact your academic advisor for guidance",
    "Check if you can get a prerequisite waiver",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Time,
    Capacity,
    Prerequisite,
    Room,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Capacity => "capacity",
            Self::Prerequisite => "prerequisite",
            Self::Room => "room",
        }
    }

    /// Fixed guidance shown with every report of this kind.
    pub fn suggestions(&self) -> Vec<String> {
        let lines = match self {
            Self::Time => TIME_SUGGESTIONS,
            Self::Room => ROOM_SUGGESTIONS,
            Self::Capacity => CAPACITY_SUGGESTIONS,
            Self::Prerequisite => PREREQUISITE_SUGGESTIONS,
        };
        lines.iter().map(|s| s.to_string()).collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// A single detected problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictReport {
    pub kind: ConflictKind,
    pub severity: Severity,
    /// Courses the report is about. Pair reports list the candidate (or the
    /// earlier course in a bulk scan) first.
    pub involved_courses: Vec<Course>,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_conflict: Option<Day>,
    pub suggestions: Vec<String>,
}

impl ConflictReport {
    fn new(
        kind: ConflictKind,
        severity: Severity,
        involved_courses: Vec<Course>,
        explanation: String,
        day_of_conflict: Option<Day>,
    ) -> Self {
        Self {
            kind,
            severity,
            involved_courses,
            explanation,
            day_of_conflict,
            suggestions: kind.suggestions(),
        }
    }

    pub fn course_ids(&self) -> Vec<Uuid> {
        self.involved_courses.iter().map(|c| c.id).collect()
    }
}

/// What the classifier sees when judging one candidate course.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    /// Catalog snapshot used to resolve `registered_ids`.
    pub all_courses: &'a [Course],
    /// The student's currently registered course ids.
    pub registered_ids: &'a [Uuid],
}

/// Outcome of the registration gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RegistrationDecision {
    Accepted,
    Rejected { conflicts: Vec<ConflictReport> },
}

impl RegistrationDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn conflicts(&self) -> &[ConflictReport] {
        match self {
            Self::Accepted => &[],
            Self::Rejected { conflicts } => conflicts,
        }
    }
}

/// Classify one candidate course against a student's registered set.
///
/// Registered ids that do not resolve to a course in `all_courses` are
/// skipped, as is the candidate's own id.
pub fn classify(course: &Course, context: &ClassifyContext<'_>) -> Vec<ConflictReport> {
    let mut seen = Vec::with_capacity(context.registered_ids.len());
    let registered = context.registered_ids.iter().filter_map(|id| {
        if *id == course.id || seen.contains(id) {
            return None;
        }
        seen.push(*id);
        let found = context.all_courses.iter().find(|c| c.id == *id);
        if found.is_none() {
            tracing::debug!("Skipping unknown registered course {}", id);
        }
        found
    });

    let candidate_meetings = course.meetings();
    let mut reports: Vec<ConflictReport> = registered
        .filter_map(|other| {
            let pair = first_overlap(&candidate_meetings, &other.meetings())?;
            Some(time_report(course, other, &pair, false))
        })
        .collect();

    if let Some(report) = capacity_report(course, false) {
        reports.push(report);
    }

    if !course.prerequisites.is_empty() {
        reports.push(ConflictReport::new(
            ConflictKind::Prerequisite,
            Severity::Low,
            vec![course.clone()],
            format!(
                "You may not have completed all prerequisites for {}: {} (completion is not verified)",
                course.code,
                course.prerequisites.join(", ")
            ),
            None,
        ));
    }

    reports
}

/// Classify a candidate against an already-resolved registered set.
pub fn detect_conflicts(candidate: &Course, registered: &[Course]) -> Vec<ConflictReport> {
    let ids: Vec<Uuid> = registered.iter().map(|c| c.id).collect();
    classify(
        candidate,
        &ClassifyContext {
            all_courses: registered,
            registered_ids: &ids,
        },
    )
}

/// Run the registration gate: any report rejects the attempt.
pub fn evaluate_registration(candidate: &Course, registered: &[Course]) -> RegistrationDecision {
    let conflicts = detect_conflicts(candidate, registered);
    if conflicts.is_empty() {
        RegistrationDecision::Accepted
    } else {
        RegistrationDecision::Rejected { conflicts }
    }
}

/// Scan a set of active courses for time, room and capacity problems.
///
/// Prerequisite reports are not produced here; they only make sense for a
/// student attempting a registration.
pub fn classify_all(active_courses: &[Course]) -> Vec<ConflictReport> {
    let meetings: Vec<Vec<MeetingInterval>> =
        active_courses.iter().map(Course::meetings).collect();
    let mut reports = Vec::new();

    for_each_pair(active_courses, |i, j| {
        if let Some(pair) = first_overlap(&meetings[i], &meetings[j]) {
            reports.push(time_report(
                &active_courses[i],
                &active_courses[j],
                &pair,
                true,
            ));
        }
    });

    for_each_pair(active_courses, |i, j| {
        let (a, b) = (&active_courses[i], &active_courses[j]);
        if a.location.trim().is_empty() || a.location != b.location {
            return;
        }
        if let Some(pair) = first_overlap(&meetings[i], &meetings[j]) {
            reports.push(ConflictReport::new(
                ConflictKind::Room,
                Severity::High,
                vec![a.clone(), b.clone()],
                format!(
                    "Room conflict at {} on {}: {} and {} are scheduled at overlapping times",
                    a.location,
                    pair.day(),
                    a.code,
                    b.code
                ),
                Some(pair.day()),
            ));
        }
    });

    reports.extend(
        active_courses
            .iter()
            .filter_map(|course| capacity_report(course, true)),
    );

    tracing::debug!(
        "Scanned {} active courses, {} conflicts",
        active_courses.len(),
        reports.len()
    );
    reports
}

/// Administrator-wide conflict scan.
pub fn detect_all_conflicts(active_courses: &[Course]) -> Vec<ConflictReport> {
    classify_all(active_courses)
}

/// Visit every unordered pair of distinct courses, earlier index first.
fn for_each_pair(courses: &[Course], mut visit: impl FnMut(usize, usize)) {
    for i in 0..courses.len() {
        for j in (i + 1)..courses.len() {
            if courses[i].id != courses[j].id {
                visit(i, j);
            }
        }
    }
}

fn time_report(a: &Course, b: &Course, pair: &OverlapPair, bulk: bool) -> ConflictReport {
    let explanation = if bulk {
        format!(
            "Time conflict on {}: {} ({}) overlaps with {} ({})",
            pair.day(),
            a.code,
            clock_range(&pair.first),
            b.code,
            clock_range(&pair.second)
        )
    } else {
        format!(
            "{} conflicts with {} on {}: {} overlaps {}",
            a.code,
            b.code,
            pair.day(),
            clock_range(&pair.first),
            clock_range(&pair.second)
        )
    };

    ConflictReport::new(
        ConflictKind::Time,
        Severity::High,
        vec![a.clone(), b.clone()],
        explanation,
        Some(pair.day()),
    )
}

/// Full or over-subscribed courses always report. The near-full advisory is
/// only raised during bulk scans.
fn capacity_report(course: &Course, bulk: bool) -> Option<ConflictReport> {
    let (severity, explanation) = if course.enrolled > course.capacity {
        (
            Severity::High,
            format!(
                "{} is over capacity ({}/{} students)",
                course.code, course.enrolled, course.capacity
            ),
        )
    } else if course.enrolled == course.capacity {
        (
            Severity::Medium,
            format!(
                "{} is at full capacity ({}/{} students)",
                course.code, course.enrolled, course.capacity
            ),
        )
    } else if bulk && course.utilization() >= NEAR_FULL_THRESHOLD {
        (
            Severity::Medium,
            format!(
                "{} is nearly full at {:.0}% capacity ({}/{} students)",
                course.code,
                course.utilization() * 100.0,
                course.enrolled,
                course.capacity
            ),
        )
    } else {
        return None;
    };

    Some(ConflictReport::new(
        ConflictKind::Capacity,
        severity,
        vec![course.clone()],
        explanation,
        None,
    ))
}

fn clock_range(interval: &MeetingInterval) -> String {
    format!(
        "{}-{}",
        format_clock(interval.start_minute),
        format_clock(interval.end_minute)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseStatus;
    use chrono::Utc;

    fn course(code: &str, schedule: &str, location: &str) -> Course {
        Course {
            id: Uuid::new_v4(),
            code: code.to_string(),
            title: format!("{} title", code),
            description: None,
            credits: 3,
            instructor: "Prof. Chen".to_string(),
            schedule: schedule.to_string(),
            location: location.to_string(),
            capacity: 40,
            enrolled: 10,
            waitlisted: 0,
            prerequisites: Vec::new(),
            status: CourseStatus::Active,
            semester: "Fall 2024".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn kinds(reports: &[ConflictReport]) -> Vec<ConflictKind> {
        reports.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn identical_schedules_yield_one_time_report() {
        let registered = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        let candidate = course("MATH245", "MWF 9:00-9:50 AM", "Math 101");

        let reports = detect_conflicts(&candidate, std::slice::from_ref(&registered));

        assert_eq!(kinds(&reports), vec![ConflictKind::Time]);
        assert_eq!(reports[0].severity, Severity::High);
        assert_eq!(reports[0].day_of_conflict, Some(Day::Monday));
        assert_eq!(reports[0].course_ids(), vec![candidate.id, registered.id]);
        assert_eq!(reports[0].suggestions, ConflictKind::Time.suggestions());
    }

    #[test]
    fn back_to_back_courses_do_not_conflict() {
        let registered = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        let candidate = course("CS102", "MWF 9:50-10:40 AM", "Lab A");
        assert!(detect_conflicts(&candidate, &[registered]).is_empty());
    }

    #[test]
    fn capacity_severity_follows_enrollment() {
        let mut full = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        full.enrolled = 40;
        let reports = detect_conflicts(&full, &[]);
        assert_eq!(kinds(&reports), vec![ConflictKind::Capacity]);
        assert_eq!(reports[0].severity, Severity::Medium);

        full.enrolled = 41;
        let reports = detect_conflicts(&full, &[]);
        assert_eq!(reports[0].severity, Severity::High);
    }

    #[test]
    fn near_full_is_only_advisory_in_bulk_scans() {
        let mut busy = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        busy.enrolled = 36;

        assert!(detect_conflicts(&busy, &[]).is_empty());

        let reports = detect_all_conflicts(std::slice::from_ref(&busy));
        assert_eq!(kinds(&reports), vec![ConflictKind::Capacity]);
        assert_eq!(reports[0].severity, Severity::Medium);
        assert!(reports[0].explanation.contains("90%"));
    }

    #[test]
    fn prerequisites_are_flagged_but_not_verified() {
        let mut advanced = course("CS201", "TTh 2:00-3:50 PM", "Eng 205");
        advanced.prerequisites = vec!["CS101".to_string()];

        let reports = detect_conflicts(&advanced, &[]);
        assert_eq!(kinds(&reports), vec![ConflictKind::Prerequisite]);
        assert_eq!(reports[0].severity, Severity::Low);
        assert!(reports[0].explanation.contains("CS101"));
    }

    #[test]
    fn checks_run_in_fixed_order() {
        let registered = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        let mut candidate = course("CS201", "MWF 9:30-10:20 AM", "Lab B");
        candidate.enrolled = 40;
        candidate.prerequisites = vec!["CS101".to_string()];

        let reports = detect_conflicts(&candidate, &[registered]);
        assert_eq!(
            kinds(&reports),
            vec![
                ConflictKind::Time,
                ConflictKind::Capacity,
                ConflictKind::Prerequisite
            ]
        );
    }

    #[test]
    fn classify_skips_unknown_ids_and_the_candidate_itself() {
        let registered = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        let candidate = course("CS102", "MWF 9:00-9:50 AM", "Lab B");
        let all = vec![registered.clone(), candidate.clone()];
        let ids = vec![Uuid::new_v4(), candidate.id, registered.id, registered.id];

        let reports = classify(
            &candidate,
            &ClassifyContext {
                all_courses: &all,
                registered_ids: &ids,
            },
        );

        assert_eq!(kinds(&reports), vec![ConflictKind::Time]);
        assert_eq!(reports[0].course_ids(), vec![candidate.id, registered.id]);
    }

    #[test]
    fn malformed_schedule_never_conflicts() {
        let registered = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        let candidate = course("CS199", "TBA", "Lab A");
        assert!(detect_conflicts(&candidate, &[registered.clone()]).is_empty());
        assert!(detect_all_conflicts(&[registered, candidate]).is_empty());
    }

    #[test]
    fn bulk_scan_separates_time_and_room_reports() {
        let a = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        let b = course("CS102", "MW 9:30-10:20 AM", "Lab A");
        let c = course("MATH245", "TTh 2:00-3:50 PM", "Lab A");

        let reports = detect_all_conflicts(&[a.clone(), b.clone(), c]);

        assert_eq!(kinds(&reports), vec![ConflictKind::Time, ConflictKind::Room]);
        for report in &reports {
            assert_eq!(report.course_ids(), vec![a.id, b.id]);
            assert_eq!(report.day_of_conflict, Some(Day::Monday));
        }
        assert!(reports[1].explanation.contains("Lab A"));
    }

    #[test]
    fn shared_room_without_overlap_is_fine() {
        let a = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        let b = course("CS102", "MWF 10:00-10:50 AM", "Lab A");
        assert!(detect_all_conflicts(&[a, b]).is_empty());
    }

    #[test]
    fn blank_locations_never_share_a_room() {
        let a = course("CS101", "MWF 9:00-9:50 AM", "");
        let b = course("CS102", "MWF 9:00-9:50 AM", "");
        assert_eq!(kinds(&detect_all_conflicts(&[a, b])), vec![ConflictKind::Time]);
    }

    #[test]
    fn gate_accepts_clean_registration() {
        let registered = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        let candidate = course("MATH245", "MWF 10:00-10:50 AM", "Math 101");
        assert!(evaluate_registration(&candidate, &[registered]).is_accepted());
    }

    #[test]
    fn gate_rejects_with_reports() {
        let registered = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        let candidate = course("MATH245", "MWF 9:00-9:50 AM", "Math 101");
        let decision = evaluate_registration(&candidate, &[registered]);
        assert!(!decision.is_accepted());
        assert_eq!(decision.conflicts().len(), 1);
    }

    #[test]
    fn report_serializes_with_snake_case_tags() {
        let registered = course("CS101", "MWF 9:00-9:50 AM", "Lab A");
        let candidate = course("MATH245", "MWF 9:00-9:50 AM", "Math 101");
        let decision = evaluate_registration(&candidate, &[registered]);

        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["decision"], "rejected");
        assert_eq!(json["conflicts"][0]["kind"], "time");
        assert_eq!(json["conflicts"][0]["severity"], "high");
        assert_eq!(json["conflicts"][0]["day_of_conflict"], "Monday");
    }
}
