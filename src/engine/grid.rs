//! Weekly grid projection.
//!
//! Places the meetings of a selected set of courses onto a fixed grid of
//! Monday–Friday columns and fifteen hourly rows starting at 07:00. A row at
//! minute `t` is occupied by a meeting iff `start <= t < end`, so a 50-minute
//! class fills one row and a 110-minute lab fills two.
//!
//! Saturday and Sunday meetings parse fine but are never placed on the grid.
//! They still count toward contact hours and overlap marking.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schedule::{Day, MeetingInterval};
use crate::models::Course;

/// Rendered columns, in order.
pub const GRID_DAYS: [Day; 5] = [
    Day::Monday,
    Day::Tuesday,
    Day::Wednesday,
    Day::Thursday,
    Day::Friday,
];

/// Minute-of-day of the first row (07:00).
pub const FIRST_ROW_MINUTE: u16 = 7 * 60;
pub const ROW_MINUTES: u16 = 60;
pub const ROW_COUNT: usize = 15;

/// Minute-of-day a row starts at.
pub fn row_start_minute(row: usize) -> u16 {
    FIRST_ROW_MINUTE + ROW_MINUTES * row as u16
}

/// A course meeting as projected: the interval plus the course it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectedMeeting {
    /// `"{course_id}-{Day}"`, unique within one projection.
    pub id: String,
    pub course_id: Uuid,
    pub interval: MeetingInterval,
}

/// One occupied grid cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridCell {
    /// `"{course_id}-{Day}-{row}"`.
    pub id: String,
    /// Id of the [`ProjectedMeeting`] occupying this cell.
    pub meeting_id: String,
    pub course_id: Uuid,
    pub course_code: String,
    pub course_title: String,
    pub instructor: String,
    pub location: String,
    pub day: Day,
    pub row: usize,
    pub row_start_minute: u16,
    pub start_minute: u16,
    pub end_minute: u16,
    pub conflicting: bool,
}

/// Result of [`project_week`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeekProjection {
    pub meetings: Vec<ProjectedMeeting>,
    pub cells: Vec<GridCell>,
    /// Meeting ids that overlap at least one meeting of another course.
    pub conflicting_ids: BTreeSet<String>,
    pub total_credits: u32,
    pub weekly_contact_hours: f64,
}

impl WeekProjection {
    /// Cells at a given column and row. More than one means a clash.
    pub fn cells_at(&self, day: Day, row: usize) -> impl Iterator<Item = &GridCell> {
        self.cells
            .iter()
            .filter(move |c| c.day == day && c.row == row)
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicting_ids.is_empty()
    }
}

/// Project the selected courses onto the week grid.
///
/// Ids in `selected_ids` that are not in `courses` are ignored; repeated ids
/// count once.
pub fn project_week(courses: &[Course], selected_ids: &[Uuid]) -> WeekProjection {
    let mut picked: Vec<&Course> = Vec::new();
    for id in selected_ids {
        if picked.iter().any(|c| c.id == *id) {
            continue;
        }
        if let Some(course) = courses.iter().find(|c| c.id == *id) {
            picked.push(course);
        }
    }

    let total_credits = picked.iter().map(|c| c.credits).sum();

    let meetings: Vec<ProjectedMeeting> = picked
        .iter()
        .flat_map(|course| {
            course.meetings().into_iter().map(|interval| ProjectedMeeting {
                id: format!("{}-{}", course.id, interval.day),
                course_id: course.id,
                interval,
            })
        })
        .collect();

    let weekly_contact_hours = meetings
        .iter()
        .map(|m| f64::from(m.interval.duration_minutes()) / 60.0)
        .sum();

    let conflicting_ids = conflicting_meeting_ids(&meetings);

    let mut cells = Vec::new();
    for course in &picked {
        for meeting in meetings.iter().filter(|m| m.course_id == course.id) {
            let interval = meeting.interval;
            if !interval.day.is_weekday() {
                continue;
            }
            for row in 0..ROW_COUNT {
                let t = row_start_minute(row);
                if !interval.contains(t) {
                    continue;
                }
                cells.push(GridCell {
                    id: format!("{}-{}", meeting.id, row),
                    meeting_id: meeting.id.clone(),
                    course_id: course.id,
                    course_code: course.code.clone(),
                    course_title: course.title.clone(),
                    instructor: course.instructor.clone(),
                    location: course.location.clone(),
                    day: interval.day,
                    row,
                    row_start_minute: t,
                    start_minute: interval.start_minute,
                    end_minute: interval.end_minute,
                    conflicting: conflicting_ids.contains(&meeting.id),
                });
            }
        }
    }
    cells.sort_by_key(|c| (c.row, c.day));

    WeekProjection {
        meetings,
        cells,
        conflicting_ids,
        total_credits,
        weekly_contact_hours,
    }
}

/// Mark every meeting that overlaps a meeting of a different course.
fn conflicting_meeting_ids(meetings: &[ProjectedMeeting]) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    for (i, a) in meetings.iter().enumerate() {
        for b in &meetings[i + 1..] {
            if a.course_id != b.course_id && a.interval.overlaps(&b.interval) {
                ids.insert(a.id.clone());
                ids.insert(b.id.clone());
            }
        }
    }
    ids
}
