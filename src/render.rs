//! Plain-text rendering for the CLI.

use crate::engine::{
    format_clock, row_start_minute, ConflictReport, Severity, WeekProjection, GRID_DAYS,
    ROW_COUNT,
};

const CELL_WIDTH: usize = 10;
const LABEL_WIDTH: usize = 8;
const CONFLICT: char = '!';

fn severity_symbol(severity: Severity) -> char {
    match severity {
        Severity::High => '●',
        Severity::Medium => '○',
        Severity::Low => '·',
    }
}

/// Render a week projection as a text table, one row per hour.
///
/// A cell lists the codes of the courses meeting in it, separated by `/`.
/// Cells holding a conflicting meeting are prefixed with `!`.
///
/// Example output:
/// ```text
///          | Mon        | Tue        | Wed        | Thu        | Fri
///  9:00 AM | !CS101     |            | !CS101     |            | CS101
/// 10:00 AM | !MA201     |            | !MA201     |            |
/// ```
pub fn render_week(week: &WeekProjection) -> String {
    let mut output = String::new();

    output.push_str(&" ".repeat(LABEL_WIDTH));
    for day in GRID_DAYS {
        output.push_str(" | ");
        output.push_str(&pad(&day.as_str()[..3]));
    }
    push_line_end(&mut output);

    for row in 0..ROW_COUNT {
        let label = format_clock(row_start_minute(row));
        output.push_str(&format!("{:>width$}", label, width = LABEL_WIDTH));

        for day in GRID_DAYS {
            let cells: Vec<_> = week.cells_at(day, row).collect();
            let mut text = String::new();
            if cells.iter().any(|c| c.conflicting) {
                text.push(CONFLICT);
            }
            let codes: Vec<&str> = cells.iter().map(|c| c.course_code.as_str()).collect();
            text.push_str(&codes.join("/"));

            output.push_str(" | ");
            output.push_str(&pad(&text));
        }
        push_line_end(&mut output);
    }

    output.push_str(&format!(
        "{} credits, {:.1} contact hours per week\n",
        week.total_credits, week.weekly_contact_hours
    ));
    if week.has_conflicts() {
        output.push_str(&format!(
            "{} {} meeting(s) overlap another course\n",
            CONFLICT,
            week.conflicting_ids.len()
        ));
    }
    output
}

/// Render conflict reports as a bulleted list, one report per line.
pub fn render_conflicts(reports: &[ConflictReport]) -> String {
    if reports.is_empty() {
        return "No conflicts\n".to_string();
    }

    let mut output = String::new();
    for report in reports {
        output.push(severity_symbol(report.severity));
        output.push(' ');
        output.push_str(&format!("[{}] {}", report.kind.as_str(), report.explanation));
        output.push('\n');
    }
    output
}

/// Fit text to one cell, truncating on a char boundary.
fn pad(text: &str) -> String {
    let truncated: String = text.chars().take(CELL_WIDTH).collect();
    format!("{:<width$}", truncated, width = CELL_WIDTH)
}

fn push_line_end(output: &mut String) {
    let trimmed = output.trim_end_matches(' ').len();
    output.truncate(trimmed);
    output.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::project_week;
    use crate::models::{Course, CourseStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn course(code: &str, schedule: &str) -> Course {
        Course {
            id: Uuid::new_v4(),
            code: code.to_string(),
            title: format!("{} title", code),
            description: None,
            credits: 3,
            instructor: "Dr. Smith".to_string(),
            schedule: schedule.to_string(),
            location: "Room 101".to_string(),
            capacity: 30,
            enrolled: 0,
            waitlisted: 0,
            prerequisites: Vec::new(),
            status: CourseStatus::Active,
            semester: "Fall 2024".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_week() {
        let output = render_week(&WeekProjection::default());
        let lines: Vec<&str> = output.lines().collect();

        // Header, fifteen rows, totals.
        assert_eq!(lines.len(), ROW_COUNT + 2);
        assert_eq!(
            lines[0],
            "         | Mon        | Tue        | Wed        | Thu        | Fri"
        );
        assert_eq!(lines[1].trim_end_matches(['|', ' ']), " 7:00 AM");
        assert_eq!(lines[ROW_COUNT + 1], "0 credits, 0.0 contact hours per week");
        assert!(!output.contains(CONFLICT));
    }

    #[test]
    fn test_single_course() {
        let cs101 = course("CS101", "MWF 9:00-9:50 AM");
        let week = project_week(std::slice::from_ref(&cs101), &[cs101.id]);
        let output = render_week(&week);
        let nine = output.lines().find(|l| l.starts_with(" 9:00 AM")).unwrap();

        assert_eq!(nine.matches("CS101").count(), 3);
        assert!(!nine.contains(CONFLICT));
        assert!(output.contains("3 credits, 2.5 contact hours per week"));
    }

    #[test]
    fn test_conflicting_cells_are_marked() {
        let cs101 = course("CS101", "MWF 9:00-9:50 AM");
        let ma201 = course("MA201", "MW 9:30-10:20 AM");
        let courses = vec![cs101.clone(), ma201.clone()];
        let week = project_week(&courses, &[cs101.id, ma201.id]);
        let output = render_week(&week);

        let nine = output.lines().find(|l| l.starts_with(" 9:00 AM")).unwrap();
        assert_eq!(nine.matches("!CS101").count(), 2);
        // The Friday meeting overlaps nothing and is not marked.
        assert!(nine.ends_with("| CS101"));

        let ten = output.lines().find(|l| l.starts_with("10:00 AM")).unwrap();
        assert_eq!(ten.matches("!MA201").count(), 2);
        assert!(output.contains("! 4 meeting(s) overlap another course"));
    }

    #[test]
    fn test_render_conflicts() {
        assert_eq!(render_conflicts(&[]), "No conflicts\n");

        let cs101 = course("CS101", "MWF 9:00-9:50 AM");
        let ma201 = course("MA201", "MW 9:30-10:20 AM");
        let reports = crate::engine::detect_conflicts(&cs101, std::slice::from_ref(&ma201));
        let output = render_conflicts(&reports);

        assert!(output.starts_with("● [time]"));
        assert_eq!(output.lines().count(), reports.len());
    }
}
