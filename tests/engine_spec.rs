use chrono::Utc;
use registrar::engine::*;
use registrar::models::{Course, CourseStatus};
use uuid::Uuid;

fn make_course(code: &str, schedule: &str, location: &str) -> Course {
    Course {
        id: Uuid::new_v4(),
        code: code.to_string(),
        title: format!("{} title", code),
        description: None,
        credits: 3,
        instructor: "Dr. Patel".to_string(),
        schedule: schedule.to_string(),
        location: location.to_string(),
        capacity: 40,
        enrolled: 12,
        waitlisted: 0,
        prerequisites: Vec::new(),
        status: CourseStatus::Active,
        semester: "Fall 2024".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn interval(day: Day, start: u16, end: u16) -> MeetingInterval {
    MeetingInterval::new(day, start, end).expect("valid interval")
}

mod parsing {
    use super::*;

    #[test]
    fn monday_wednesday_friday_morning() {
        let meetings = parse_schedule("MWF 9:00-9:50 AM");

        let days: Vec<Day> = meetings.iter().map(|m| m.day).collect();
        assert_eq!(days, vec![Day::Monday, Day::Wednesday, Day::Friday]);
        assert!(meetings
            .iter()
            .all(|m| m.start_minute == 540 && m.end_minute == 590));
    }

    #[test]
    fn tuesday_thursday_afternoon() {
        let meetings = parse_schedule("TTh 2:00-3:50 PM");

        assert_eq!(
            meetings,
            vec![
                interval(Day::Tuesday, 840, 950),
                interval(Day::Thursday, 840, 950),
            ]
        );
    }

    #[test]
    fn twelve_pm_is_noon_and_twelve_am_is_midnight() {
        assert_eq!(parse_schedule("MWF 12:00-12:50 PM")[0].start_minute, 720);
        assert_eq!(parse_schedule("MWF 12:00-12:50 AM")[0].start_minute, 0);
    }

    #[test]
    fn built_schedules_parse_to_the_picked_meetings() {
        let schedule = format_schedule(&[Day::Tuesday, Day::Thursday], 570, 645).expect("expressible");
        assert_eq!(schedule, "TTh 9:30-10:45 AM");
        assert_eq!(
            parse_schedule(&schedule),
            vec![
                interval(Day::Tuesday, 570, 645),
                interval(Day::Thursday, 570, 645),
            ]
        );

        assert_eq!(format_schedule(&[Day::Wednesday], 690, 765), None);
    }

    #[test]
    fn malformed_input_yields_no_meetings() {
        for schedule in ["garbage", "", " MWF 9:00-9:50 AM", "mwf 9:00-9:50 AM", "TBA"] {
            assert!(
                parse_schedule(schedule).is_empty(),
                "expected no meetings for {:?}",
                schedule
            );
        }
    }
}

mod overlap {
    use super::*;

    #[test]
    fn touching_intervals_do_not_overlap() {
        let a = interval(Day::Monday, 540, 590);
        let b = interval(Day::Monday, 590, 640);
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&b, &a));
    }

    #[test]
    fn strictly_overlapping_intervals_overlap() {
        let a = interval(Day::Monday, 540, 600);
        let b = interval(Day::Monday, 590, 650);
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
    }

    #[test]
    fn same_times_on_different_days_do_not_overlap() {
        let a = interval(Day::Monday, 540, 600);
        let b = interval(Day::Tuesday, 540, 600);
        assert!(!overlaps(&a, &b));
    }
}

mod classification {
    use super::*;

    #[test]
    fn full_course_is_a_medium_capacity_conflict() {
        let mut course = make_course("CS101", "MWF 9:00-9:50 AM", "Room 101");
        course.enrolled = 40;

        let reports = detect_conflicts(&course, &[]);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ConflictKind::Capacity);
        assert_eq!(reports[0].severity, Severity::Medium);
    }

    #[test]
    fn over_capacity_course_is_a_high_capacity_conflict() {
        let mut course = make_course("CS101", "MWF 9:00-9:50 AM", "Room 101");
        course.enrolled = 41;

        let reports = detect_conflicts(&course, &[]);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ConflictKind::Capacity);
        assert_eq!(reports[0].severity, Severity::High);
    }

    #[test]
    fn identical_schedule_in_another_room_rejects_the_registration() {
        let registered = make_course("CS101", "MWF 9:00-9:50 AM", "Room 101");
        let candidate = make_course("MA201", "MWF 9:00-9:50 AM", "Room 205");

        let reports = detect_conflicts(&candidate, std::slice::from_ref(&registered));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ConflictKind::Time);
        assert_eq!(reports[0].severity, Severity::High);
        assert_eq!(reports[0].course_ids(), vec![candidate.id, registered.id]);
        assert_eq!(reports[0].day_of_conflict, Some(Day::Monday));

        let decision = evaluate_registration(&candidate, std::slice::from_ref(&registered));
        assert!(!decision.is_accepted());
        assert_eq!(decision.conflicts().len(), 1);
    }

    #[test]
    fn back_to_back_courses_are_accepted() {
        let registered = make_course("CS101", "MWF 9:00-9:50 AM", "Room 101");
        let candidate = make_course("CS102", "MWF 9:50-10:40 AM", "Room 101");

        let decision = evaluate_registration(&candidate, &[registered]);
        assert!(decision.is_accepted());
    }

    #[test]
    fn unknown_registered_ids_are_skipped() {
        let candidate = make_course("CS101", "MWF 9:00-9:50 AM", "Room 101");
        let catalog = vec![candidate.clone()];
        let registered = vec![Uuid::new_v4(), candidate.id];

        let reports = classify(
            &candidate,
            &ClassifyContext {
                all_courses: &catalog,
                registered_ids: &registered,
            },
        );
        assert!(reports.is_empty());
    }

    #[test]
    fn bulk_scan_is_idempotent() {
        let mut near_full = make_course("BI110", "TTh 1:00-2:15 PM", "Lab 3");
        near_full.enrolled = 37;
        let courses = vec![
            make_course("CS101", "MWF 9:00-9:50 AM", "Room 101"),
            make_course("MA201", "MW 9:30-10:20 AM", "Room 101"),
            make_course("PH150", "TBA", "Room 101"),
            near_full,
        ];

        let summarize = |reports: Vec<ConflictReport>| -> Vec<(ConflictKind, Vec<Uuid>)> {
            reports.iter().map(|r| (r.kind, r.course_ids())).collect()
        };

        let first = detect_all_conflicts(&courses);
        let second = detect_all_conflicts(&courses);
        assert_eq!(first, second);

        let kinds = summarize(first);
        assert_eq!(
            kinds,
            vec![
                (ConflictKind::Time, vec![courses[0].id, courses[1].id]),
                (ConflictKind::Room, vec![courses[0].id, courses[1].id]),
                (ConflictKind::Capacity, vec![courses[3].id]),
            ]
        );
    }
}

mod projection {
    use super::*;

    #[test]
    fn totals_count_each_meeting_day() {
        let cs101 = make_course("CS101", "MWF 9:00-9:50 AM", "Room 101");
        let cs201 = make_course("CS201", "TTh 2:00-3:50 PM", "Room 202");
        let courses = vec![cs101.clone(), cs201.clone()];

        let week = project_week(&courses, &[cs101.id, cs201.id]);
        assert_eq!(week.total_credits, 6);
        // 3 x 50 minutes + 2 x 110 minutes
        assert!((week.weekly_contact_hours - 370.0 / 60.0).abs() < 1e-9);
        assert!(!week.has_conflicts());
    }

    #[test]
    fn overlapping_meetings_are_marked() {
        let cs101 = make_course("CS101", "MWF 9:00-9:50 AM", "Room 101");
        let ma201 = make_course("MA201", "MW 9:30-10:20 AM", "Room 205");
        let courses = vec![cs101.clone(), ma201.clone()];

        let week = project_week(&courses, &[cs101.id, ma201.id]);
        let expected: Vec<String> = vec![
            format!("{}-Monday", cs101.id),
            format!("{}-Wednesday", cs101.id),
            format!("{}-Monday", ma201.id),
            format!("{}-Wednesday", ma201.id),
        ];
        for id in &expected {
            assert!(week.conflicting_ids.contains(id), "missing {}", id);
        }
        assert_eq!(week.conflicting_ids.len(), expected.len());

        let friday: Vec<&GridCell> = week.cells_at(Day::Friday, 2).collect();
        assert_eq!(friday.len(), 1);
        assert!(!friday[0].conflicting);
    }

    #[test]
    fn weekend_meetings_are_not_placed_on_the_grid() {
        let seminar = make_course("HI300", "SU 10:00-11:50 AM", "Hall A");
        let week = project_week(std::slice::from_ref(&seminar), &[seminar.id]);

        assert!(week.cells.is_empty());
        assert_eq!(week.meetings.len(), 2);
        assert!((week.weekly_contact_hours - 220.0 / 60.0).abs() < 1e-9);
    }
}
