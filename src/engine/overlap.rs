//! Interval overlap detection.

use serde::{Deserialize, Serialize};

use super::schedule::{Day, MeetingInterval};

impl MeetingInterval {
    /// Whether two meetings collide.
    ///
    /// Same day, and `a.start < b.end && a.end > b.start`. Intervals that only
    /// touch at an endpoint do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &MeetingInterval) -> bool {
        self.day == other.day
            && self.start_minute < other.end_minute
            && self.end_minute > other.start_minute
    }
}

/// Free-function form of [`MeetingInterval::overlaps`].
#[inline]
pub fn overlaps(a: &MeetingInterval, b: &MeetingInterval) -> bool {
    a.overlaps(b)
}

/// One colliding pair found by [`any_overlap`]. `first` comes from the left
/// set, `second` from the right.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverlapPair {
    pub first: MeetingInterval,
    pub second: MeetingInterval,
}

impl OverlapPair {
    pub fn day(&self) -> Day {
        self.first.day
    }
}

/// Cross-product check of two interval sets, in left-then-right order.
pub fn any_overlap(left: &[MeetingInterval], right: &[MeetingInterval]) -> Vec<OverlapPair> {
    left.iter()
        .flat_map(|a| {
            right
                .iter()
                .filter(move |b| a.overlaps(b))
                .map(move |b| OverlapPair {
                    first: *a,
                    second: *b,
                })
        })
        .collect()
}

/// First overlapping pair, if any.
pub fn first_overlap(left: &[MeetingInterval], right: &[MeetingInterval]) -> Option<OverlapPair> {
    left.iter().find_map(|a| {
        right.iter().find(|b| a.overlaps(b)).map(|b| OverlapPair {
            first: *a,
            second: *b,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::schedule::parse_schedule;

    fn interval(day: Day, start: u16, end: u16) -> MeetingInterval {
        MeetingInterval::new(day, start, end).unwrap()
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let a = interval(Day::Monday, 540, 590);
        let b = interval(Day::Monday, 590, 640);
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&b, &a));
    }

    #[test]
    fn strict_overlap_is_detected() {
        let a = interval(Day::Monday, 540, 600);
        let b = interval(Day::Monday, 590, 650);
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
    }

    #[test]
    fn containment_overlaps() {
        let outer = interval(Day::Friday, 480, 720);
        let inner = interval(Day::Friday, 600, 610);
        assert!(overlaps(&outer, &inner));
    }

    #[test]
    fn different_days_never_overlap() {
        let a = interval(Day::Monday, 540, 600);
        let b = interval(Day::Tuesday, 540, 600);
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn any_overlap_reports_every_colliding_day() {
        let mwf = parse_schedule("MWF 9:00-9:50 AM");
        let mw = parse_schedule("MW 9:30-10:20 AM");
        let pairs = any_overlap(&mwf, &mw);
        let days: Vec<Day> = pairs.iter().map(OverlapPair::day).collect();
        assert_eq!(days, vec![Day::Monday, Day::Wednesday]);
    }

    #[test]
    fn empty_set_never_overlaps() {
        let mwf = parse_schedule("MWF 9:00-9:50 AM");
        assert!(any_overlap(&mwf, &[]).is_empty());
        assert!(any_overlap(&[], &mwf).is_empty());
        assert!(first_overlap(&mwf, &parse_schedule("TBA")).is_none());
    }

    #[test]
    fn first_overlap_picks_earliest_day() {
        let a = parse_schedule("MWF 9:00-9:50 AM");
        let b = parse_schedule("WF 9:00-9:50 AM");
        assert_eq!(first_overlap(&a, &b).map(|p| p.day()), Some(Day::Wednesday));
    }
}
