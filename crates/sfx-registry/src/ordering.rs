//! The two orderings of recent presentations.
//!
//! [`PathOrder`] is the natural order used for every returned collection.
//! [`RecencyRank`] is only used to choose which presentations survive a
//! purge. Keeping them apart means a path-sorted result never implies
//! anything about recency.

use std::cmp::Ordering;

use crate::presentation::RecentPresentation;

/// Lexicographic order on the normalized path.
pub struct PathOrder;

impl PathOrder {
    pub fn compare(a: &RecentPresentation, b: &RecentPresentation) -> Ordering {
        a.normalized_path().cmp(b.normalized_path())
    }

    /// Compare against a possibly absent presentation, which always sorts first.
    pub fn compare_to(a: &RecentPresentation, b: Option<&RecentPresentation>) -> Ordering {
        b.map_or(Ordering::Greater, |b| Self::compare(a, b))
    }
}

/// Most recently opened first; presentations without a date come last.
pub struct RecencyRank;

impl RecencyRank {
    pub fn compare(a: &RecentPresentation, b: &RecentPresentation) -> Ordering {
        match (a.opened_date_time(), b.opened_date_time()) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Stable sort by rank; equally ranked presentations keep their order.
    pub fn sort(presentations: &mut [RecentPresentation]) {
        presentations.sort_by(Self::compare);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn presentation(path: &str, opened: Option<NaiveDateTime>) -> RecentPresentation {
        RecentPresentation::new(path, opened).unwrap()
    }

    #[test]
    fn test_path_order() {
        let a = presentation("a.sfx", Some(day(9)));
        let b = presentation("b.sfx", Some(day(1)));

        assert_eq!(PathOrder::compare(&a, &b), Ordering::Less);
        assert_eq!(PathOrder::compare(&b, &a), Ordering::Greater);
        assert_eq!(PathOrder::compare(&a, &a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_path_order_against_absent() {
        let a = presentation("a.sfx", None);
        assert_eq!(PathOrder::compare_to(&a, None), Ordering::Greater);
        assert_eq!(PathOrder::compare_to(&a, Some(&a)), Ordering::Equal);
    }

    #[test]
    fn test_recency_rank_ignores_path() {
        let old = presentation("a.sfx", Some(day(1)));
        let new = presentation("b.sfx", Some(day(3)));
        let undated = presentation("0.sfx", None);

        let mut ranked = vec![undated.clone(), old.clone(), new.clone()];
        RecencyRank::sort(&mut ranked);

        let paths: Vec<&str> = ranked.iter().map(RecentPresentation::normalized_path).collect();
        assert_eq!(
            paths,
            vec![new.normalized_path(), old.normalized_path(), undated.normalized_path()]
        );
    }

    #[test]
    fn test_recency_rank_ties_keep_order() {
        let first = presentation("z.sfx", Some(day(2)));
        let second = presentation("a.sfx", Some(day(2)));

        let mut ranked = vec![first.clone(), second.clone()];
        RecencyRank::sort(&mut ranked);

        assert_eq!(ranked[0].normalized_path(), first.normalized_path());
        assert_eq!(ranked[1].normalized_path(), second.normalized_path());
    }
}
