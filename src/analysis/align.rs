//! Series alignment and stationarity transform.
//!
//! Lead-lag and Granger tests are run on *changes*, not levels: each series is
//! first-differenced on its own observation grid, then both are restricted to
//! the dates they share.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::domain::TimeSeries;
use crate::math::MIN_PAIRED_OBS;

/// Two series restricted to their common dates, in ascending date order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPair {
    pub first_name: String,
    pub second_name: String,
    pub dates: Vec<NaiveDate>,
    pub first: Vec<f64>,
    pub second: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The same pair with the roles of the two series exchanged.
    pub fn swapped(&self) -> AlignedPair {
        AlignedPair {
            first_name: self.second_name.clone(),
            second_name: self.first_name.clone(),
            dates: self.dates.clone(),
            first: self.second.clone(),
            second: self.first.clone(),
        }
    }
}

/// Restrict two series to the intersection of their dates.
pub fn align(a: &TimeSeries, b: &TimeSeries) -> AlignedPair {
    let pa = a.points();
    let pb = b.points();

    let mut dates = Vec::new();
    let mut first = Vec::new();
    let mut second = Vec::new();

    // Both inputs are strictly increasing: a merge walk finds the intersection.
    let (mut i, mut j) = (0usize, 0usize);
    while i < pa.len() && j < pb.len() {
        match pa[i].0.cmp(&pb[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dates.push(pa[i].0);
                first.push(pa[i].1);
                second.push(pb[j].1);
                i += 1;
                j += 1;
            }
        }
    }

    AlignedPair {
        first_name: a.name().to_string(),
        second_name: b.name().to_string(),
        dates,
        first,
        second,
    }
}

/// First-difference both series and align them on shared dates.
///
/// Returns `None` when fewer than two shared points remain.
pub fn align_and_difference(a: &TimeSeries, b: &TimeSeries) -> Option<AlignedPair> {
    let aligned = align(&a.difference(), &b.difference());
    if aligned.len() < MIN_PAIRED_OBS {
        debug!(
            "align: `{}` vs `{}` share {} differenced points; no result",
            a.name(),
            b.name(),
            aligned.len()
        );
        return None;
    }
    Some(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn series(name: &str, pts: &[(u32, f64)]) -> TimeSeries {
        TimeSeries::new(name, pts.iter().map(|&(day, v)| (d(day), v)).collect()).unwrap()
    }

    #[test]
    fn align_keeps_only_shared_dates() {
        let a = series("a", &[(1, 1.0), (2, 2.0), (4, 4.0), (5, 5.0)]);
        let b = series("b", &[(2, 20.0), (3, 30.0), (5, 50.0)]);
        let pair = align(&a, &b);
        assert_eq!(pair.dates, vec![d(2), d(5)]);
        assert_eq!(pair.first, vec![2.0, 5.0]);
        assert_eq!(pair.second, vec![20.0, 50.0]);
    }

    #[test]
    fn differences_then_intersects() {
        let a = series("a", &[(1, 1.0), (2, 3.0), (3, 6.0), (4, 10.0)]);
        let b = series("b", &[(2, 5.0), (3, 4.0), (4, 8.0)]);
        let pair = align_and_difference(&a, &b).unwrap();
        // diff(a) on days 2..=4, diff(b) on days 3..=4
        assert_eq!(pair.dates, vec![d(3), d(4)]);
        assert_eq!(pair.first, vec![3.0, 4.0]);
        assert_eq!(pair.second, vec![-1.0, 4.0]);
    }

    #[test]
    fn too_little_overlap_is_no_result() {
        let a = series("a", &[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let b = series("b", &[(3, 1.0), (4, 2.0), (5, 3.0)]);
        assert!(align_and_difference(&a, &b).is_none());
    }

    #[test]
    fn swapped_exchanges_roles() {
        let a = series("a", &[(1, 1.0), (2, 2.0)]);
        let b = series("b", &[(1, 9.0), (2, 8.0)]);
        let pair = align(&a, &b).swapped();
        assert_eq!(pair.first_name, "b");
        assert_eq!(pair.first, vec![9.0, 8.0]);
    }
}
