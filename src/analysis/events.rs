//! Stress-event study.
//!
//! Events are local peaks of the stress index above `mean + sigma·std`. For
//! each event we measure how a defensive ratio moved in the window before and
//! after the peak, and test whether pre-event changes differ from zero.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::TimeSeries;
use crate::math::{TTest, mean, one_sample_t_test, sample_std};

pub const DEFAULT_EVENT_SIGMA: f64 = 2.0;
pub const DEFAULT_EVENT_HALF_WINDOW: usize = 20;
/// About six months of trading days.
pub const DEFAULT_EVENT_WINDOW: usize = 126;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StressEvent {
    pub date: NaiveDate,
    pub value: f64,
}

/// Peaks above `mean + sigma·std` that are the maximum of their neighbourhood.
///
/// Index `i` is a candidate when `half_window <= i < n - half_window`; its
/// neighbourhood is `[i - half_window, i + half_window)`.
pub fn detect_stress_events(stress: &TimeSeries, sigma: f64, half_window: usize) -> Vec<StressEvent> {
    let values = stress.values();
    let n = values.len();
    let (Some(m), Some(sd)) = (mean(&values), sample_std(&values)) else {
        return Vec::new();
    };
    let threshold = m + sigma * sd;
    if n < 2 * half_window + 1 {
        return Vec::new();
    }

    let points = stress.points();
    (half_window..n - half_window)
        .filter(|&i| {
            let v = values[i];
            if v <= threshold {
                return false;
            }
            let peak = values[i - half_window..i + half_window]
                .iter()
                .fold(f64::NEG_INFINITY, |acc, x| acc.max(*x));
            v == peak
        })
        .map(|i| StressEvent {
            date: points[i].0,
            value: points[i].1,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventWindow {
    pub event_date: NaiveDate,
    /// Ratio date matched to the event (nearest observation).
    pub matched_date: NaiveDate,
    pub pre_change: f64,
    pub post_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventStudy {
    pub pre_window: usize,
    pub post_window: usize,
    pub events_total: usize,
    pub windows: Vec<EventWindow>,
    pub mean_pre: Option<f64>,
    pub mean_post: Option<f64>,
    /// One-sample t-test of pre-event changes against zero.
    pub pre_test: Option<TTest>,
}

/// Measure `ratio` changes around each event.
///
/// Events whose matched observation lacks a full pre or post window are skipped.
pub fn event_study(events: &[StressEvent], ratio: &TimeSeries, pre: usize, post: usize) -> EventStudy {
    let points = ratio.points();
    let mut windows = Vec::new();

    for event in events {
        let Some(idx) = nearest_index(points, event.date) else { continue };
        if idx < pre || idx + post >= points.len() || pre == 0 || post == 0 {
            continue;
        }
        windows.push(EventWindow {
            event_date: event.date,
            matched_date: points[idx].0,
            pre_change: points[idx - 1].1 - points[idx - pre].1,
            post_change: points[idx + post].1 - points[idx + 1].1,
        });
    }

    let pre_changes: Vec<f64> = windows.iter().map(|w| w.pre_change).collect();
    let post_changes: Vec<f64> = windows.iter().map(|w| w.post_change).collect();

    EventStudy {
        pre_window: pre,
        post_window: post,
        events_total: events.len(),
        mean_pre: mean(&pre_changes),
        mean_post: mean(&post_changes),
        pre_test: one_sample_t_test(&pre_changes, 0.0),
        windows,
    }
}

/// Index of the observation closest in time to `date` (earlier wins ties).
fn nearest_index(points: &[(NaiveDate, f64)], date: NaiveDate) -> Option<usize> {
    if points.is_empty() {
        return None;
    }
    let pos = points.partition_point(|(d, _)| *d < date);
    if pos == 0 {
        return Some(0);
    }
    if pos == points.len() {
        return Some(points.len() - 1);
    }
    let before = (date - points[pos - 1].0).num_days();
    let after = (points[pos].0 - date).num_days();
    Some(if after < before { pos } else { pos - 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2010, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn series(name: &str, values: &[f64]) -> TimeSeries {
        TimeSeries::new(name, values.iter().enumerate().map(|(i, v)| (date(i), *v)).collect()).unwrap()
    }

    #[test]
    fn detects_planted_spike() {
        let mut values: Vec<f64> = (0..200).map(|i| ((i % 7) as f64) * 0.1).collect();
        values[120] = 10.0;
        let events = detect_stress_events(&series("stress", &values), 2.0, 20);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date, date(120));
        assert_eq!(events[0].value, 10.0);
    }

    #[test]
    fn spikes_near_edges_are_ignored() {
        let mut values = vec![0.0; 100];
        values[5] = 10.0;
        values[97] = 10.0;
        assert!(detect_stress_events(&series("stress", &values), 2.0, 20).is_empty());
    }

    #[test]
    fn event_study_measures_windows() {
        // Ratio rises by 1 per day.
        let ratio = series("ratio", &(0..300).map(|i| i as f64).collect::<Vec<_>>());
        let events = vec![
            StressEvent { date: date(150), value: 5.0 },
            // Not enough history for a 126-day pre window.
            StressEvent { date: date(50), value: 5.0 },
        ];
        let study = event_study(&events, &ratio, 126, 126);
        assert_eq!(study.events_total, 2);
        assert_eq!(study.windows.len(), 1);
        let w = study.windows[0];
        assert_eq!(w.matched_date, date(150));
        assert_eq!(w.pre_change, 125.0);
        assert_eq!(w.post_change, 125.0);
        assert_eq!(study.mean_pre, Some(125.0));
        // A single event cannot be t-tested.
        assert!(study.pre_test.is_none());
    }

    #[test]
    fn nearest_index_prefers_earlier_on_ties() {
        let pts = vec![(date(0), 0.0), (date(2), 0.0), (date(10), 0.0)];
        assert_eq!(nearest_index(&pts, date(1)), Some(0));
        assert_eq!(nearest_index(&pts, date(7)), Some(2));
        assert_eq!(nearest_index(&pts, date(50)), Some(2));
    }
}
