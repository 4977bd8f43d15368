use crate::events::NormalizedSample;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("no valid events found in input")]
    NoValidEvents,
}

/// Mean duration of every sample rounded to `minute`.
///
/// `step` counts whole minutes since the first sample's minute, so the first
/// sample is always step 0 and steps strictly increase.
#[derive(Debug, Clone, PartialEq)]
pub struct MinuteSample {
    pub minute: DateTime<Utc>,
    pub step: u64,
    pub duration: f64,
}

#[derive(Default)]
struct MinuteAccumulator {
    sum: f64,
    count: u32,
}

impl MinuteAccumulator {
    fn push(&mut self, duration: f64) {
        self.sum += duration;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / f64::from(self.count)
    }
}

/// Collapse samples sharing a minute into one, ordered by minute.
///
/// Grouping is by key over the whole input, so same-minute samples merge even
/// when they are not adjacent, and unsorted input comes out sorted.
pub fn aggregate_minutes(samples: &[NormalizedSample]) -> Result<Vec<MinuteSample>, AggregateError> {
    let mut by_minute: BTreeMap<DateTime<Utc>, MinuteAccumulator> = BTreeMap::new();
    for sample in samples {
        by_minute
            .entry(sample.timestamp)
            .or_default()
            .push(sample.duration);
    }

    let Some(first) = by_minute.keys().next().copied() else {
        return Err(AggregateError::NoValidEvents);
    };

    Ok(by_minute
        .into_iter()
        .map(|(minute, acc)| MinuteSample {
            minute,
            step: (minute - first).num_minutes().unsigned_abs(),
            duration: acc.mean(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::timestamp::parse_timestamp;

    fn sample(ts: &str, duration: f64) -> NormalizedSample {
        NormalizedSample {
            timestamp: parse_timestamp(ts).unwrap(),
            duration,
        }
    }

    #[test]
    fn test_empty_input_is_no_valid_events() {
        let result = aggregate_minutes(&[]);

        assert!(matches!(result, Err(AggregateError::NoValidEvents)));
    }

    #[test]
    fn test_single_sample_is_step_zero() {
        let minutes = aggregate_minutes(&[sample("2018-12-26 18:12:00", 5.0)]).unwrap();

        assert_eq!(minutes.len(), 1);
        assert_eq!(minutes[0].step, 0);
        assert_eq!(minutes[0].duration, 5.0);
    }

    #[test]
    fn test_same_minute_durations_are_averaged() {
        let minutes = aggregate_minutes(&[
            sample("2018-12-26 18:12:00", 4.0),
            sample("2018-12-26 18:12:00", 6.0),
        ])
        .unwrap();

        assert_eq!(minutes.len(), 1);
        assert_eq!(minutes[0].duration, 5.0);
    }

    #[test]
    fn test_non_adjacent_same_minute_merge() {
        let minutes = aggregate_minutes(&[
            sample("2018-12-26 18:12:00", 4.0),
            sample("2018-12-26 18:13:00", 100.0),
            sample("2018-12-26 18:12:00", 8.0),
        ])
        .unwrap();

        assert_eq!(minutes.len(), 2);
        assert_eq!(minutes[0].duration, 6.0);
        assert_eq!(minutes[1].duration, 100.0);
    }

    #[test]
    fn test_steps_count_elapsed_minutes_with_gaps() {
        let minutes = aggregate_minutes(&[
            sample("2018-12-26 18:12:00", 20.0),
            sample("2018-12-26 18:16:00", 31.0),
            sample("2018-12-26 18:24:00", 54.0),
        ])
        .unwrap();

        let steps: Vec<u64> = minutes.iter().map(|m| m.step).collect();
        assert_eq!(steps, vec![0, 4, 12]);
    }

    #[test]
    fn test_unsorted_input_is_ordered_by_minute() {
        let minutes = aggregate_minutes(&[
            sample("2018-12-26 18:24:00", 54.0),
            sample("2018-12-26 18:12:00", 20.0),
        ])
        .unwrap();

        assert_eq!(minutes[0].minute, parse_timestamp("2018-12-26 18:12:00").unwrap());
        assert_eq!(minutes[0].step, 0);
        assert_eq!(minutes[1].step, 12);
    }

    #[test]
    fn test_steps_span_day_boundary() {
        let minutes = aggregate_minutes(&[
            sample("2018-12-31 23:59:00", 1.0),
            sample("2019-01-01 00:02:00", 2.0),
        ])
        .unwrap();

        assert_eq!(minutes[1].step, 3);
    }
}
