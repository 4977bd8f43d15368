use crate::aggregate::MinuteSample;
use crate::source::timestamp::format_date;
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("invalid window size {0}: must be a non-negative number of minutes")]
    InvalidWindowSize(i64),

    #[error("cannot compute a moving average without samples")]
    NoSamples,

    #[error("minute samples must have strictly increasing steps (step {previous} followed by {next})")]
    UnorderedSamples { previous: u64, next: u64 },

    #[error("date out of range after {0}")]
    DateOutOfRange(DateTime<Utc>),

    #[error("average at {date} is not a finite number; durations are too large to sum")]
    NonFiniteAverage { date: DateTime<Utc> },
}

/// Window width in minutes. The window at step `s` covers steps
/// `[s - period, s]`, i.e. `period + 1` minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize(u64);

impl WindowSize {
    pub fn new(minutes: i64) -> Result<Self, WindowError> {
        u64::try_from(minutes)
            .map(Self)
            .map_err(|_| WindowError::InvalidWindowSize(minutes))
    }

    pub fn minutes(&self) -> u64 {
        self.0
    }
}

/// An average as it is rendered: whole numbers without decimals, anything
/// else rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AverageValue {
    Whole(i64),
    Tenths(f64),
}

impl AverageValue {
    pub fn from_mean(mean: f64) -> Self {
        if mean.fract() == 0.0 && mean.abs() < i64::MAX as f64 {
            AverageValue::Whole(mean as i64)
        } else {
            // Decimal formatting rounds the exact binary value, ties to even
            let tenths = format!("{:.1}", mean).parse::<f64>().unwrap_or(mean);
            AverageValue::Tenths(tenths)
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            AverageValue::Whole(v) => v as f64,
            AverageValue::Tenths(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageRecord {
    #[serde(serialize_with = "serialize_date")]
    pub date: DateTime<Utc>,
    pub average_delivery_time: AverageValue,
}

impl AverageRecord {
    pub fn new(date: DateTime<Utc>, mean: f64) -> Self {
        Self {
            date,
            average_delivery_time: AverageValue::from_mean(mean),
        }
    }
}

fn serialize_date<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_date(date))
}

/// Neumaier-compensated running sum of the window durations.
#[derive(Debug, Default)]
struct WindowSum {
    sum: f64,
    compensation: f64,
}

impl WindowSum {
    fn add(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }

    fn remove(&mut self, value: f64) {
        self.add(-value);
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

fn next_minute(date: DateTime<Utc>) -> Result<DateTime<Utc>, WindowError> {
    date.checked_add_signed(Duration::minutes(1))
        .ok_or(WindowError::DateOutOfRange(date))
}

/// Walk every step from 0 to the last sample's step and emit the trailing
/// window average for each, preceded by a zero seed one minute before the
/// first sample.
///
/// Output length is always `last_step + 2`. Samples enter and leave the
/// window queue once each, in step order, and the window sum is updated on
/// each push and eviction, so the walk is linear in steps plus samples.
pub fn moving_average(
    samples: &[MinuteSample],
    window_size: WindowSize,
) -> Result<Vec<AverageRecord>, WindowError> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Err(WindowError::NoSamples);
    };
    if let Some(pair) = samples.windows(2).find(|pair| pair[1].step <= pair[0].step) {
        return Err(WindowError::UnorderedSamples {
            previous: pair[0].step,
            next: pair[1].step,
        });
    }

    let period = window_size.minutes();
    let mut date = first
        .minute
        .checked_sub_signed(Duration::minutes(1))
        .ok_or(WindowError::DateOutOfRange(first.minute))?;

    let mut records = Vec::with_capacity(usize::try_from(last.step).unwrap_or(0) + 2);
    records.push(AverageRecord::new(date, 0.0));

    let mut window: VecDeque<f64> = VecDeque::new();
    let mut window_sum = WindowSum::default();
    // samples[oldest_idx..next_idx] are the ones currently in `window`
    let mut oldest_idx = 0;
    let mut next_idx = 0;
    let mut lower = 0u64;

    for upper in 0..=last.step {
        if upper > period {
            lower += 1;
            while oldest_idx < next_idx && samples[oldest_idx].step < lower {
                if let Some(evicted) = window.pop_front() {
                    window_sum.remove(evicted);
                }
                oldest_idx += 1;
            }
            if window.is_empty() {
                window_sum = WindowSum::default();
            }
        }

        if let Some(sample) = samples.get(next_idx).filter(|s| s.step == upper) {
            window.push_back(sample.duration);
            window_sum.add(sample.duration);
            next_idx += 1;
        }

        let average = if window.is_empty() {
            0.0
        } else {
            window_sum.value() / window.len() as f64
        };

        date = next_minute(date)?;
        if !average.is_finite() {
            return Err(WindowError::NonFiniteAverage { date });
        }
        records.push(AverageRecord::new(date, average));
    }

    Ok(records)
}
