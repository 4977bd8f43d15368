use crate::source::reader::RawRecord;
use crate::source::timestamp::{ceil_to_minute, parse_timestamp};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// `event_name` value marking a translation delivery.
pub const DELIVERY_EVENT_NAME: &str = "translation_delivered";

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryEvent {
    pub timestamp: DateTime<Utc>,
    pub duration: f64,
}

/// A delivery event whose timestamp has been rounded up to the minute.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSample {
    pub timestamp: DateTime<Utc>,
    pub duration: f64,
}

impl DeliveryEvent {
    /// Returns `None` unless the record is a delivery with a parseable
    /// `timestamp` and a finite numeric `duration`.
    pub fn from_record(record: &RawRecord) -> Option<Self> {
        if record.get("event_name").and_then(Value::as_str) != Some(DELIVERY_EVENT_NAME) {
            return None;
        }

        let timestamp = record
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|ts| parse_timestamp(ts).ok())?;
        let duration = record.get("duration").and_then(parse_duration)?;

        Some(Self {
            timestamp,
            duration,
        })
    }

    pub fn normalize(&self) -> Option<NormalizedSample> {
        let timestamp = ceil_to_minute(self.timestamp).ok()?;
        Some(NormalizedSample {
            timestamp,
            duration: self.duration,
        })
    }
}

// Numbers and numeric strings are both accepted. No sign constraint.
fn parse_duration(value: &Value) -> Option<f64> {
    let duration = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    duration.is_finite().then_some(duration)
}

/// Keep the valid delivery events, in input order, with ceiled timestamps.
pub fn normalize(records: &[RawRecord]) -> Vec<NormalizedSample> {
    records
        .iter()
        .filter_map(DeliveryEvent::from_record)
        .filter_map(|event| event.normalize())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn delivery(timestamp: &str, duration: Value) -> RawRecord {
        record(json!({
            "timestamp": timestamp,
            "translation_id": "5aa5b2f39f7254a75aa5",
            "source_language": "en",
            "target_language": "fr",
            "client_name": "easyjet",
            "event_name": "translation_delivered",
            "nr_words": 30,
            "duration": duration,
        }))
    }

    #[test]
    fn test_valid_delivery_is_ceiled() {
        let samples = normalize(&[delivery("2018-12-26 18:11:08.509654", json!(20))]);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp, parse_timestamp("2018-12-26 18:12:00").unwrap());
        assert_eq!(samples[0].duration, 20.0);
    }

    #[test]
    fn test_aligned_timestamp_is_unchanged() {
        let samples = normalize(&[delivery("2018-12-26 18:15:00", json!(31))]);

        assert_eq!(samples[0].timestamp, parse_timestamp("2018-12-26 18:15:00").unwrap());
    }

    #[test]
    fn test_other_event_names_are_dropped() {
        let mut started = delivery("2018-12-26 18:11:08", json!(20));
        started.insert("event_name".to_string(), json!("translation_requested"));
        let mut missing = delivery("2018-12-26 18:11:08", json!(20));
        missing.remove("event_name");

        assert!(normalize(&[started, missing]).is_empty());
    }

    #[test]
    fn test_missing_fields_are_dropped() {
        let mut no_duration = delivery("2018-12-26 18:11:08", json!(20));
        no_duration.remove("duration");
        let mut no_timestamp = delivery("2018-12-26 18:11:08", json!(20));
        no_timestamp.remove("timestamp");

        assert!(normalize(&[no_duration, no_timestamp]).is_empty());
    }

    #[test]
    fn test_unparseable_fields_are_dropped() {
        let records = vec![
            delivery("not a time", json!(20)),
            delivery("2018-12-26 18:11:08", json!("twenty")),
            delivery("2018-12-26 18:11:08", json!(null)),
            delivery("2018-12-26 18:11:08", json!([20])),
        ];

        assert!(normalize(&records).is_empty());
    }

    #[test]
    fn test_numeric_string_and_negative_durations_accepted() {
        let samples = normalize(&[
            delivery("2018-12-26 18:11:08", json!("12.5")),
            delivery("2018-12-26 18:11:09", json!(-3)),
        ]);

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].duration, 12.5);
        assert_eq!(samples[1].duration, -3.0);
    }

    #[test]
    fn test_input_order_preserved() {
        let samples = normalize(&[
            delivery("2018-12-26 18:23:19", json!(54)),
            delivery("2018-12-26 18:11:08", json!(20)),
        ]);

        assert_eq!(samples[0].duration, 54.0);
        assert_eq!(samples[1].duration, 20.0);
    }
}
