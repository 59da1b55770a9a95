use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::data::record::SensorRecord;
use crate::error::{ForecastError, Result};

/// Mean sensor values of one clock hour
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyAggregate {
    /// Start of the hour (UTC)
    pub hour: NaiveDateTime,
    pub temperature: f64,
    pub humidity: f64,
    pub light: f64,
    /// Number of records that contributed to the means
    pub samples: usize,
}

#[derive(Default)]
struct Accumulator {
    temperature: f64,
    humidity: f64,
    light: f64,
    count: usize,
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parse a record timestamp into UTC
///
/// Accepts RFC 3339 and space-separated variants with an offset (converted
/// to UTC), offset-free date-times (taken as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.naive_utc());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Truncate a timestamp to the start of its hour
pub fn floor_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    let into_hour = Duration::seconds(i64::from(ts.minute() * 60 + ts.second()))
        + Duration::nanoseconds(i64::from(ts.nanosecond()));
    ts - into_hour
}

/// Group records by hour and average temperature, humidity and light
///
/// The result is sorted by hour with one entry per distinct hour. A record
/// whose timestamp cannot be parsed aborts the whole aggregation.
pub fn aggregate_hourly(records: &[SensorRecord]) -> Result<Vec<HourlyAggregate>> {
    let mut groups: BTreeMap<NaiveDateTime, Accumulator> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        let ts = parse_timestamp(&record.timestamp).ok_or_else(|| ForecastError::InvalidTimestamp {
            record: index,
            value: record.timestamp.clone(),
        })?;

        let acc = groups.entry(floor_to_hour(ts)).or_default();
        acc.temperature += record.temperature;
        acc.humidity += record.humidity;
        acc.light += record.light;
        acc.count += 1;
    }

    let series: Vec<HourlyAggregate> = groups
        .into_iter()
        .map(|(hour, acc)| {
            let n = acc.count as f64;
            HourlyAggregate {
                hour,
                temperature: acc.temperature / n,
                humidity: acc.humidity / n,
                light: acc.light / n,
                samples: acc.count,
            }
        })
        .collect();

    tracing::info!(records = records.len(), hours = series.len(), "aggregated records by hour");
    Ok(series)
}
