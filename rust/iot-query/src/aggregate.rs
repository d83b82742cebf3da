//! Joins catalogued sensors against telemetry readings.
//!
//! A reading contributes one value per sensor registered for its parent
//! device, provided the reading has a field named after that sensor and the
//! field coerces to a finite number. Anything else is dropped on its own
//! without affecting the other values.

use crate::{
    error::Result,
    models::{SensorRecord, TelemetryReading},
    store::{ReadingFilter, TelemetryStore},
    time::TimeRange,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Resolved inputs for one aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationQuery {
    pub device_uids: BTreeSet<String>,
    /// Sensor field names to read, per parent device uid.
    pub sensor_index: BTreeMap<String, BTreeSet<String>>,
    pub window: Option<TimeRange>,
}

impl AggregationQuery {
    /// Indexes `sensors` by device. Records without a device uid can never
    /// match a reading and are left out.
    pub fn from_sensors(sensors: &[SensorRecord], window: Option<TimeRange>) -> Self {
        let mut query = Self {
            window,
            ..Self::default()
        };
        for sensor in sensors {
            let Some(device_uid) = sensor.device_uid.as_ref() else {
                continue;
            };
            query.device_uids.insert(device_uid.clone());
            query
                .sensor_index
                .entry(device_uid.clone())
                .or_default()
                .insert(sensor.sensor_name.clone());
        }
        query
    }

    pub fn reading_filter(&self) -> ReadingFilter {
        ReadingFilter {
            parent_uids: self.device_uids.clone(),
            range: self.window,
        }
    }

    /// Values in `reading` for the sensors registered on its device.
    pub fn values_in<'a>(&'a self, reading: &'a TelemetryReading) -> impl Iterator<Item = f64> + 'a {
        self.sensor_index
            .get(&reading.parent_asset_uid)
            .into_iter()
            .flatten()
            .filter_map(move |sensor| reading.field(sensor))
            .filter_map(coerce_value)
    }
}

/// Numeric value of a telemetry field, if it has one.
///
/// Numbers and numeric strings count; non-finite results, `null`, booleans
/// and containers do not.
pub fn coerce_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        // Booleans are flags, not readings.
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Flat list of matched values, in store order. Empty means no data.
pub async fn aggregate(store: &dyn TelemetryStore, query: &AggregationQuery) -> Result<Vec<f64>> {
    if query.device_uids.is_empty() {
        return Ok(Vec::new());
    }

    let readings = store.readings(&query.reading_filter()).await?;
    let values: Vec<f64> = readings
        .iter()
        .flat_map(|reading| query.values_in(reading))
        .collect();

    debug!(
        readings = readings.len(),
        values = values.len(),
        "aggregated telemetry values"
    );
    Ok(values)
}

/// Matched values grouped by parent device. Every queried device is present,
/// with an empty list when nothing matched.
pub async fn aggregate_by_device(
    store: &dyn TelemetryStore,
    query: &AggregationQuery,
) -> Result<BTreeMap<String, Vec<f64>>> {
    let mut grouped: BTreeMap<String, Vec<f64>> = query
        .device_uids
        .iter()
        .map(|uid| (uid.clone(), Vec::new()))
        .collect();
    if grouped.is_empty() {
        return Ok(grouped);
    }

    for reading in store.readings(&query.reading_filter()).await? {
        let values: Vec<f64> = query.values_in(&reading).collect();
        if let Some(slot) = grouped.get_mut(&reading.parent_asset_uid) {
            slot.extend(values);
        }
    }
    Ok(grouped)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    // Running mean stays finite for finite inputs.
    let mean = values
        .iter()
        .enumerate()
        .fold(0.0, |mean, (i, value)| mean + (value - mean) / (i + 1) as f64);
    Some(mean)
}
