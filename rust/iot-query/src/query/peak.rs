use super::Outcome;
use crate::{
    aggregate::{aggregate_by_device, AggregationQuery},
    catalog::sensors_of_type,
    classify::SensorType,
    error::Result,
    models::SensorRecord,
    store::Stores,
};
use std::collections::BTreeMap;
use tracing::info;

const NO_SENSORS: &str = "No electricity sensors found.";
const NO_DATA: &str = "No electricity consumption data found.";

pub(super) async fn execute(stores: &Stores, catalog: &[SensorRecord]) -> Result<(Outcome, String)> {
    let sensors = sensors_of_type(catalog, SensorType::Electricity);
    if sensors.is_empty() {
        return Ok((Outcome::NoSensors, NO_SENSORS.to_string()));
    }

    // Later records for the same device overwrite earlier names.
    let names: BTreeMap<&str, &str> = sensors
        .iter()
        .filter_map(|sensor| {
            sensor
                .device_uid
                .as_deref()
                .map(|uid| (uid, sensor.device_name.as_str()))
        })
        .collect();

    let query = AggregationQuery::from_sensors(&sensors, None);
    let grouped = aggregate_by_device(stores.telemetry.as_ref(), &query).await?;
    let totals: BTreeMap<&str, f64> = grouped
        .iter()
        .map(|(uid, values)| (uid.as_str(), values.iter().sum()))
        .collect();
    info!(
        devices = totals.len(),
        values = grouped.values().map(Vec::len).sum::<usize>(),
        "summed electricity per device"
    );

    Ok(match peak(&totals) {
        Some((uid, total)) => {
            let name = names.get(uid).copied().unwrap_or_default();
            (
                Outcome::Success,
                format!("{name} consumed the most electricity: {total:.2} kWh"),
            )
        }
        None => (Outcome::NoData, NO_DATA.to_string()),
    })
}

/// Device with the strictly greatest total; ties go to the lowest uid.
/// `None` when every total is zero.
fn peak<'a>(totals: &BTreeMap<&'a str, f64>) -> Option<(&'a str, f64)> {
    if totals.values().all(|total| *total == 0.0) {
        return None;
    }

    let mut best: Option<(&'a str, f64)> = None;
    for (uid, total) in totals {
        match best {
            Some((_, current)) if *total <= current => {}
            _ => best = Some((*uid, *total)),
        }
    }
    best
}
