//! Sensor discovery over the asset hierarchy.
//!
//! Sensors are found at exactly two levels below a device:
//! `DEVICE -> BOARD -> SENSOR`. Anything nested differently is ignored.

use crate::{
    classify::{classify, SensorType},
    models::{AssetKind, AssetNode, SensorRecord},
};

/// Flattens the hierarchy into one record per device/board/sensor triple,
/// in document order. Duplicate devices yield duplicate records.
pub fn build_catalog(roots: &[AssetNode]) -> Vec<SensorRecord> {
    roots
        .iter()
        .filter(|root| root.kind == AssetKind::Device)
        .flat_map(device_sensors)
        .collect()
}

fn device_sensors(device: &AssetNode) -> impl Iterator<Item = SensorRecord> + '_ {
    let device_name = device.name.clone().unwrap_or_default();
    let device_type = device.raw_kind.clone().unwrap_or_default();

    device
        .children
        .iter()
        .filter(|board| board.kind == AssetKind::Board)
        .flat_map(|board| board.children.iter())
        .filter(|sensor| sensor.kind == AssetKind::Sensor)
        .map(move |sensor| SensorRecord {
            sensor_uid: sensor.asset_uid.clone().unwrap_or_default(),
            sensor_name: sensor.name.clone().unwrap_or_default(),
            device_name: device_name.clone(),
            device_type: device_type.clone(),
            device_uid: device.asset_uid.clone(),
        })
}

/// Keeps records whose device name contains `device_keyword` (ignoring case)
/// and, when given, whose sensor classifies as `sensor_type`.
pub fn filter_sensors(
    catalog: &[SensorRecord],
    device_keyword: &str,
    sensor_type: Option<SensorType>,
) -> Vec<SensorRecord> {
    let keyword = device_keyword.to_lowercase();
    catalog
        .iter()
        .filter(|record| record.device_name.to_lowercase().contains(&keyword))
        .filter(|record| match sensor_type {
            Some(kind) => classify(&record.sensor_name) == Some(kind),
            None => true,
        })
        .cloned()
        .collect()
}

/// All records whose sensor classifies as `sensor_type`, regardless of device.
pub fn sensors_of_type(catalog: &[SensorRecord], sensor_type: SensorType) -> Vec<SensorRecord> {
    catalog
        .iter()
        .filter(|record| classify(&record.sensor_name) == Some(sensor_type))
        .cloned()
        .collect()
}
