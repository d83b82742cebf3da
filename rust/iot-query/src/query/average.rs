use super::Outcome;
use crate::{
    aggregate::{aggregate, mean, AggregationQuery},
    catalog::filter_sensors,
    classify::SensorType,
    error::Result,
    models::SensorRecord,
    store::Stores,
    time::TimeFilterSpec,
};
use chrono::{DateTime, Utc};
use tracing::info;

/// A mean over one sensor type on devices selected by name.
pub(super) struct AverageRecipe {
    pub device_keyword: &'static str,
    pub sensor_type: SensorType,
    pub window: TimeFilterSpec,
    pub no_sensors: &'static str,
    pub no_data: &'static str,
    pub render: fn(f64) -> String,
}

pub(super) const FRIDGE_MOISTURE: AverageRecipe = AverageRecipe {
    device_keyword: "fridge",
    sensor_type: SensorType::Moisture,
    window: TimeFilterSpec::RelativeHours(3),
    no_sensors: "No moisture sensors found for Fridges.",
    no_data: "No moisture data found for Fridges in the last 3 hours.",
    render: render_moisture,
};

pub(super) const DISHWASHER_WATER_FLOW: AverageRecipe = AverageRecipe {
    device_keyword: "smart dishwasher",
    sensor_type: SensorType::WaterFlow,
    window: TimeFilterSpec::AllHistory,
    no_sensors: "No water flow sensors found for Smart Dishwashers.",
    no_data: "No water flow data found for Smart Dishwashers.",
    render: render_water_flow,
};

fn render_moisture(mean: f64) -> String {
    format!("Average moisture across all fridges (last 3 hrs): {mean:.2}%")
}

fn render_water_flow(mean: f64) -> String {
    format!("Average water consumption per cycle: {mean:.2} liters")
}

pub(super) async fn execute(
    recipe: &AverageRecipe,
    stores: &Stores,
    catalog: &[SensorRecord],
    now: DateTime<Utc>,
) -> Result<(Outcome, String)> {
    let sensors = filter_sensors(catalog, recipe.device_keyword, Some(recipe.sensor_type));
    if sensors.is_empty() {
        return Ok((Outcome::NoSensors, recipe.no_sensors.to_string()));
    }

    let query = AggregationQuery::from_sensors(&sensors, recipe.window.resolve(now));
    let values = aggregate(stores.telemetry.as_ref(), &query).await?;
    info!(
        sensor_type = %recipe.sensor_type,
        devices = query.device_uids.len(),
        values = values.len(),
        "averaged sensor readings"
    );

    Ok(match mean(&values) {
        Some(avg) => (Outcome::Success, (recipe.render)(avg)),
        None => (Outcome::NoData, recipe.no_data.to_string()),
    })
}
