//! Keyword classification of sensors by display name.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    Moisture,
    WaterFlow,
    Electricity,
}

/// Checked in order; the first keyword contained in the name wins.
const KEYWORDS: &[(&str, SensorType)] = &[
    ("moisture", SensorType::Moisture),
    ("water flow", SensorType::WaterFlow),
    ("ammeter", SensorType::Electricity),
];

impl SensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Moisture => "moisture",
            SensorType::WaterFlow => "water_flow",
            SensorType::Electricity => "electricity",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `None` for sensors that match no keyword.
pub fn classify(sensor_name: &str) -> Option<SensorType> {
    let name = sensor_name.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_keywords() {
        assert_eq!(classify("Moisture Sensor"), Some(SensorType::Moisture));
        assert_eq!(classify("Water Flow Meter"), Some(SensorType::WaterFlow));
        assert_eq!(classify("AMMETER #2"), Some(SensorType::Electricity));
    }

    #[test]
    fn unknown_names_are_unclassified() {
        assert_eq!(classify("Thermistor"), None);
        assert_eq!(classify(""), None);
        // "waterflow" lacks the space the keyword requires.
        assert_eq!(classify("Waterflow"), None);
    }

    #[test]
    fn earlier_keywords_take_priority() {
        assert_eq!(
            classify("Ammeter with moisture gauge"),
            Some(SensorType::Moisture)
        );
        assert_eq!(
            classify("water flow ammeter"),
            Some(SensorType::WaterFlow)
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let name = "Kitchen Moisture Sensor";
        assert_eq!(classify(name), classify(name));
    }
}
