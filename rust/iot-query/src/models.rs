//! Asset hierarchy and telemetry data models.
//!
//! Hierarchy documents arrive as loosely structured JSON. Conversion into
//! [`AssetNode`] is total: anything absent or of the wrong shape becomes
//! `None`/[`AssetKind::Missing`] here, so traversal code never has to
//! second-guess the document.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Classification carried in a node's `customAttributes.type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    Device,
    Board,
    Sensor,
    Other(String),
    Missing,
}

impl AssetKind {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => AssetKind::Missing,
            Some(value) if value.eq_ignore_ascii_case("DEVICE") => AssetKind::Device,
            Some(value) if value.eq_ignore_ascii_case("BOARD") => AssetKind::Board,
            Some(value) if value.eq_ignore_ascii_case("SENSOR") => AssetKind::Sensor,
            Some(value) => AssetKind::Other(value.to_string()),
        }
    }

    /// The raw label, as it appeared in the document.
    pub fn label(&self) -> Option<&str> {
        match self {
            AssetKind::Device => Some("DEVICE"),
            AssetKind::Board => Some("BOARD"),
            AssetKind::Sensor => Some("SENSOR"),
            AssetKind::Other(value) => Some(value),
            AssetKind::Missing => None,
        }
    }
}

/// One node of the asset hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct AssetNode {
    pub asset_uid: Option<String>,
    pub kind: AssetKind,
    /// `type` exactly as written, kept for sensor records.
    pub raw_kind: Option<String>,
    pub name: Option<String>,
    pub children: Vec<AssetNode>,
}

impl AssetNode {
    pub fn new(kind: AssetKind) -> Self {
        Self {
            asset_uid: None,
            raw_kind: kind.label().map(str::to_string),
            kind,
            name: None,
            children: Vec::new(),
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.asset_uid = Some(uid.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_child(mut self, child: AssetNode) -> Self {
        self.children.push(child);
        self
    }
}

impl From<&Value> for AssetNode {
    fn from(value: &Value) -> Self {
        let asset_uid = value
            .get("assetUid")
            .and_then(Value::as_str)
            .map(str::to_string);
        let attributes = value.get("customAttributes").and_then(Value::as_object);
        let raw_kind = attribute_text(attributes, "type");
        let children = attributes
            .and_then(|attrs| attrs.get("children"))
            .and_then(Value::as_array)
            .map(|children| children.iter().map(AssetNode::from).collect())
            .unwrap_or_default();

        Self {
            asset_uid,
            kind: AssetKind::parse(raw_kind),
            raw_kind: raw_kind.map(str::to_string),
            name: attribute_text(attributes, "name").map(str::to_string),
            children,
        }
    }
}

fn attribute_text<'a>(attributes: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    attributes?.get(key)?.as_str()
}

impl From<Value> for AssetNode {
    fn from(value: Value) -> Self {
        AssetNode::from(&value)
    }
}

/// A sensor flattened out of the hierarchy together with its owning device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorRecord {
    pub sensor_uid: String,
    pub sensor_name: String,
    pub device_name: String,
    pub device_type: String,
    pub device_uid: Option<String>,
}

/// A timestamped set of field values reported for one parent device.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryReading {
    pub parent_asset_uid: String,
    pub timestamp: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl TelemetryReading {
    /// Builds a reading from a stored `payload` object; the parent uid is
    /// taken from the payload's `parent_asset_uid` field.
    pub fn from_payload(timestamp: DateTime<Utc>, payload: Value) -> Option<Self> {
        let Value::Object(fields) = payload else {
            return None;
        };
        let parent_asset_uid = fields.get("parent_asset_uid")?.as_str()?.to_string();
        Some(Self {
            parent_asset_uid,
            timestamp,
            fields,
        })
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_parsing_ignores_case() {
        assert_eq!(AssetKind::parse(Some("device")), AssetKind::Device);
        assert_eq!(AssetKind::parse(Some("Board")), AssetKind::Board);
        assert_eq!(AssetKind::parse(Some("SENSOR")), AssetKind::Sensor);
        assert_eq!(
            AssetKind::parse(Some(" sensor")),
            AssetKind::Other(" sensor".into())
        );
        assert_eq!(AssetKind::parse(None), AssetKind::Missing);
    }

    #[test]
    fn parses_nested_document() {
        let doc = json!({
            "assetUid": "D1",
            "customAttributes": {
                "type": "Device",
                "name": "Smart Fridge A",
                "children": [{
                    "assetUid": "B1",
                    "customAttributes": {
                        "type": "BOARD",
                        "children": [{
                            "assetUid": "S1",
                            "customAttributes": { "type": "SENSOR", "name": "Moisture Sensor" }
                        }]
                    }
                }]
            }
        });

        let node: AssetNode = serde_json::from_value(doc).unwrap();
        assert_eq!(node.asset_uid.as_deref(), Some("D1"));
        assert_eq!(node.kind, AssetKind::Device);
        assert_eq!(node.raw_kind.as_deref(), Some("Device"));
        assert_eq!(node.name.as_deref(), Some("Smart Fridge A"));
        let sensor = &node.children[0].children[0];
        assert_eq!(sensor.kind, AssetKind::Sensor);
        assert_eq!(sensor.name.as_deref(), Some("Moisture Sensor"));
    }

    #[test]
    fn malformed_fields_become_absent() {
        let doc = json!({
            "assetUid": 17,
            "customAttributes": { "type": 3, "name": null, "children": "nope" }
        });

        let node = AssetNode::from(&doc);
        assert_eq!(node.asset_uid, None);
        assert_eq!(node.kind, AssetKind::Missing);
        assert_eq!(node.name, None);
        assert!(node.children.is_empty());

        let node = AssetNode::from(&json!("not an object"));
        assert_eq!(node.kind, AssetKind::Missing);
    }

    #[test]
    fn reading_requires_parent_uid() {
        let ts = Utc::now();
        let reading =
            TelemetryReading::from_payload(ts, json!({"parent_asset_uid": "D1", "Ammeter": 2.5}))
                .unwrap();
        assert_eq!(reading.parent_asset_uid, "D1");
        assert_eq!(reading.field("Ammeter"), Some(&json!(2.5)));

        assert!(TelemetryReading::from_payload(ts, json!({"Ammeter": 2.5})).is_none());
        assert!(TelemetryReading::from_payload(ts, json!([1, 2])).is_none());
    }
}
