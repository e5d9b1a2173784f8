//! Saved map/build data. Field names follow the external JSON format.

use serde::{Deserialize, Serialize};

use crate::api::types::{AnchorId, PartId};

/// One saved part. `kind` selects the part type through the type registry;
/// the remaining fields are read according to that type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedPart {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: PartId,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    /// Flattened world-space vertex list: `[x0, y0, x1, y1, ...]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y1: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin_dir: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torque: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<f32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_collide: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
}

/// A joint member, referenced by part id and anchor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub obj_id: PartId,
    pub anchor_id: AnchorId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SerializedJoint {
    pub connections: Vec<Connection>,
}

/// The joint graph, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SerializedPhysics {
    pub joints: Vec<SerializedJoint>,
}

impl SerializedPhysics {
    /// Joints as sorted connection lists, for order-independent comparison.
    pub fn normalized(&self) -> Vec<Vec<Connection>> {
        let mut joints: Vec<Vec<Connection>> = self
            .joints
            .iter()
            .map(|j| {
                let mut c = j.connections.clone();
                c.sort();
                c
            })
            .collect();
        joints.sort();
        joints
    }
}

/// Envelope for a saved map or build.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapData {
    pub objects: Vec<SerializedPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physics: Option<SerializedPhysics>,
}

impl MapData {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Largest part id referenced by the data.
    pub fn max_id(&self) -> Option<u32> {
        self.objects.iter().map(|o| o.id.0).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_external_format() {
        let json = r#"{
            "objects": [
                {"type": "wheel", "x": 10, "y": 20, "radius": 15, "id": 3},
                {"type": "line", "x1": 0, "y1": 0, "x2": 50, "y2": 0, "id": 4}
            ],
            "physics": {"joints": [{"connections": [
                {"objId": 3, "anchorId": 0},
                {"objId": 4, "anchorId": 1}
            ]}]}
        }"#;
        let data = MapData::from_json(json).unwrap();
        assert_eq!(data.objects.len(), 2);
        assert_eq!(data.objects[0].kind, "wheel");
        assert_eq!(data.objects[0].radius, Some(15.0));
        assert_eq!(data.objects[1].x2, Some(50.0));
        let physics = data.physics.as_ref().unwrap();
        assert_eq!(
            physics.joints[0].connections[1],
            Connection {
                obj_id: PartId(4),
                anchor_id: 1
            }
        );
        assert_eq!(data.max_id(), Some(4));
    }

    #[test]
    fn physics_is_optional() {
        let data = MapData::from_json(r#"{"objects": []}"#).unwrap();
        assert!(data.physics.is_none());
        let json = data.to_json().unwrap();
        assert!(!json.contains("physics"), "absent physics is not written: {json}");
    }

    #[test]
    fn writes_camel_case_and_skips_defaults() {
        let part = SerializedPart {
            kind: "wheel".into(),
            id: PartId(1),
            spin_dir: Some(-1.0),
            ..Default::default()
        };
        let json = serde_json::to_string(&part).unwrap();
        assert!(json.contains("\"type\":\"wheel\""), "{json}");
        assert!(json.contains("\"spinDir\":-1.0"), "{json}");
        assert!(!json.contains("noCollide"), "{json}");
        assert!(!json.contains("width"), "{json}");
    }

    #[test]
    fn normalized_ignores_order() {
        let c = |id, anchor| Connection {
            obj_id: PartId(id),
            anchor_id: anchor,
        };
        let a = SerializedPhysics {
            joints: vec![
                SerializedJoint {
                    connections: vec![c(2, 0), c(1, 0)],
                },
                SerializedJoint {
                    connections: vec![c(3, 1), c(1, 2)],
                },
            ],
        };
        let b = SerializedPhysics {
            joints: vec![
                SerializedJoint {
                    connections: vec![c(1, 2), c(3, 1)],
                },
                SerializedJoint {
                    connections: vec![c(1, 0), c(2, 0)],
                },
            ],
        };
        assert_eq!(a.normalized(), b.normalized());
    }
}
