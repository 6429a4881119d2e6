use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::shared::constants;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Gaze ray sample (`eyetim.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeRecord {
    #[serde(rename = "GazeOrigin")]
    pub gaze_origin: Vec3,
    #[serde(rename = "GazeDirection")]
    pub gaze_direction: Vec3,
    pub timestamp: String,
}

/// One detected object inside a perception frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionValue {
    pub xyxyn: [u32; 4],
    pub confidence: u32,
    pub class_id: u32,
    pub label: String,
}

impl DetectionValue {
    /// Presence-only detection: no box, full confidence.
    pub fn present(label: &str) -> Self {
        Self {
            xyxyn: [0, 0, 0, 0],
            confidence: 1,
            class_id: 1,
            label: label.to_string(),
        }
    }
}

/// Perception frame (`detic:image.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionRecord {
    pub frame_type: u32,
    pub values: Vec<DetectionValue>,
    pub timestamp: String,
}

impl PerceptionRecord {
    pub fn new(values: Vec<DetectionValue>, timestamp: String) -> Self {
        Self {
            frame_type: constants::PERCEPTION_FRAME_TYPE,
            values,
            timestamp,
        }
    }
}

/// Action flags at one timestamp (`egovlp:action:steps.json`).
///
/// Serialized flat: `{"timestamp": ..., "<event>": 0|1, ...}` with events in
/// first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub timestamp: String,
    pub events: Vec<(String, u8)>,
}

impl Serialize for ActionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.events.len() + 1))?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        for (event, flag) in &self.events {
            map.serialize_entry(event, flag)?;
        }
        map.end()
    }
}

/// Step status entry (`reasoning:check_status.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_id: serde_json::Value,
    pub step_status: String,
    pub step_description: String,
    pub error_status: bool,
    pub error_description: String,
    pub timestamp: String,
}

impl StepRecord {
    pub fn new_step(step_id: serde_json::Value, timestamp: String) -> Self {
        Self {
            step_id,
            step_status: constants::NEW_STEP_STATUS.to_string(),
            step_description: String::new(),
            error_status: false,
            error_description: String::new(),
            timestamp,
        }
    }
}

/// Session summary (`additional_metadata.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub duration_secs: u64,
    #[serde(rename = "first-entry")]
    pub first_entry: String,
    #[serde(rename = "last-entry")]
    pub last_entry: String,
}
