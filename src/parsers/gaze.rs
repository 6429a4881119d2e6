use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use crate::schema::{GazeRecord, Vec3};
use crate::shared::constants;
use crate::utils::file_utils;

/// Gaze sample as exported by the capture rig.
#[derive(Debug, Clone, Deserialize)]
pub struct GazeSample {
    pub origin_x: f64,
    pub origin_y: f64,
    pub origin_z: f64,
    pub direction_x: f64,
    pub direction_y: f64,
    pub direction_z: f64,
    /// Epoch milliseconds, stored as a number or as text depending on the exporter
    pub timestamp: serde_json::Value,
}

impl GazeSample {
    pub fn to_record(&self) -> GazeRecord {
        let stamp = match &self.timestamp {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        GazeRecord {
            gaze_origin: Vec3 {
                x: self.origin_x,
                y: self.origin_y,
                z: self.origin_z,
            },
            gaze_direction: Vec3 {
                x: self.direction_x,
                y: self.direction_y,
                z: self.direction_z,
            },
            timestamp: format!("{}{}", stamp, constants::PTG_FRAME_SUFFIX),
        }
    }
}

pub fn convert(samples: &[GazeSample]) -> Vec<GazeRecord> {
    samples.iter().map(GazeSample::to_record).collect()
}

pub fn run(input: &Path, output: &Path) -> Result<usize> {
    let samples: Vec<GazeSample> = file_utils::read_json(input)?;
    let records = convert(&samples);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        file_utils::ensure_dir(parent)?;
    }
    file_utils::write_json(output, &records)?;
    log::info!("Wrote {} gaze records to {}", records.len(), output.display());
    Ok(records.len())
}
