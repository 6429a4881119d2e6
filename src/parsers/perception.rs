use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::path::Path;

use crate::database::open_database;
use crate::database::perception::{read_detections, DetectionRow};
use crate::schema::{DetectionValue, PerceptionRecord};
use crate::shared::constants;
use crate::utils::{file_utils, time_utils};

struct Detections<'r> {
    time: NaiveTime,
    labels: Vec<&'r str>,
}

/// One record per distinct well-formed timestamp, listing which target
/// objects were detected at it, sorted by epoch.
pub fn convert(rows: &[DetectionRow], reference: NaiveDate) -> Result<Vec<PerceptionRecord>> {
    // slot in `groups` per timestamp; None marks a malformed one
    let mut index: HashMap<&str, Option<usize>> = HashMap::new();
    let mut groups: Vec<Detections> = Vec::new();

    for row in rows {
        let Some(ts) = row.timestamp.as_deref() else {
            continue;
        };
        let slot = *index.entry(ts).or_insert_with(|| {
            time_utils::parse_frame_timestamp(ts).ok().map(|parsed| {
                groups.push(Detections {
                    time: parsed.time(),
                    labels: Vec::new(),
                });
                groups.len() - 1
            })
        });
        if let (Some(slot), Some(label)) = (slot, row.component_id.as_deref()) {
            groups[slot].labels.push(label);
        }
    }

    let mut records = Vec::with_capacity(groups.len());
    for group in groups {
        let values = constants::PERCEPTION_TARGETS
            .iter()
            .filter(|target| group.labels.contains(target))
            .map(|target| DetectionValue::present(target))
            .collect();
        records.push(PerceptionRecord::new(
            values,
            time_utils::to_ptg_timestamp(group.time, reference)?,
        ));
    }

    records.sort_by_key(|r| time_utils::ptg_sort_key(&r.timestamp));
    Ok(records)
}

pub fn run(input: &Path, output_dir: &Path, reference: NaiveDate) -> Result<usize> {
    let conn = open_database(input)?;
    let rows = read_detections(&conn)?;
    let records = convert(&rows, reference)?;

    file_utils::ensure_dir(output_dir)?;
    let path = output_dir.join(constants::PERCEPTION_FILE);
    file_utils::write_json(&path, &records)?;
    log::info!("Wrote {} perception records to {}", records.len(), path.display());
    Ok(records.len())
}
