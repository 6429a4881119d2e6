use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::database::mission_log::{read_mission_log, MissionLogRow};
use crate::database::open_database;
use crate::schema::{ActionRecord, StepRecord};
use crate::shared::constants;
use crate::utils::{file_utils, time_utils};

/// Log rows sharing one well-formed timestamp.
struct LogGroup<'r> {
    time: NaiveTime,
    events: HashSet<&'r str>,
    first_step: &'r serde_json::Value,
}

/// Groups rows by timestamp in one pass, first-seen order. Rows with a
/// missing or malformed timestamp are dropped.
fn group_by_timestamp(rows: &[MissionLogRow]) -> Vec<LogGroup<'_>> {
    let mut index: HashMap<&str, Option<usize>> = HashMap::new();
    let mut groups: Vec<LogGroup> = Vec::new();

    for row in rows {
        let Some(ts) = row.timestamp.as_deref() else {
            continue;
        };
        let slot = *index.entry(ts).or_insert_with(|| {
            time_utils::parse_mission_time(ts).ok().map(|time| {
                groups.push(LogGroup {
                    time,
                    events: HashSet::new(),
                    first_step: &row.step,
                });
                groups.len() - 1
            })
        });
        if let (Some(slot), Some(event)) = (slot, row.event.as_deref()) {
            groups[slot].events.insert(event);
        }
    }
    groups
}

/// For every timestamp, a 0/1 flag per event seen anywhere in the log.
pub fn actions(rows: &[MissionLogRow], reference: NaiveDate) -> Result<Vec<ActionRecord>> {
    let mut seen = HashSet::new();
    let events: Vec<&str> = rows
        .iter()
        .filter_map(|r| r.event.as_deref())
        .filter(|event| seen.insert(*event))
        .collect();

    let mut records = Vec::new();
    for group in group_by_timestamp(rows) {
        records.push(ActionRecord {
            timestamp: time_utils::to_ptg_timestamp(group.time, reference)?,
            events: events
                .iter()
                .map(|e| (e.to_string(), u8::from(group.events.contains(e))))
                .collect(),
        });
    }

    records.sort_by_key(|r| time_utils::ptg_sort_key(&r.timestamp));
    Ok(records)
}

/// One `NEW` step per timestamp, carrying the first step id logged at it.
pub fn steps(rows: &[MissionLogRow], reference: NaiveDate) -> Result<Vec<StepRecord>> {
    let mut records = Vec::new();
    for group in group_by_timestamp(rows) {
        records.push(StepRecord::new_step(
            group.first_step.clone(),
            time_utils::to_ptg_timestamp(group.time, reference)?,
        ));
    }

    records.sort_by_key(|r| time_utils::ptg_sort_key(&r.timestamp));
    Ok(records)
}

pub fn run(input: &Path, output_dir: &Path, reference: NaiveDate) -> Result<(usize, usize)> {
    let conn = open_database(input)?;
    let rows = read_mission_log(&conn)?;
    let action_records = actions(&rows, reference)?;
    let step_records = steps(&rows, reference)?;

    file_utils::ensure_dir(output_dir)?;
    let actions_path = output_dir.join(constants::ACTIONS_FILE);
    let steps_path = output_dir.join(constants::STEPS_FILE);
    file_utils::write_json(&actions_path, &action_records)?;
    file_utils::write_json(&steps_path, &step_records)?;

    log::info!(
        "Wrote {} action records to {} and {} step records to {}",
        action_records.len(),
        actions_path.display(),
        step_records.len(),
        steps_path.display()
    );
    Ok((action_records.len(), step_records.len()))
}
