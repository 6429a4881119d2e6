use rusqlite::Connection;

use super::connection::{json_value, query_error, text_value};
use crate::shared::constants;
use crate::shared::error::StorageError;

/// One entry of the mission log.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionLogRow {
    pub event: Option<String>,
    /// Kept as stored: step ids are integers in some captures, text in others.
    pub step: serde_json::Value,
    pub timestamp: Option<String>,
}

pub fn read_mission_log(conn: &Connection) -> Result<Vec<MissionLogRow>, StorageError> {
    let table = constants::MISSION_LOG_TABLE;
    let sql = format!("SELECT Event, Step, timestamp FROM {} ORDER BY rowid", table);
    let mut stmt = conn.prepare(&sql).map_err(query_error(table))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MissionLogRow {
                event: text_value(row.get_ref(0)?),
                step: json_value(row.get_ref(1)?),
                timestamp: text_value(row.get_ref(2)?),
            })
        })
        .map_err(query_error(table))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(query_error(table))?;
    log::debug!("Read {} rows from {}", rows.len(), table);
    Ok(rows)
}
