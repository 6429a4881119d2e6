use rusqlite::Connection;

use super::connection::{query_error, text_value};
use crate::shared::constants;
use crate::shared::error::StorageError;

/// One detection row of the RGB bounding-box table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRow {
    pub timestamp: Option<String>,
    pub component_id: Option<String>,
}

pub fn read_detections(conn: &Connection) -> Result<Vec<DetectionRow>, StorageError> {
    let table = constants::PERCEPTION_TABLE;
    let sql = format!("SELECT timestamp, component_id FROM {} ORDER BY rowid", table);
    let mut stmt = conn.prepare(&sql).map_err(query_error(table))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DetectionRow {
                timestamp: text_value(row.get_ref(0)?),
                component_id: text_value(row.get_ref(1)?),
            })
        })
        .map_err(query_error(table))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(query_error(table))?;
    log::debug!("Read {} rows from {}", rows.len(), table);
    Ok(rows)
}
