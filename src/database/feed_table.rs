use rusqlite::{params, Connection, Row};

use super::connection::{checked_identifier, query_error};
use crate::decoder::{BoundingAnnotation, FrameGroup, FrameRow, JoinedRow};
use crate::shared::constants;
use crate::shared::error::StorageError;

/// A sensor table, optionally left-joined with its `_bounding_boxes` table.
pub struct FeedTable<'c> {
    conn: &'c Connection,
    table: String,
    join: bool,
}

impl<'c> FeedTable<'c> {
    pub fn new(conn: &'c Connection, table: &str, join: bool) -> Result<Self, StorageError> {
        checked_identifier(table)?;
        Ok(Self {
            conn,
            table: table.to_string(),
            join,
        })
    }

    pub fn name(&self) -> &str {
        &self.table
    }

    fn from_clause(&self) -> String {
        if self.join {
            format!(
                "{t} AS f LEFT OUTER JOIN {t}{suffix} AS b USING (image_count)",
                t = self.table,
                suffix = constants::BOUNDING_BOX_SUFFIX
            )
        } else {
            format!("{} AS f", self.table)
        }
    }

    /// Rows the windowed reads will walk. With the join this counts joined
    /// rows, so a frame with three annotations counts three times.
    pub fn count_rows(&self) -> Result<usize, StorageError> {
        let sql = format!("SELECT COUNT(1) FROM {}", self.from_clause());
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(query_error(&self.table))?;
        Ok(count.max(0) as usize)
    }

    /// Reads one window, ordered by timestamp with insertion order breaking ties.
    pub fn read_window(&self, offset: usize, len: usize) -> Result<Vec<JoinedRow>, StorageError> {
        let (annotation_cols, order) = if self.join {
            ("b.component_id, b.bounds", "f.timestamp, f.rowid, b.rowid")
        } else {
            ("NULL, NULL", "f.timestamp, f.rowid")
        };
        let sql = format!(
            "SELECT f.image_count, f.timestamp, f.data, f.width, f.height, f.encoding, f.is_bigendian, {} \
             FROM {} ORDER BY {} LIMIT ?1 OFFSET ?2",
            annotation_cols,
            self.from_clause(),
            order
        );

        let mut stmt = self.conn.prepare(&sql).map_err(query_error(&self.table))?;
        let raw_rows = stmt
            .query_map(params![len as i64, offset as i64], read_raw_row)
            .map_err(query_error(&self.table))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error(&self.table))?;

        raw_rows.into_iter().map(RawRow::into_joined).collect()
    }

    /// Windowed pass over the whole table.
    pub fn chunks(&self, chunk_size: usize) -> Result<ChunkReader<'_, 'c>, StorageError> {
        let total = self.count_rows()?;
        Ok(ChunkReader {
            table: self,
            windows: plan_windows(total, chunk_size).into_iter(),
        })
    }
}

struct RawRow {
    frame: FrameRow,
    component_id: Option<String>,
    bounds: Option<Vec<u8>>,
}

impl RawRow {
    fn into_joined(self) -> Result<JoinedRow, StorageError> {
        let annotation = match self.bounds {
            Some(blob) => Some(BoundingAnnotation::from_blob(
                self.frame.image_count,
                self.component_id.unwrap_or_default(),
                &blob,
            )?),
            None => None,
        };
        Ok(JoinedRow {
            frame: self.frame,
            annotation,
        })
    }
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        frame: FrameRow {
            image_count: row.get(0)?,
            timestamp: row.get(1)?,
            data: row.get::<_, Option<Vec<u8>>>(2)?.unwrap_or_default(),
            width: row.get(3)?,
            height: row.get(4)?,
            encoding: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            is_bigendian: row.get::<_, Option<bool>>(6)?.unwrap_or(false),
        },
        component_id: row.get(7)?,
        bounds: row.get(8)?,
    })
}

/// (offset, len) of every window needed to cover `total` rows.
pub fn plan_windows(total: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    let chunk_size = chunk_size.max(1);
    (0..total)
        .step_by(chunk_size)
        .map(|offset| (offset, chunk_size.min(total - offset)))
        .collect()
}

/// Iterator over the windows of a [`FeedTable`], one query per step.
pub struct ChunkReader<'t, 'c> {
    table: &'t FeedTable<'c>,
    windows: std::vec::IntoIter<(usize, usize)>,
}

impl ChunkReader<'_, '_> {
    pub fn remaining(&self) -> usize {
        self.windows.len()
    }
}

impl Iterator for ChunkReader<'_, '_> {
    type Item = Result<Vec<JoinedRow>, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (offset, len) = self.windows.next()?;
        log::debug!(
            "Reading {} rows of {} at offset {}",
            len,
            self.table.name(),
            offset
        );
        Some(self.table.read_window(offset, len))
    }
}

/// Groups each window into frames. A frame whose joined rows straddle a
/// window boundary is held back and emitted once, with all its annotations,
/// as part of the following window.
pub struct FrameChunks<'t, 'c> {
    reader: ChunkReader<'t, 'c>,
    pending: Option<FrameGroup>,
}

impl<'t, 'c> FrameChunks<'t, 'c> {
    pub fn new(reader: ChunkReader<'t, 'c>) -> Self {
        Self {
            reader,
            pending: None,
        }
    }
}

impl Iterator for FrameChunks<'_, '_> {
    type Item = Result<Vec<FrameGroup>, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rows = match self.reader.next()? {
            Ok(rows) => rows,
            Err(e) => return Some(Err(e)),
        };

        let mut groups = FrameGroup::group(rows);
        if let Some(mut held) = self.pending.take() {
            match groups.first() {
                Some(first) if first.frame.image_count == held.frame.image_count => {
                    held.merge(groups.remove(0));
                }
                _ => {}
            }
            groups.insert(0, held);
        }

        if self.reader.remaining() > 0 {
            self.pending = groups.pop();
        }
        Some(Ok(groups))
    }
}
