use chrono::NaiveDateTime;

use crate::shared::constants;
use crate::shared::error::StorageError;
use crate::utils::time_utils;

/// One sensor sample as stored in a feed table.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRow {
    pub image_count: i64,
    pub timestamp: String,
    pub data: Vec<u8>,
    pub width: i64,
    pub height: i64,
    pub encoding: String,
    pub is_bigendian: bool,
}

impl FrameRow {
    pub fn is_color(&self) -> bool {
        self.encoding == constants::COLOR_ENCODING
    }

    pub fn parsed_timestamp(&self) -> anyhow::Result<NaiveDateTime> {
        Ok(time_utils::parse_frame_timestamp(&self.timestamp)?)
    }
}

/// A labelled polygon drawn on a frame, as (row, col) pixel pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingAnnotation {
    pub component_id: String,
    pub points: Vec<(i64, i64)>,
}

impl BoundingAnnotation {
    /// Reads a `bounds` blob: native-endian i64 values, consumed in pairs.
    pub fn from_blob(image_count: i64, component_id: String, blob: &[u8]) -> Result<Self, StorageError> {
        const PAIR: usize = 2 * std::mem::size_of::<i64>();
        if blob.len() % PAIR != 0 {
            return Err(StorageError::MalformedBounds {
                image_count,
                len: blob.len(),
            });
        }
        let points = blob
            .chunks_exact(PAIR)
            .map(|pair| {
                let (row, col) = pair.split_at(8);
                (read_i64(row), read_i64(col))
            })
            .collect();
        Ok(Self { component_id, points })
    }
}

fn read_i64(bytes: &[u8]) -> i64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    i64::from_ne_bytes(raw)
}

/// A row of the (optionally joined) feed query.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub frame: FrameRow,
    pub annotation: Option<BoundingAnnotation>,
}

/// All joined rows of one frame: the frame itself plus every annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGroup {
    pub frame: FrameRow,
    pub annotations: Vec<BoundingAnnotation>,
}

impl FrameGroup {
    /// Folds consecutive rows sharing an `image_count` into one group each.
    /// Row order is preserved.
    pub fn group(rows: Vec<JoinedRow>) -> Vec<FrameGroup> {
        let mut groups: Vec<FrameGroup> = Vec::new();
        for row in rows {
            match groups.last_mut() {
                Some(last) if last.frame.image_count == row.frame.image_count => {
                    last.annotations.extend(row.annotation);
                }
                _ => groups.push(FrameGroup {
                    frame: row.frame,
                    annotations: row.annotation.into_iter().collect(),
                }),
            }
        }
        groups
    }

    /// Adds the rows of `other` (the same frame, read in a later window).
    pub fn merge(&mut self, other: FrameGroup) {
        self.annotations.extend(other.annotations);
    }
}

/// A 3-channel pixel grid in BGR order, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<u8>,
}

impl DecodedFrame {
    pub const CHANNELS: usize = 3;

    pub fn new(rows: usize, cols: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), rows * cols * Self::CHANNELS);
        Self { rows, cols, data }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.rows, self.cols, Self::CHANNELS)
    }

    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        let offset = (row * self.cols + col) * Self::CHANNELS;
        [self.data[offset], self.data[offset + 1], self.data[offset + 2]]
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, color: [u8; 3]) {
        let offset = (row * self.cols + col) * Self::CHANNELS;
        self.data[offset..offset + Self::CHANNELS].copy_from_slice(&color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(image_count: i64, label: Option<&str>) -> JoinedRow {
        JoinedRow {
            frame: FrameRow {
                image_count,
                timestamp: format!("2023-03-15 20:36:42.{:06}", image_count),
                data: vec![0; 4],
                width: 2,
                height: 2,
                encoding: "mono8".into(),
                is_bigendian: false,
            },
            annotation: label.map(|l| BoundingAnnotation {
                component_id: l.into(),
                points: vec![(0, 0)],
            }),
        }
    }

    #[test]
    fn groups_consecutive_rows_by_image_count() {
        let groups = FrameGroup::group(vec![
            row(1, Some("cdu")),
            row(1, Some("fdvcp")),
            row(2, None),
            row(3, Some("cdu")),
        ]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].annotations.len(), 2);
        assert_eq!(groups[0].annotations[1].component_id, "fdvcp");
        assert!(groups[1].annotations.is_empty());
        assert_eq!(groups[2].frame.image_count, 3);
    }

    #[test]
    fn reads_bounds_blob_as_pairs() {
        let mut blob = Vec::new();
        for v in [1i64, 2, 3, 4] {
            blob.extend_from_slice(&v.to_ne_bytes());
        }
        let annotation = BoundingAnnotation::from_blob(7, "cdu".into(), &blob).unwrap();
        assert_eq!(annotation.points, vec![(1, 2), (3, 4)]);

        let err = BoundingAnnotation::from_blob(7, "cdu".into(), &blob[..12]).unwrap_err();
        assert!(matches!(err, StorageError::MalformedBounds { image_count: 7, len: 12 }));
    }
}
