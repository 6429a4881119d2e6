use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use opencv::{core, imgcodecs};
use std::path::{Path, PathBuf};

use crate::decoder::video::{frame_to_mat, path_str};
use crate::decoder::{DecodedFrame, FrameRow};
use crate::shared::constants;
use crate::utils::{file_utils, time_utils};

/// Writes one PNG per frame under `<feed>/images/` and keeps the
/// `duration`/`file` timing log next to them.
pub struct ImageSink {
    images_dir: PathBuf,
    timecodes_path: PathBuf,
    last_timestamp: Option<NaiveDateTime>,
    pending_lines: Vec<String>,
    written: usize,
}

impl ImageSink {
    pub fn create(feed_dir: &Path, table: &str) -> Result<Self> {
        let images_dir = feed_dir.join(constants::IMAGES_DIR);
        file_utils::ensure_dir(&images_dir)?;
        let timecodes_path = images_dir.join(format!("{}{}", table, constants::TIMECODES_SUFFIX));
        Ok(Self {
            images_dir,
            timecodes_path,
            last_timestamp: None,
            pending_lines: Vec::new(),
            written: 0,
        })
    }

    pub fn timecodes_path(&self) -> &Path {
        &self.timecodes_path
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write_frame(&mut self, row: &FrameRow, frame: &DecodedFrame) -> Result<PathBuf> {
        let timestamp = row.parsed_timestamp()?;
        let path = self.images_dir.join(image_title(row.image_count, timestamp));

        if let Some(last) = self.last_timestamp {
            let seconds = time_utils::seconds_between(last, timestamp);
            self.pending_lines
                .push(format!("duration {}", time_utils::format_float(seconds)));
        }
        self.pending_lines.push(format!("file {}", path.display()));
        self.last_timestamp = Some(timestamp);

        let mat = frame_to_mat(frame)?;
        if !imgcodecs::imwrite(path_str(&path)?, &mat, &core::Vector::new())? {
            bail!("Failed to write image at path: {}", path.display());
        }
        self.written += 1;
        Ok(path)
    }

    /// Appends the chunk's timing lines to the log.
    pub fn flush_chunk(&mut self) -> Result<()> {
        log::debug!("Writing {} timing lines to {}", self.pending_lines.len(), self.timecodes_path.display());
        file_utils::append_lines(&self.timecodes_path, &self.pending_lines)?;
        self.pending_lines.clear();
        Ok(())
    }
}

/// `{image_count}_{timestamp}.png`, colons replaced so the name is portable.
pub fn image_title(image_count: i64, timestamp: NaiveDateTime) -> String {
    let stamp = timestamp.format(constants::FRAME_TITLE_FORMAT);
    format!("{}_{}.png", image_count, stamp).replace(':', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time_utils::parse_frame_timestamp;

    fn row(image_count: i64, timestamp: &str) -> FrameRow {
        FrameRow {
            image_count,
            timestamp: timestamp.into(),
            data: vec![0; 16],
            width: 4,
            height: 4,
            encoding: "mono8".into(),
            is_bigendian: false,
        }
    }

    #[test]
    fn title_sanitizes_colons() {
        let ts = parse_frame_timestamp("2023-03-15 20:36:42.5").unwrap();
        assert_eq!(image_title(12, ts), "12_2023-03-15_20_36_42.500000.png");
    }

    #[test]
    fn failed_png_write_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let feed_dir = dir.path().join("hl2_vlc");
        let mut sink = ImageSink::create(&feed_dir, "hl2_vlc").unwrap();
        std::fs::remove_dir_all(feed_dir.join("images")).unwrap();

        let frame = DecodedFrame::new(4, 4, vec![128; 48]);
        assert!(sink
            .write_frame(&row(1, "2023-03-15 20:36:42.000000"), &frame)
            .is_err());
        assert_eq!(sink.written(), 0);
    }

    #[test]
    fn writes_pngs_and_timing_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ImageSink::create(&dir.path().join("hl2_vlc"), "hl2_vlc").unwrap();
        let frame = DecodedFrame::new(4, 4, vec![128; 48]);

        let first = sink
            .write_frame(&row(1, "2023-03-15 20:36:42.000000"), &frame)
            .unwrap();
        let second = sink
            .write_frame(&row(2, "2023-03-15 20:36:42.200000"), &frame)
            .unwrap();
        sink.flush_chunk().unwrap();
        let third = sink
            .write_frame(&row(3, "2023-03-15 20:36:43.200000"), &frame)
            .unwrap();
        sink.flush_chunk().unwrap();

        assert!(first.exists());
        assert!(second.exists());
        assert_eq!(sink.written(), 3);

        let log = std::fs::read_to_string(sink.timecodes_path()).unwrap();
        let expected = format!(
            "file {}\nduration 0.2\nfile {}\nduration 1.0\nfile {}\n",
            first.display(),
            second.display(),
            third.display()
        );
        assert_eq!(log, expected);

        let back = imgcodecs::imread(path_str(&first).unwrap(), imgcodecs::IMREAD_COLOR).unwrap();
        let decoded = crate::decoder::video::mat_to_frame(&back).unwrap();
        assert_eq!(decoded, frame);
    }
}
