use anyhow::{anyhow, bail, Result};
use chrono::NaiveDateTime;
use opencv::{core, prelude::*, videoio};
use std::path::{Path, PathBuf};

use crate::decoder::video::{frame_to_mat, path_str};
use crate::decoder::{DecodedFrame, FrameRow};
use crate::shared::config::ExtractorConfig;
use crate::shared::constants;
use crate::utils::{file_utils, time_utils};

/// Encoder settings shared by segments and the combined video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSettings {
    pub fourcc: String,
    pub extension: String,
    pub rgb_fps: f64,
    pub vlc_fps: f64,
}

impl VideoSettings {
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            fourcc: config.video_fourcc.clone(),
            extension: config.video_extension.clone(),
            rgb_fps: config.rgb_fps,
            vlc_fps: config.vlc_fps,
        }
    }

    pub fn fourcc_code(&self) -> Result<i32> {
        let c: Vec<char> = self.fourcc.chars().collect();
        if c.len() != 4 {
            bail!("FOURCC must be four characters: {:?}", self.fourcc);
        }
        Ok(videoio::VideoWriter::fourcc(c[0], c[1], c[2], c[3])?)
    }

    /// Color feeds and single-channel feeds are captured at different rates.
    pub fn fps_for(&self, is_color: bool) -> f64 {
        if is_color {
            self.rgb_fps
        } else {
            self.vlc_fps
        }
    }
}

/// One encoded chunk of a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSegment {
    pub path: PathBuf,
    pub fps: f64,
    /// (width, height)
    pub resolution: (u32, u32),
    pub frames: usize,
}

pub fn open_writer(path: &Path, settings: &VideoSettings, fps: f64, resolution: (u32, u32)) -> Result<videoio::VideoWriter> {
    let writer = videoio::VideoWriter::new(
        path_str(path)?,
        settings.fourcc_code()?,
        fps,
        core::Size::new(resolution.0 as i32, resolution.1 as i32),
        true,
    )?;
    if !writer.is_opened()? {
        bail!("Failed to open video writer: {}", path.display());
    }
    Ok(writer)
}

struct OpenSegment {
    writer: videoio::VideoWriter,
    segment: VideoSegment,
    is_color: bool,
    shape: (usize, usize),
}

/// Encodes each chunk of a feed into its own segment, frame by frame, and
/// records every frame's offset from the feed's first frame in milliseconds.
pub struct VideoSink {
    feed_dir: PathBuf,
    videos_dir: PathBuf,
    table: String,
    settings: VideoSettings,
    current: Option<OpenSegment>,
    segments: Vec<VideoSegment>,
    first_timestamp: Option<NaiveDateTime>,
    millis: Vec<f64>,
}

impl VideoSink {
    pub fn create(feed_dir: &Path, table: &str, settings: VideoSettings) -> Result<Self> {
        let videos_dir = feed_dir.join(constants::VIDEOS_DIR);
        file_utils::ensure_dir(&videos_dir)?;
        Ok(Self {
            feed_dir: feed_dir.to_path_buf(),
            videos_dir,
            table: table.to_string(),
            settings,
            current: None,
            segments: Vec::new(),
            first_timestamp: None,
            millis: Vec::new(),
        })
    }

    pub fn timecodes_path(&self) -> PathBuf {
        self.feed_dir
            .join(format!("{}{}", self.table, constants::TIMECODES_SUFFIX))
    }

    fn next_segment_path(&self) -> PathBuf {
        self.videos_dir.join(format!(
            "{}_{}.{}",
            self.table,
            self.segments.len() + 1,
            self.settings.extension
        ))
    }

    /// Adds a frame to the current chunk's segment. The segment is opened on
    /// its first frame, which fixes its resolution and frame rate.
    pub fn write_frame(&mut self, row: &FrameRow, frame: &DecodedFrame) -> Result<()> {
        let timestamp = row.parsed_timestamp()?;
        let first = *self.first_timestamp.get_or_insert(timestamp);
        self.millis
            .push(time_utils::seconds_between(first, timestamp) * 1000.0);

        if self.current.is_none() {
            let path = self.next_segment_path();
            let fps = self.settings.fps_for(row.is_color());
            let resolution = (frame.cols as u32, frame.rows as u32);
            log::info!("Writing video chunk {}", self.segments.len() + 1);
            let writer = open_writer(&path, &self.settings, fps, resolution)?;
            self.current = Some(OpenSegment {
                writer,
                segment: VideoSegment {
                    path,
                    fps,
                    resolution,
                    frames: 0,
                },
                is_color: row.is_color(),
                shape: (frame.rows, frame.cols),
            });
        }

        let open = self
            .current
            .as_mut()
            .ok_or_else(|| anyhow!("No open segment"))?;
        if open.shape != (frame.rows, frame.cols) || open.is_color != row.is_color() {
            bail!(
                "Frame {} ({}x{}, encoding {}) does not match segment {} ({}x{})",
                row.image_count,
                frame.cols,
                frame.rows,
                row.encoding,
                open.segment.path.display(),
                open.shape.1,
                open.shape.0
            );
        }

        let mat = frame_to_mat(frame)?;
        open.writer.write(&mat)?;
        open.segment.frames += 1;
        Ok(())
    }

    /// Closes the current segment, if any frame was written to it.
    pub fn end_chunk(&mut self) -> Result<Option<&VideoSegment>> {
        match self.current.take() {
            Some(mut open) => {
                open.writer.release()?;
                self.segments.push(open.segment);
                Ok(self.segments.last())
            }
            None => Ok(None),
        }
    }

    /// Closes any open segment and writes the millisecond log.
    pub fn finish(mut self) -> Result<Vec<VideoSegment>> {
        self.end_chunk()?;
        let lines: Vec<String> = self.millis.iter().map(|ms| time_utils::format_float(*ms)).collect();
        log::info!("Writing millisecond table {}", self.timecodes_path().display());
        file_utils::write_lines(&self.timecodes_path(), &lines)?;
        Ok(self.segments)
    }
}
