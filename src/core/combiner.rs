use anyhow::{bail, Context, Result};
use opencv::prelude::*;
use std::path::Path;

use super::video_sink::{open_writer, VideoSegment, VideoSettings};
use crate::decoder::VideoReader;

/// Concatenates segments into `output`, copying frames in segment order.
/// The output takes the first segment's frame rate and resolution.
/// Returns the number of frames written.
pub fn combine_segments(segments: &[VideoSegment], output: &Path, settings: &VideoSettings) -> Result<u64> {
    let Some(first) = segments.first() else {
        bail!("No segments to combine into {}", output.display());
    };

    let mut writer = open_writer(output, settings, first.fps, first.resolution)?;
    let mut written = 0u64;
    let mut frame = Mat::default();

    for segment in segments {
        let mut reader = VideoReader::open(&segment.path)
            .with_context(|| format!("Failed to open segment {}", segment.path.display()))?;
        if reader.resolution() != first.resolution {
            log::warn!(
                "Segment {} is {:?}, combined video is {:?}",
                segment.path.display(),
                reader.resolution(),
                first.resolution
            );
        }
        let mut copied = 0u64;
        while reader.read_into(&mut frame)? {
            writer.write(&frame)?;
            copied += 1;
        }
        log::debug!("Copied {} frames from {}", copied, segment.path.display());
        written += copied;
    }

    writer.release()?;
    log::info!("Combined {} segments ({} frames) into {}", segments.len(), written, output.display());
    Ok(written)
}
