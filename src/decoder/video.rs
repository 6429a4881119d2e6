use anyhow::{anyhow, Result};
use opencv::{core, prelude::*, videoio};
use std::path::Path;

use super::frame_data::DecodedFrame;

/// Sequential reader over an encoded video file.
pub struct VideoReader {
    capture: videoio::VideoCapture,
    fps: f64,
    width: u32,
    height: u32,
    frame_count: u64,
}

impl VideoReader {
    pub fn open(path: &Path) -> Result<Self> {
        let path_str = path_str(path)?;
        let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)?;

        if !capture.is_opened()? {
            return Err(anyhow!("Failed to open video file: {}", path_str));
        }

        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;

        log::debug!(
            "Opened {}: {}x{} @ {} fps, {} frames",
            path_str,
            width,
            height,
            fps,
            frame_count
        );

        Ok(Self {
            capture,
            fps,
            width,
            height,
            frame_count,
        })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Frame count reported by the container.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Container duration in seconds (frame count over frame rate).
    pub fn duration_secs(&self) -> f64 {
        if self.fps > 0.0 {
            self.frame_count as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Reads the next frame into `frame`; `false` at end of stream.
    pub fn read_into(&mut self, frame: &mut Mat) -> Result<bool> {
        if !self.capture.read(frame)? {
            return Ok(false);
        }
        Ok(!frame.empty())
    }

    pub fn read_frame(&mut self) -> Result<Option<DecodedFrame>> {
        let mut mat = Mat::default();
        if self.read_into(&mut mat)? {
            Ok(Some(mat_to_frame(&mat)?))
        } else {
            Ok(None)
        }
    }
}

pub fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow!("Path is not valid UTF-8: {:?}", path))
}

/// Copies a decoded frame into an 8-bit BGR `Mat`.
pub fn frame_to_mat(frame: &DecodedFrame) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        frame.rows as i32,
        frame.cols as i32,
        core::CV_8UC3,
        core::Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(&frame.data);
    Ok(mat)
}

pub fn mat_to_frame(mat: &Mat) -> Result<DecodedFrame> {
    if mat.typ() != core::CV_8UC3 {
        return Err(anyhow!("Expected an 8-bit 3-channel frame, got type {}", mat.typ()));
    }
    if !mat.is_continuous() {
        return Err(anyhow!("Frame is not continuous"));
    }
    Ok(DecodedFrame::new(
        mat.rows() as usize,
        mat.cols() as usize,
        mat.data_bytes()?.to_vec(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat_round_trip_keeps_layout() {
        let data: Vec<u8> = (0..(2 * 3 * 3) as u8).collect();
        let frame = DecodedFrame::new(2, 3, data);
        let mat = frame_to_mat(&frame).unwrap();
        assert_eq!(mat.rows(), 2);
        assert_eq!(mat.cols(), 3);
        assert_eq!(mat.channels(), 3);
        assert_eq!(mat_to_frame(&mat).unwrap(), frame);
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(VideoReader::open(&dir.path().join("missing.avi")).is_err());
    }
}
