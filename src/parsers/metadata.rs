use anyhow::{bail, Result};
use std::path::Path;

use crate::decoder::VideoReader;
use crate::schema::{MetadataRecord, PerceptionRecord};
use crate::shared::constants;
use crate::utils::file_utils;

/// Summary of a session: whole seconds of video plus the first and last
/// perception timestamps (the perception file is already sorted).
pub fn summarize(duration_secs: f64, perception: &[PerceptionRecord]) -> Result<MetadataRecord> {
    let (Some(first), Some(last)) = (perception.first(), perception.last()) else {
        bail!("Perception file has no entries");
    };
    Ok(MetadataRecord {
        duration_secs: duration_secs.max(0.0).trunc() as u64,
        first_entry: first.timestamp.clone(),
        last_entry: last.timestamp.clone(),
    })
}

pub fn run(video: &Path, output_dir: &Path) -> Result<MetadataRecord> {
    let reader = VideoReader::open(video)?;
    log::debug!(
        "{}: {} frames at {} fps",
        video.display(),
        reader.frame_count(),
        reader.fps()
    );
    let perception: Vec<PerceptionRecord> =
        file_utils::read_json(&output_dir.join(constants::PERCEPTION_FILE))?;
    let metadata = summarize(reader.duration_secs(), &perception)?;

    file_utils::ensure_dir(output_dir)?;
    let path = output_dir.join(constants::METADATA_FILE);
    file_utils::write_json(&path, &metadata)?;
    log::info!("Wrote metadata to {}", path.display());
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video_sink::tests::{avi_settings, gray, row};
    use crate::core::video_sink::VideoSink;

    fn record(ts: &str) -> PerceptionRecord {
        PerceptionRecord::new(Vec::new(), ts.into())
    }

    #[test]
    fn summary_truncates_duration() {
        let meta = summarize(12.9, &[record("1-0"), record("2-0"), record("3-0")]).unwrap();
        assert_eq!(meta.duration_secs, 12);
        assert_eq!(meta.first_entry, "1-0");
        assert_eq!(meta.last_entry, "3-0");
    }

    #[test]
    fn empty_perception_is_an_error() {
        assert!(summarize(1.0, &[]).is_err());
    }

    #[test]
    fn reads_video_duration_and_perception_file() {
        let dir = tempfile::tempdir().unwrap();
        // 10 single-channel frames at 5 fps -> 2 seconds
        let mut sink = VideoSink::create(dir.path(), "hl2_vlc", avi_settings()).unwrap();
        for i in 0..10 {
            let ts = format!("2023-03-15 20:36:{:02}.000", 10 + i);
            sink.write_frame(&row(i, &ts, "mono8"), &gray(16, 16, 50)).unwrap();
        }
        let segments = sink.finish().unwrap();

        let out = dir.path().join("out");
        file_utils::ensure_dir(&out).unwrap();
        file_utils::write_json(&out.join(constants::PERCEPTION_FILE), &vec![record("5-0"), record("9-0")]).unwrap();

        let meta = run(&segments[0].path, &out).unwrap();
        assert_eq!(meta.duration_secs, 2);
        assert_eq!(meta.first_entry, "5-0");
        assert_eq!(meta.last_entry, "9-0");
        assert!(out.join("additional_metadata.json").exists());
    }
}
