use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use super::combiner::combine_segments;
use super::image_sink::ImageSink;
use super::video_sink::{VideoSegment, VideoSettings, VideoSink};
use crate::database::{open_database, FeedTable, FrameChunks};
use crate::decoder::{decode_frame, DecodedFrame, FrameGroup};
use crate::renderer::draw_polygon;
use crate::shared::config::{ExtractorConfig, FeedSelection};
use crate::utils::file_utils;

/// Runs image and video extraction for every configured trial.
///
/// A missing database or a trial with nothing to extract is skipped; any
/// other failure stops the whole run.
pub fn run(config: &ExtractorConfig) -> Result<()> {
    if config.trial_list.is_empty() {
        log::error!("Invalid trial_id: trial_list is empty");
        return Ok(());
    }

    for trial in &config.trial_list {
        let database_path = trial.database_file(&config.database_path);
        if !database_path.exists() {
            log::warn!("Database file doesn't exist {}", database_path.display());
            continue;
        }

        let image_feeds = config.image_feeds();
        let video_feeds = config.video_feeds();
        if image_feeds.is_empty() && video_feeds.is_empty() {
            log::warn!("Nothing to extract, check config settings");
            continue;
        }

        let output_dir = trial.output_dir(&config.database_path);
        file_utils::ensure_dir(&output_dir)?;

        let conn = open_database(&database_path)?;

        for feed in &image_feeds {
            log::info!("Starting {} image extraction for {}", feed.table, trial);
            let frames = generate_images(&conn, &output_dir, feed, config)
                .with_context(|| format!("Image extraction of {} for {}", feed.table, trial))?;
            log::info!("Wrote {} {} images for {}", frames, feed.table, trial);
        }

        for feed in &video_feeds {
            log::info!("Starting {} video extraction for {}", feed.table, trial);
            let segments = generate_videos(&conn, &output_dir, feed, config)
                .with_context(|| format!("Video extraction of {} for {}", feed.table, trial))?;

            if !segments.is_empty() {
                log::info!("Combining {} video feeds for {}", feed.table, trial);
                let settings = VideoSettings::from_config(config);
                let output = output_dir
                    .join(&feed.table)
                    .join(format!("{}.{}", feed.table, settings.extension));
                combine_segments(&segments, &output, &settings)?;
            }
        }
    }

    Ok(())
}

/// Decodes a frame and draws all of its annotations.
pub fn render_group(group: &FrameGroup, config: &ExtractorConfig) -> Result<DecodedFrame> {
    let mut frame = decode_frame(&group.frame, config.mono_axis_order)?;
    for annotation in &group.annotations {
        let color = config.color_for(&annotation.component_id)?;
        draw_polygon(&mut frame, &annotation.points, color, config.overlay_bounds)
            .with_context(|| format!("Drawing {} on frame {}", annotation.component_id, group.frame.image_count))?;
    }
    Ok(frame)
}

/// Writes every frame of a feed as a PNG. Returns the number of images.
pub fn generate_images(
    conn: &Connection,
    output_dir: &Path,
    feed: &FeedSelection,
    config: &ExtractorConfig,
) -> Result<usize> {
    let table = FeedTable::new(conn, &feed.table, feed.include_bbs)?;
    let mut sink = ImageSink::create(&output_dir.join(&feed.table), &feed.table)?;

    let chunks = FrameChunks::new(table.chunks(config.chunk_size)?);
    for (index, chunk) in chunks.enumerate() {
        log::debug!("Running {} query for chunk {}", feed.table, index + 1);
        let groups = chunk?;

        log::debug!("Parsing image chunk {} ({} frames)", index + 1, groups.len());
        for group in &groups {
            let frame = render_group(group, config)?;
            sink.write_frame(&group.frame, &frame)?;
        }
        sink.flush_chunk()?;
    }

    Ok(sink.written())
}

/// Encodes a feed into one segment per chunk. Returns the segments in order.
pub fn generate_videos(
    conn: &Connection,
    output_dir: &Path,
    feed: &FeedSelection,
    config: &ExtractorConfig,
) -> Result<Vec<VideoSegment>> {
    let table = FeedTable::new(conn, &feed.table, feed.include_bbs)?;
    let mut sink = VideoSink::create(
        &output_dir.join(&feed.table),
        &feed.table,
        VideoSettings::from_config(config),
    )?;

    let chunks = FrameChunks::new(table.chunks(config.chunk_size)?);
    for (index, chunk) in chunks.enumerate() {
        log::debug!("Running {} query for chunk {}", feed.table, index + 1);
        let groups = chunk?;

        for group in &groups {
            let frame = render_group(group, config)?;
            sink.write_frame(&group.frame, &frame)?;
        }
        if let Some(segment) = sink.end_chunk()? {
            log::info!("Wrote {} frames to {}", segment.frames, segment.path.display());
        }
    }

    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fixtures;
    use crate::shared::config::{FeedConfig, Scalar, Trial};
    use rusqlite::Connection;

    fn config(root: &Path, chunk_size: usize) -> ExtractorConfig {
        let mut config = ExtractorConfig::from_yaml(&format!(
            "database_path: {}\nvideo_fourcc: MJPG\nvideo_extension: avi\n",
            root.display()
        ))
        .unwrap();
        config.chunk_size = chunk_size;
        config
    }

    /// 16x16 mono feed with `frames` frames, written to the trial's database path.
    fn write_trial_database(path: &Path, frames: i64) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let conn = Connection::open(path).unwrap();
        fixtures::create_feed_table(&conn, "hl2_vlc");
        for i in 1..=frames {
            fixtures::insert_frame(
                &conn,
                "hl2_vlc",
                i,
                &fixtures::frame_timestamp(i),
                16,
                16,
                "mono8",
                &[i as u8; 256],
            );
        }
        fixtures::add_annotation(&conn, "hl2_vlc", 2, "cdu", &[(0, 0), (0, 1)]);
    }

    #[test]
    fn render_group_draws_annotation_colors() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), 10);
        config.component_color = Some([("cdu".to_string(), [1, 2, 3])].into_iter().collect());

        let conn = fixtures::feed_database("hl2_rgb", 1);
        fixtures::add_annotation(&conn, "hl2_rgb", 1, "cdu", &[(1, 0)]);
        let table = FeedTable::new(&conn, "hl2_rgb", true).unwrap();
        let groups = FrameGroup::group(table.read_window(0, 10).unwrap());

        let frame = render_group(&groups[0], &config).unwrap();
        assert_eq!(frame.pixel(1, 0), [1, 2, 3]);
        assert_eq!(frame.pixel(0, 0), [10, 10, 10]);
    }

    #[test]
    fn unknown_component_color_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), 10);
        config.component_color = Some(Default::default());

        let conn = fixtures::feed_database("hl2_rgb", 1);
        fixtures::add_annotation(&conn, "hl2_rgb", 1, "cdu", &[(0, 0)]);
        let table = FeedTable::new(&conn, "hl2_rgb", true).unwrap();
        let groups = FrameGroup::group(table.read_window(0, 10).unwrap());
        assert!(render_group(&groups[0], &config).is_err());
    }

    #[test]
    fn extracts_images_and_videos_for_a_trial() {
        let dir = tempfile::tempdir().unwrap();
        let trial = Trial(Scalar::Text("0293".into()), Scalar::Int(11));
        write_trial_database(&trial.database_file(dir.path()), 5);

        let mut config = config(dir.path(), 2);
        config.trial_list = vec![trial.clone()];
        config.feeds.insert(
            "hl2_vlc".into(),
            FeedConfig {
                extract_images: true,
                extract_video: true,
                include_bbs: true,
            },
        );

        run(&config).unwrap();

        let feed_dir = trial.output_dir(dir.path()).join("hl2_vlc");
        let pngs = std::fs::read_dir(feed_dir.join("images"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |x| x == "png"))
            .count();
        assert_eq!(pngs, 5);

        let image_log = std::fs::read_to_string(feed_dir.join("images/hl2_vlc_timecodes.txt")).unwrap();
        assert_eq!(image_log.lines().filter(|l| l.starts_with("file ")).count(), 5);
        assert_eq!(image_log.lines().filter(|l| l.starts_with("duration ")).count(), 4);

        // 5 joined rows in windows of 2 -> 3 segments
        assert!(feed_dir.join("videos/hl2_vlc_1.avi").exists());
        assert!(feed_dir.join("videos/hl2_vlc_3.avi").exists());
        assert!(feed_dir.join("hl2_vlc.avi").exists());
        let ms_log = std::fs::read_to_string(feed_dir.join("hl2_vlc_timecodes.txt")).unwrap();
        assert_eq!(ms_log.lines().count(), 5);
        assert_eq!(ms_log.lines().next(), Some("0.0"));
    }

    #[test]
    fn missing_database_skips_trial() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), 2);
        config.trial_list = vec![Trial(Scalar::Text("9999".into()), Scalar::Int(1))];
        config.feeds.insert(
            "hl2_vlc".into(),
            FeedConfig {
                extract_images: true,
                ..Default::default()
            },
        );
        run(&config).unwrap();
        assert!(!dir.path().join("9999").exists());
    }

    #[test]
    fn trial_with_nothing_to_extract_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let trial = Trial(Scalar::Text("0293".into()), Scalar::Int(11));
        write_trial_database(&trial.database_file(dir.path()), 2);

        let mut config = config(dir.path(), 2);
        config.trial_list = vec![trial.clone()];
        config.feeds.insert("hl2_vlc".into(), FeedConfig::default());

        run(&config).unwrap();
        assert!(!trial.output_dir(dir.path()).join("hl2_vlc").exists());
        assert!(!trial.output_dir(dir.path()).exists());
    }
}
