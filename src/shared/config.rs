use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use super::constants;
use super::error::ConfigError;

/// Image/video extractor configuration, loaded once and passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Root directory holding `<subject>/<subject>_<trial>.sqlite`
    pub database_path: PathBuf,
    /// (subject, trial) pairs to process, in order
    #[serde(default)]
    pub trial_list: Vec<Trial>,
    /// Per-feed extraction flags, keyed by sensor table name
    #[serde(default)]
    pub feeds: BTreeMap<String, FeedConfig>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_rgb_fps")]
    pub rgb_fps: f64,
    #[serde(default = "default_vlc_fps")]
    pub vlc_fps: f64,
    #[serde(default = "default_fourcc")]
    pub video_fourcc: String,
    /// Container extension for segments and the combined video
    #[serde(default = "default_video_extension")]
    pub video_extension: String,
    #[serde(default)]
    pub mono_axis_order: MonoAxisOrder,
    #[serde(default)]
    pub overlay_bounds: OverlayBounds,
    /// Overlay color per component label
    pub component_color: Option<HashMap<String, [u8; 3]>>,
}

fn default_chunk_size() -> usize {
    constants::DEFAULT_CHUNK_SIZE
}

fn default_rgb_fps() -> f64 {
    constants::DEFAULT_RGB_FPS
}

fn default_vlc_fps() -> f64 {
    constants::DEFAULT_VLC_FPS
}

fn default_fourcc() -> String {
    constants::DEFAULT_FOURCC.to_string()
}

fn default_video_extension() -> String {
    constants::SEGMENT_EXTENSION.to_string()
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub extract_images: bool,
    #[serde(default)]
    pub extract_video: bool,
    /// Join `<feed>_bounding_boxes` and draw the polygons
    #[serde(default)]
    pub include_bbs: bool,
}

/// Axis order used when reshaping single-channel buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonoAxisOrder {
    /// rows = width, cols = height (what existing consumers were built against)
    #[default]
    Legacy,
    /// rows = height, cols = width
    RowMajor,
}

/// What to do with overlay coordinates that fall outside the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayBounds {
    #[default]
    Reject,
    Clip,
}

/// YAML scalar that may be written as a number or a string (`0293` vs `11`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Text(v) => write!(f, "{}", v),
        }
    }
}

/// One recording session, written in YAML as `[subject_id, trial_id]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial(pub Scalar, pub Scalar);

impl Trial {
    pub fn subject_id(&self) -> String {
        self.0.to_string()
    }

    pub fn trial_id(&self) -> String {
        self.1.to_string()
    }

    pub fn database_file(&self, root: &Path) -> PathBuf {
        let subject = self.subject_id();
        root.join(&subject)
            .join(format!("{}_{}.sqlite", subject, self.trial_id()))
    }

    pub fn output_dir(&self, root: &Path) -> PathBuf {
        let subject = self.subject_id();
        root.join(&subject)
            .join("outputs")
            .join(&subject)
            .join(self.trial_id())
    }
}

impl fmt::Display for Trial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

/// A feed selected for one kind of extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSelection {
    pub table: String,
    pub include_bbs: bool,
}

impl ExtractorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&contents)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: ExtractorConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be positive".into()));
        }
        if self.rgb_fps <= 0.0 || self.vlc_fps <= 0.0 {
            return Err(ConfigError::Invalid("frame rates must be positive".into()));
        }
        if self.video_fourcc.chars().count() != 4 {
            return Err(ConfigError::Invalid(format!(
                "video_fourcc must be four characters, got {:?}",
                self.video_fourcc
            )));
        }
        Ok(())
    }

    pub fn image_feeds(&self) -> Vec<FeedSelection> {
        self.select_feeds(|feed| feed.extract_images)
    }

    pub fn video_feeds(&self) -> Vec<FeedSelection> {
        self.select_feeds(|feed| feed.extract_video)
    }

    fn select_feeds(&self, wanted: impl Fn(&FeedConfig) -> bool) -> Vec<FeedSelection> {
        self.feeds
            .iter()
            .filter(|(_, feed)| wanted(feed))
            .map(|(table, feed)| FeedSelection {
                table: table.clone(),
                include_bbs: feed.include_bbs,
            })
            .collect()
    }

    /// Overlay color for a component label.
    pub fn color_for(&self, component_id: &str) -> Result<[u8; 3], ConfigError> {
        match &self.component_color {
            None => Ok(constants::DEFAULT_OVERLAY_COLOR),
            Some(colors) => colors
                .get(component_id)
                .copied()
                .ok_or_else(|| ConfigError::MissingColor(component_id.to_string())),
        }
    }
}
