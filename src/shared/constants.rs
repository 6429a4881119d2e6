pub const APP_NAME: &str = "ocarina-convert";

pub const ERROR_LOG_FILE: &str = "error.log";
pub const DEBUG_LOG_FILE: &str = "debug.log";

pub const DEFAULT_CONFIG_PATH: &str = "./config/config_image_extractor.yaml";
pub const DEFAULT_GAZE_OUTPUT: &str = "./eyetim.json";

// Extraction defaults
pub const DEFAULT_CHUNK_SIZE: usize = 3000;
pub const DEFAULT_RGB_FPS: f64 = 30.0;
pub const DEFAULT_VLC_FPS: f64 = 5.0;
pub const DEFAULT_FOURCC: &str = "mp4v";
pub const DEFAULT_OVERLAY_COLOR: [u8; 3] = [255, 0, 0];

/// Encoding tag of 4-channel color feeds; every other tag is single-channel.
pub const COLOR_ENCODING: &str = "bgra8";

pub const BOUNDING_BOX_SUFFIX: &str = "_bounding_boxes";
pub const IMAGES_DIR: &str = "images";
pub const VIDEOS_DIR: &str = "videos";
pub const TIMECODES_SUFFIX: &str = "_timecodes.txt";
pub const SEGMENT_EXTENSION: &str = "mp4";

pub const FRAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
pub const FRAME_TITLE_FORMAT: &str = "%Y-%m-%d_%H:%M:%S%.6f";
pub const MISSION_TIMESTAMP_FORMAT: &str = "%H:%M:%S%.f";

// Backend schema
pub const PERCEPTION_TABLE: &str = "hl2_rgb_bounding_boxes";
pub const MISSION_LOG_TABLE: &str = "ocarina_mission_log";

pub const PERCEPTION_FILE: &str = "detic:image.json";
pub const ACTIONS_FILE: &str = "egovlp:action:steps.json";
pub const STEPS_FILE: &str = "reasoning:check_status.json";
pub const METADATA_FILE: &str = "additional_metadata.json";

pub const PERCEPTION_FRAME_TYPE: u32 = 123;
pub const PERCEPTION_TARGETS: &[&str] = &["fdvcp", "mfd inboard", "mfd outboard", "cdu"];
pub const PTG_FRAME_SUFFIX: &str = "-0";
pub const NEW_STEP_STATUS: &str = "NEW";
