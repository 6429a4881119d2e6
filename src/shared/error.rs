use thiserror::Error;

/// Failures while reading the capture database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid table name: {0:?}")]
    InvalidTable(String),

    #[error("Failed to open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query on table {table} failed: {source}")]
    Query {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Bounds blob for frame {image_count} has {len} bytes, not a whole number of (row, col) pairs")]
    MalformedBounds { image_count: i64, len: usize },
}

/// Failures while turning a raw sensor buffer into a pixel grid.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Frame {image_count}: buffer has {actual} bytes, expected {expected} ({rows}x{cols}x{channels})")]
    BufferLength {
        image_count: i64,
        rows: usize,
        cols: usize,
        channels: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Frame {image_count}: invalid dimensions {width}x{height}")]
    Dimensions { image_count: i64, width: i64, height: i64 },
}

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Pixel ({row}, {col}) is outside a {rows}x{cols} frame")]
    OutOfBounds { row: i64, col: i64, rows: usize, cols: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No color configured for component {0:?}")]
    MissingColor(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("Timestamp {value:?} does not match {format:?}")]
    Format { value: String, format: &'static str },

    #[error("Timestamp {0:?} cannot be placed on the reference date")]
    Date(String),
}
