pub mod connection;
pub mod feed_table;
pub mod mission_log;
pub mod perception;

pub use connection::open_database;
pub use feed_table::{FeedTable, FrameChunks};
