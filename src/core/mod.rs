pub mod combiner;
pub mod extractor;
pub mod image_sink;
pub mod video_sink;
