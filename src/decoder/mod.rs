pub mod frame_data;
pub mod raw;
pub mod video;

pub use frame_data::{BoundingAnnotation, DecodedFrame, FrameGroup, FrameRow, JoinedRow};
pub use raw::decode_frame;
pub use video::VideoReader;
