pub mod records;

pub use records::{
    ActionRecord, DetectionValue, GazeRecord, MetadataRecord, PerceptionRecord, StepRecord, Vec3,
};
