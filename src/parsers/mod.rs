pub mod gaze;
pub mod metadata;
pub mod perception;
pub mod reasoning;
