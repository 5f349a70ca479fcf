mod controller;
mod resume;

// Public API of the progression subsystem.
pub use crate::error::ProgressionError;
pub use controller::{
    AutoAdvancePreview, LessonProgressionController, LessonStatus, TextCompletion, VideoProgress,
};
pub use resume::resume_position;
