//! TutorFlow Core - shared models and collaborators for the confirmation bot.
//!
//! - **config**: State directory and file locations
//! - **lesson**: Lessons to confirm, lesson sources and duration formatting
//! - **result**: The confirmed outcome of each lesson
//! - **sink**: Where confirmed results are written

pub mod config;
pub mod error;
pub mod lesson;
pub mod result;
pub mod sink;

pub use config::{config_dir, ensure_all_dirs, env_file, results_dir, results_file, state_dir};
pub use error::{CoreError, Result};
pub use lesson::{
    format_duration, format_time_range, JsonLessonSource, Lesson, LessonSource,
    StaticLessonSource,
};
pub use result::{PaymentStatus, SessionResult};
pub use sink::{load_results, JsonlResultSink, ResultSink};
