//! Lessons to confirm and the sources that supply them.
//!
//! Calendar integration lives outside this repository. Lessons reach the bot
//! through a [`LessonSource`]; the bundled [`JsonLessonSource`] reads a file
//! exported from the calendar, with either a ready-made duration or the raw
//! start/end timestamps of each event.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{CoreError, Result};

/// A lesson awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    /// Student name (the calendar event summary).
    pub subject: String,
    /// Human readable length, e.g. `1h 30min`.
    pub duration: String,
}

impl Lesson {
    pub fn new(subject: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            duration: duration.into(),
        }
    }
}

/// Supplies the ordered list of lessons for one confirmation run.
pub trait LessonSource {
    fn lessons(&self) -> Result<Vec<Lesson>>;
}

/// Lessons given directly (e.g. from command-line flags) sharing one duration.
#[derive(Debug, Clone)]
pub struct StaticLessonSource {
    subjects: Vec<String>,
    duration: String,
}

impl StaticLessonSource {
    pub fn new(subjects: Vec<String>, duration: impl Into<String>) -> Self {
        Self {
            subjects,
            duration: duration.into(),
        }
    }
}

impl LessonSource for StaticLessonSource {
    fn lessons(&self) -> Result<Vec<Lesson>> {
        Ok(self
            .subjects
            .iter()
            .map(|s| Lesson::new(s.as_str(), self.duration.as_str()))
            .collect())
    }
}

/// One entry of a lessons file.
#[derive(Debug, Deserialize)]
struct LessonEntry {
    subject: String,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
}

impl LessonEntry {
    fn into_lesson(self) -> Result<Lesson> {
        if let Some(duration) = self.duration {
            return Ok(Lesson::new(self.subject, duration));
        }
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                let duration = format_duration(&start, &end)?;
                Ok(Lesson::new(self.subject, duration))
            }
            _ => Err(CoreError::MissingDuration(self.subject)),
        }
    }
}

/// Reads lessons from a JSON array file.
///
/// ```json
/// [
///   {"subject": "Giovanni", "start": "2026-10-19T15:00:00+02:00", "end": "2026-10-19T16:30:00+02:00"},
///   {"subject": "Anna", "duration": "1h"}
/// ]
/// ```
#[derive(Debug, Clone)]
pub struct JsonLessonSource {
    path: PathBuf,
}

impl JsonLessonSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl LessonSource for JsonLessonSource {
    fn lessons(&self) -> Result<Vec<Lesson>> {
        let content = std::fs::read_to_string(&self.path)?;
        let entries: Vec<LessonEntry> = serde_json::from_str(&content)?;
        let lessons = entries
            .into_iter()
            .map(LessonEntry::into_lesson)
            .collect::<Result<Vec<_>>>()?;
        info!(count = lessons.len(), path = %self.path.display(), "Loaded lessons");
        Ok(lessons)
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|source| CoreError::InvalidTimestamp {
        value: value.to_string(),
        source,
    })
}

/// Render the length between two RFC 3339 timestamps as `1h 30min`, `2h` or `45min`.
pub fn format_duration(start: &str, end: &str) -> Result<String> {
    let start_dt = parse_timestamp(start)?;
    let end_dt = parse_timestamp(end)?;

    let seconds = (end_dt - start_dt).num_seconds();
    if seconds < 0 {
        return Err(CoreError::NegativeDuration {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    debug!(hours, minutes, "Computed lesson duration");

    Ok(match (hours, minutes) {
        (h, m) if h > 0 && m > 0 => format!("{}h {}min", h, m),
        (h, _) if h > 0 => format!("{}h", h),
        (_, m) => format!("{}min", m),
    })
}

/// Render the wall-clock span of a lesson, e.g. `from 15:00 to 16:30`.
pub fn format_time_range(start: &str, end: &str) -> Result<String> {
    let start_dt = parse_timestamp(start)?;
    let end_dt = parse_timestamp(end)?;
    Ok(format!(
        "from {} to {}",
        start_dt.format("%H:%M"),
        end_dt.format("%H:%M")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_duration_hours_and_minutes() {
        let d = format_duration("2026-10-19T15:00:00+02:00", "2026-10-19T16:30:00+02:00").unwrap();
        assert_eq!(d, "1h 30min");
    }

    #[test]
    fn test_format_duration_whole_hours() {
        let d = format_duration("2026-10-19T15:00:00Z", "2026-10-19T17:00:00Z").unwrap();
        assert_eq!(d, "2h");
    }

    #[test]
    fn test_format_duration_minutes_only() {
        let d = format_duration("2026-10-19T15:00:00Z", "2026-10-19T15:45:00Z").unwrap();
        assert_eq!(d, "45min");
    }

    #[test]
    fn test_format_duration_rejects_reversed() {
        let err = format_duration("2026-10-19T16:00:00Z", "2026-10-19T15:00:00Z").unwrap_err();
        assert!(matches!(err, CoreError::NegativeDuration { .. }));
    }

    #[test]
    fn test_format_duration_rejects_garbage() {
        let err = format_duration("yesterday", "2026-10-19T15:00:00Z").unwrap_err();
        assert!(matches!(err, CoreError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_format_time_range() {
        let r = format_time_range("2026-10-19T15:00:00+02:00", "2026-10-19T16:30:00+02:00").unwrap();
        assert_eq!(r, "from 15:00 to 16:30");
    }

    #[test]
    fn test_static_source_shares_duration() {
        let source = StaticLessonSource::new(vec!["A".to_string(), "B".to_string()], "1h");
        let lessons = source.lessons().unwrap();
        assert_eq!(lessons, vec![Lesson::new("A", "1h"), Lesson::new("B", "1h")]);
    }

    #[test]
    fn test_json_source_mixed_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"subject": "Giovanni", "start": "2026-10-19T15:00:00+02:00", "end": "2026-10-19T16:30:00+02:00"}},
                {{"subject": "Anna", "duration": "1h"}}
            ]"#
        )
        .unwrap();

        let lessons = JsonLessonSource::new(file.path()).lessons().unwrap();
        assert_eq!(
            lessons,
            vec![Lesson::new("Giovanni", "1h 30min"), Lesson::new("Anna", "1h")]
        );
    }

    #[test]
    fn test_json_source_missing_duration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"subject": "Luca"}}]"#).unwrap();

        let err = JsonLessonSource::new(file.path()).lessons().unwrap_err();
        assert!(matches!(err, CoreError::MissingDuration(ref s) if s == "Luca"));
    }
}
