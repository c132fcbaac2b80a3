use serde::{Deserialize, Serialize};

use crate::logging::{LogLevel, send_log};

/// Severity level used by rig notes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    /// No usable skeleton, or one that consumers may refuse to render.
    Fatal,
    Warning,
    Info,
}

/// A single structured observation recorded while building or evaluating a rig.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl Note {
    pub fn fatal(code: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, code, message)
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn info(code: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    fn new(severity: Severity, code: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Ordered note collector. Every note is logged when it is recorded.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Notes(Vec<Note>);

impl Notes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, note: Note) {
        send_log(
            LogLevel::from(note.severity),
            &format!("[{}] {}", note.code, note.message),
        );
        self.0.push(note);
    }

    /// Append notes that were already logged by another collector.
    pub fn append(&mut self, other: Notes) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.0.iter().any(|note| note.severity == Severity::Fatal)
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.0.iter().any(|note| note.code == code)
    }

    pub fn count_code(&self, code: &str) -> usize {
        self.0.iter().filter(|note| note.code == code).count()
    }
}

impl<'a> IntoIterator for &'a Notes {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_warning_and_fatal_when_collecting_then_fatal_is_detected() {
        let mut notes = Notes::new();
        notes.push(Note::warning("JOINT_NAME_COLLISION", "renamed"));
        assert!(!notes.has_fatal());

        notes.push(Note::fatal("TOO_MANY_JOINTS", "over limit"));
        assert!(notes.has_fatal());
        assert_eq!(notes.len(), 2);
        assert_eq!(notes.count_code("JOINT_NAME_COLLISION"), 1);
    }

    #[test]
    fn given_notes_when_serialized_then_output_is_a_plain_array() {
        let mut notes = Notes::new();
        notes.push(Note::info("JOINT_RENAMED", "Hand -> Hand_1"));

        let json = serde_json::to_value(&notes).expect("serialize notes");
        assert_eq!(json[0]["severity"], "Info");
        assert_eq!(json[0]["code"], "JOINT_RENAMED");
    }
}
