//! Lesson document schema.
//!
//! Documents arrive from storage as loosely-typed JSON. Every optional field is
//! read leniently: absent, `null`, or wrongly-typed values become empty
//! defaults instead of failing the whole document.

use anyhow::{Context, Result, bail};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Learner proficiency tier; opaque beyond display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CefrLevel {
    #[default]
    A1,
    A2,
    B1,
    B2,
    C1,
}

impl std::fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LessonDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub level: CefrLevel,
    #[serde(default, deserialize_with = "lenient_list")]
    pub sections: Vec<Section>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub quiz: Vec<QuizQuestion>,
    #[serde(default, deserialize_with = "lenient")]
    pub illustration_image: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub audio_config: Option<AudioConfig>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_quick_lesson: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub author_name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub grammar_topic: String,
    #[serde(default, deserialize_with = "lenient")]
    pub vocabulary_focus: String,
    #[serde(default, deserialize_with = "lenient")]
    pub homework: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub teacher_notes: String,
    #[serde(default, deserialize_with = "lenient")]
    pub student_content: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub background_questions: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_conversation: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(default, deserialize_with = "lenient")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub correct_index: usize,
    #[serde(default, deserialize_with = "lenient")]
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Female,
    Male,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceAccent {
    #[default]
    American,
    British,
}

/// Voice identity passed to the narration service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    #[serde(default, deserialize_with = "lenient")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub gender: VoiceGender,
    #[serde(default, deserialize_with = "lenient")]
    pub accent: VoiceAccent,
    #[serde(default, deserialize_with = "lenient")]
    pub voice_name: String,
}

impl LessonDocument {
    /// Voice to request narration with; the document's choice wins when set.
    pub fn voice_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.audio_config
            .as_ref()
            .map(|audio| audio.voice_name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(fallback)
    }
}

/// Parse a lesson document from JSON text.
pub fn parse_lesson(json: &str) -> Result<LessonDocument> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("Lesson document is not valid JSON")?;
    if !value.is_object() {
        bail!("Lesson document must be a JSON object");
    }
    serde_json::from_value(value).context("Lesson document has an unreadable shape")
}

/// Read and parse a lesson document from disk.
pub fn load_lesson(path: &Path) -> Result<LessonDocument> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Reading lesson document {}", path.display()))?;
    let lesson = parse_lesson(&data)?;
    info!(
        path = %path.display(),
        id = %lesson.id,
        sections = lesson.sections.len(),
        quiz = lesson.quiz.len(),
        quick = lesson.is_quick_lesson,
        "Loaded lesson document"
    );
    Ok(lesson)
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            warn!(
                target_type = std::any::type_name::<T>(),
                "Malformed lesson field replaced by default: {err}"
            );
            Ok(T::default())
        }
    }
}

/// Like [`lenient`], but a malformed entry only drops that entry.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => return Ok(Vec::new()),
        other => {
            warn!(
                target_type = std::any::type_name::<T>(),
                found = %other,
                "Expected a list; using an empty one"
            );
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(
                    target_type = std::any::type_name::<T>(),
                    idx,
                    "Skipping malformed list entry: {err}"
                );
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_camel_case_document() {
        let lesson = parse_lesson(
            r#"{
                "id": "l-1",
                "title": "Travel",
                "level": "B1",
                "isQuickLesson": true,
                "audioConfig": {"enabled": true, "gender": "male", "accent": "british", "voiceName": "Puck"},
                "sections": [{"title": "Reading: Airports", "studentContent": "Text", "backgroundQuestions": ["Why?"]}],
                "quiz": [{"question": "Q", "options": ["a", "b"], "correctIndex": 1, "explanation": "E"}]
            }"#,
        )
        .expect("valid lesson");

        assert_eq!(lesson.level, CefrLevel::B1);
        assert!(lesson.is_quick_lesson);
        assert_eq!(lesson.sections[0].background_questions, vec!["Why?"]);
        assert_eq!(lesson.quiz[0].correct_index, 1);
        assert_eq!(lesson.voice_name("Zephyr"), "Puck");
    }

    #[test]
    fn null_and_malformed_optional_fields_default_to_empty() {
        let lesson = parse_lesson(
            r#"{
                "title": "Loose",
                "quiz": null,
                "illustrationImage": 42,
                "audioConfig": "nope",
                "sections": [{"title": "S", "backgroundQuestions": "not a list", "isConversation": null}]
            }"#,
        )
        .expect("lenient lesson");

        assert!(lesson.quiz.is_empty());
        assert_eq!(lesson.illustration_image, None);
        assert_eq!(lesson.audio_config, None);
        assert!(lesson.sections[0].background_questions.is_empty());
        assert!(!lesson.sections[0].is_conversation);
        assert!(!lesson.is_quick_lesson);
        assert_eq!(lesson.voice_name("Zephyr"), "Zephyr");
    }

    #[test]
    fn malformed_list_entries_are_skipped_individually() {
        let lesson = parse_lesson(
            r#"{
                "sections": [{"title": "Kept"}, 3, null, {"title": "Also kept", "backgroundQuestions": ["Why?", 7]}],
                "quiz": ["nope", {"question": "Q", "options": ["a", false, "b"], "correctIndex": 1}]
            }"#,
        )
        .expect("lenient lesson");

        let titles: Vec<&str> = lesson.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Kept", "Also kept"]);
        assert_eq!(lesson.sections[1].background_questions, vec!["Why?"]);
        assert_eq!(lesson.quiz.len(), 1);
        assert_eq!(lesson.quiz[0].options, vec!["a", "b"]);
    }

    #[test]
    fn blank_voice_name_uses_fallback() {
        let lesson = LessonDocument {
            audio_config: Some(AudioConfig {
                voice_name: "   ".to_string(),
                ..AudioConfig::default()
            }),
            ..LessonDocument::default()
        };
        assert_eq!(lesson.voice_name("Kore"), "Kore");
    }

    #[test]
    fn non_object_input_is_an_error() {
        assert!(parse_lesson("[1, 2, 3]").is_err());
        assert!(parse_lesson("{ not json").is_err());
    }
}
