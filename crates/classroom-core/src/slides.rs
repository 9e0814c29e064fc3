//! Turns a lesson document into the ordered slide deck shown in class.
//!
//! The transform is total: missing optional content degrades to empty slides
//! or suppressed slides, never to an error.

use crate::lesson::{LessonDocument, QuizQuestion, Section};
use crate::text_utils;
use serde::Serialize;
use tracing::debug;

/// Upper bound on questions placed on a quiz slide.
pub const MAX_QUIZ_QUESTIONS: usize = 5;
/// Upper bound on conversation-point slides in a quick lesson.
pub const MAX_CONVERSATION_POINTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slide {
    Title {
        title: String,
        subtitle: String,
    },
    Content {
        title: String,
        text: String,
        support_questions: Vec<String>,
    },
    ReadingCompact {
        title: String,
        text: String,
        vocabulary: String,
        illustration: Option<String>,
    },
    Quiz {
        title: String,
        questions: Vec<QuizQuestion>,
    },
    ConversationPoint {
        ordinal: usize,
        text: String,
        support_questions: Vec<String>,
    },
}

impl Slide {
    pub fn kind(&self) -> &'static str {
        match self {
            Slide::Title { .. } => "title",
            Slide::Content { .. } => "content",
            Slide::ReadingCompact { .. } => "reading_compact",
            Slide::Quiz { .. } => "quiz",
            Slide::ConversationPoint { .. } => "conversation_point",
        }
    }

    pub fn heading(&self) -> &str {
        match self {
            Slide::Title { title, .. }
            | Slide::Content { title, .. }
            | Slide::ReadingCompact { title, .. }
            | Slide::Quiz { title, .. } => title.as_str(),
            Slide::ConversationPoint { .. } => "Conversation Point",
        }
    }

    /// Text that can be narrated on this slide, if any.
    pub fn narration_text(&self) -> Option<&str> {
        let text = match self {
            Slide::ReadingCompact { text, .. }
            | Slide::Content { text, .. }
            | Slide::ConversationPoint { text, .. } => text.as_str(),
            Slide::Title { .. } | Slide::Quiz { .. } => return None,
        };
        let trimmed = text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn support_questions(&self) -> &[String] {
        match self {
            Slide::Content {
                support_questions, ..
            }
            | Slide::ConversationPoint {
                support_questions, ..
            } => support_questions,
            _ => &[],
        }
    }

    pub fn quiz_questions(&self) -> &[QuizQuestion] {
        match self {
            Slide::Quiz { questions, .. } => questions,
            _ => &[],
        }
    }

    /// Headwords highlighted in the reading passage.
    pub fn vocabulary_headwords(&self) -> Vec<String> {
        match self {
            Slide::ReadingCompact { vocabulary, .. } => {
                text_utils::vocabulary_headwords(vocabulary)
            }
            _ => Vec::new(),
        }
    }
}

/// Build the slide deck for a lesson document.
pub fn build_deck(lesson: &LessonDocument) -> Vec<Slide> {
    let slides = if lesson.is_quick_lesson {
        build_quick_deck(lesson)
    } else {
        build_standard_deck(lesson)
    };
    debug!(
        id = %lesson.id,
        quick = lesson.is_quick_lesson,
        slide_count = slides.len(),
        "Built slide deck"
    );
    slides
}

fn build_quick_deck(lesson: &LessonDocument) -> Vec<Slide> {
    let mut slides = Vec::new();

    let reading = lesson.sections.first();
    let (text, vocabulary) = reading
        .map(|section| text_utils::split_reading(&section.student_content))
        .unwrap_or_default();
    let title = reading
        .map(|section| text_utils::clean_title(&section.title))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| text_utils::clean_title(&lesson.title));
    slides.push(Slide::ReadingCompact {
        title,
        text,
        vocabulary,
        illustration: lesson.illustration_image.clone(),
    });

    if let Some(quiz) = quiz_slide(&lesson.quiz, "Knowledge Test") {
        slides.push(quiz);
    }

    slides.extend(
        lesson
            .sections
            .iter()
            .skip(1)
            .take(MAX_CONVERSATION_POINTS)
            .enumerate()
            .map(|(idx, section)| Slide::ConversationPoint {
                ordinal: idx + 1,
                text: text_utils::normalize_line_breaks(&section.student_content)
                    .trim()
                    .to_string(),
                support_questions: support_questions(section),
            }),
    );
    slides
}

fn build_standard_deck(lesson: &LessonDocument) -> Vec<Slide> {
    let mut slides = Vec::with_capacity(lesson.sections.len() + 2);
    slides.push(Slide::Title {
        title: text_utils::clean_title(&lesson.title),
        subtitle: format!("{} Class", lesson.level),
    });
    slides.extend(lesson.sections.iter().map(|section| Slide::Content {
        title: text_utils::clean_title(&section.title),
        text: text_utils::normalize_line_breaks(&section.student_content)
            .trim()
            .to_string(),
        support_questions: support_questions(section),
    }));
    if let Some(quiz) = quiz_slide(&lesson.quiz, "Review Quiz") {
        slides.push(quiz);
    }
    slides
}

fn quiz_slide(quiz: &[QuizQuestion], title: &str) -> Option<Slide> {
    if quiz.is_empty() {
        return None;
    }
    Some(Slide::Quiz {
        title: title.to_string(),
        questions: quiz.iter().take(MAX_QUIZ_QUESTIONS).cloned().collect(),
    })
}

fn support_questions(section: &Section) -> Vec<String> {
    section
        .background_questions
        .iter()
        .map(|question| question.trim())
        .filter(|question| !question.is_empty())
        .map(str::to_string)
        .collect()
}
