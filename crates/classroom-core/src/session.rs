//! Presenter session: slide navigation plus the per-slide narration,
//! translation, and quiz state layered on top of it.

use crate::audio::AudioBackend;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::error::NarrationError;
use crate::lesson::LessonDocument;
use crate::narration::{NarrationEngine, NarrationView, PlaybackStatus};
use crate::services::{NarrationService, TranslationService};
use crate::slides::{self, Slide};
use crate::translation::{TranslationPopover, WordTranslationAssistant};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const MIN_FONT_SIZE: u32 = 16;
pub const MAX_FONT_SIZE: u32 = 160;

/// Collaborators a session is wired to.
pub struct SessionServices {
    pub narration: Box<dyn NarrationService>,
    pub translation: Box<dyn TranslationService>,
    pub backend: Box<dyn AudioBackend>,
    pub clock: Box<dyn Clock>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCommand {
    Next,
    Prev,
    ToggleHints,
    IncreaseFont,
    DecreaseFont,
    PrepareNarration,
    Play,
    Pause,
    Seek(f64),
    SetRate(f64),
    Tick,
    LookupWord { token: String, x: f64, y: f64 },
    DismissTranslation,
    Answer { question: usize, option: usize },
    Close,
}

impl PresentationCommand {
    pub fn action(&self) -> &'static str {
        match self {
            PresentationCommand::Next => "next",
            PresentationCommand::Prev => "prev",
            PresentationCommand::ToggleHints => "toggle_hints",
            PresentationCommand::IncreaseFont => "increase_font",
            PresentationCommand::DecreaseFont => "decrease_font",
            PresentationCommand::PrepareNarration => "prepare_narration",
            PresentationCommand::Play => "play",
            PresentationCommand::Pause => "pause",
            PresentationCommand::Seek(_) => "seek",
            PresentationCommand::SetRate(_) => "set_rate",
            PresentationCommand::Tick => "tick",
            PresentationCommand::LookupWord { .. } => "lookup_word",
            PresentationCommand::DismissTranslation => "dismiss_translation",
            PresentationCommand::Answer { .. } => "answer",
            PresentationCommand::Close => "close",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizAnswer {
    pub selected: usize,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub question: usize,
    pub selected: usize,
    pub correct: bool,
    pub correct_index: usize,
    pub explanation: String,
    /// The question had already been answered; the earlier choice stands.
    pub already_answered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct QuizScore {
    pub correct: usize,
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresentationSnapshot {
    pub lesson_id: String,
    pub lesson_title: String,
    pub slide: Option<Slide>,
    pub index: usize,
    pub slide_count: usize,
    pub show_hints: bool,
    pub font_size: u32,
    pub narration: NarrationView,
    pub translation: Option<TranslationPopover>,
    pub quiz_answers: BTreeMap<usize, QuizAnswer>,
    pub score: QuizScore,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresentationEvent {
    pub action: String,
    pub snapshot: PresentationSnapshot,
}

pub struct PresentationSession {
    lesson: LessonDocument,
    slides: Vec<Slide>,
    current: usize,
    show_hints: bool,
    font_size: u32,
    font_step: u32,
    voice: String,
    narration: NarrationEngine,
    translator: WordTranslationAssistant,
    narration_service: Box<dyn NarrationService>,
    translation_service: Box<dyn TranslationService>,
    answers: BTreeMap<usize, QuizAnswer>,
    closed: bool,
}

impl PresentationSession {
    pub fn new(lesson: LessonDocument, config: &AppConfig, services: SessionServices) -> Self {
        let slides = slides::build_deck(&lesson);
        let base_font = if lesson.is_quick_lesson {
            config.quick_font_size
        } else {
            config.standard_font_size
        };
        let voice = lesson.voice_name(&config.default_voice).to_string();
        let narration = NarrationEngine::new(services.backend, services.clock)
            .with_rate(config.playback_rate);
        info!(
            id = %lesson.id,
            slides = slides.len(),
            quick = lesson.is_quick_lesson,
            voice = %voice,
            "Presentation session started"
        );
        Self {
            lesson,
            slides,
            current: 0,
            show_hints: false,
            font_size: base_font.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            font_step: config.font_step.max(1),
            voice,
            narration,
            translator: WordTranslationAssistant::new(),
            narration_service: services.narration,
            translation_service: services.translation,
            answers: BTreeMap::new(),
            closed: false,
        }
    }

    pub fn lesson(&self) -> &LessonDocument {
        &self.lesson
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        self.slides.get(self.current)
    }

    pub fn show_hints(&self) -> bool {
        self.show_hints
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn narration(&self) -> &NarrationEngine {
        &self.narration
    }

    pub fn translation(&self) -> Option<&TranslationPopover> {
        self.translator.popover()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Move forward one slide; returns whether the index changed.
    pub fn next(&mut self) -> bool {
        let moved = self.current + 1 < self.slides.len();
        if moved {
            self.current += 1;
        }
        self.leave_slide(moved);
        moved
    }

    /// Move back one slide; returns whether the index changed.
    pub fn prev(&mut self) -> bool {
        let moved = self.current > 0;
        if moved {
            self.current -= 1;
        }
        self.leave_slide(moved);
        moved
    }

    // Navigation always ends narration, even at the edges of the deck.
    fn leave_slide(&mut self, moved: bool) {
        self.show_hints = false;
        self.narration.teardown();
        self.translator.dismiss();
        if moved {
            info!(
                index = self.current,
                kind = self.current_slide().map(Slide::kind).unwrap_or("none"),
                "Moved to slide"
            );
        } else {
            debug!(index = self.current, "Navigation at deck boundary");
        }
    }

    pub fn toggle_hints(&mut self) -> bool {
        self.show_hints = !self.show_hints;
        self.show_hints
    }

    pub fn increase_font(&mut self) -> u32 {
        self.font_size = self
            .font_size
            .saturating_add(self.font_step)
            .min(MAX_FONT_SIZE);
        self.font_size
    }

    pub fn decrease_font(&mut self) -> u32 {
        self.font_size = self
            .font_size
            .saturating_sub(self.font_step)
            .max(MIN_FONT_SIZE);
        self.font_size
    }

    /// Request and decode narration for the current slide's text.
    pub fn prepare_narration(&mut self) -> Result<(), NarrationError> {
        let Some(text) = self
            .current_slide()
            .and_then(Slide::narration_text)
            .map(str::to_string)
        else {
            debug!(index = self.current, "Slide has nothing to narrate");
            return Ok(());
        };
        self.narration
            .prepare_with(self.narration_service.as_ref(), &text, &self.voice)
    }

    pub fn play(&mut self) -> Result<(), NarrationError> {
        self.narration.play()
    }

    pub fn pause(&mut self) {
        self.narration.pause();
    }

    pub fn seek(&mut self, seconds: f64) -> Result<(), NarrationError> {
        self.narration.seek(seconds)
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<(), NarrationError> {
        self.narration.set_rate(rate)
    }

    pub fn tick(&mut self) -> PlaybackStatus {
        self.narration.tick()
    }

    pub fn lookup_word(&mut self, token: &str, x: f64, y: f64) -> Option<&TranslationPopover> {
        self.translator
            .lookup_with(self.translation_service.as_ref(), token, x, y)
    }

    pub fn dismiss_translation(&mut self) {
        self.translator.dismiss();
    }

    /// Answer a question on the current quiz slide. The first answer to a
    /// question is final.
    pub fn answer(&mut self, question: usize, option: usize) -> Option<AnswerOutcome> {
        let item = self.current_slide()?.quiz_questions().get(question)?.clone();
        if option >= item.options.len() {
            debug!(question, option, "Ignoring out-of-range answer");
            return None;
        }
        let already_answered = self.answers.contains_key(&question);
        let answer = *self.answers.entry(question).or_insert_with(|| QuizAnswer {
            selected: option,
            correct: option == item.correct_index,
        });
        if !already_answered {
            info!(question, option, correct = answer.correct, "Quiz answered");
        }
        Some(AnswerOutcome {
            question,
            selected: answer.selected,
            correct: answer.correct,
            correct_index: item.correct_index,
            explanation: item.explanation,
            already_answered,
        })
    }

    pub fn score(&self) -> QuizScore {
        let total = self
            .slides
            .iter()
            .map(|slide| slide.quiz_questions().len())
            .sum();
        QuizScore {
            correct: self.answers.values().filter(|answer| answer.correct).count(),
            answered: self.answers.len(),
            total,
        }
    }

    pub fn snapshot(&mut self) -> PresentationSnapshot {
        let notice = self
            .narration
            .take_notice()
            .map(|err| err.notice().to_string());
        PresentationSnapshot {
            lesson_id: self.lesson.id.clone(),
            lesson_title: self.lesson.title.clone(),
            slide: self.current_slide().cloned(),
            index: self.current,
            slide_count: self.slides.len(),
            show_hints: self.show_hints,
            font_size: self.font_size,
            narration: self.narration.view(),
            translation: self.translator.popover().cloned(),
            quiz_answers: self.answers.clone(),
            score: self.score(),
            notice,
        }
    }

    pub fn apply_command(&mut self, command: PresentationCommand) -> PresentationEvent {
        let action = command.action();
        let result = match command {
            PresentationCommand::Next => {
                self.next();
                Ok(())
            }
            PresentationCommand::Prev => {
                self.prev();
                Ok(())
            }
            PresentationCommand::ToggleHints => {
                self.toggle_hints();
                Ok(())
            }
            PresentationCommand::IncreaseFont => {
                self.increase_font();
                Ok(())
            }
            PresentationCommand::DecreaseFont => {
                self.decrease_font();
                Ok(())
            }
            PresentationCommand::PrepareNarration => self.prepare_narration(),
            PresentationCommand::Play => self.play(),
            PresentationCommand::Pause => {
                self.pause();
                Ok(())
            }
            PresentationCommand::Seek(seconds) => self.seek(seconds),
            PresentationCommand::SetRate(rate) => self.set_rate(rate),
            PresentationCommand::Tick => {
                self.tick();
                Ok(())
            }
            PresentationCommand::LookupWord { token, x, y } => {
                self.lookup_word(&token, x, y);
                Ok(())
            }
            PresentationCommand::DismissTranslation => {
                self.dismiss_translation();
                Ok(())
            }
            PresentationCommand::Answer { question, option } => {
                self.answer(question, option);
                Ok(())
            }
            PresentationCommand::Close => {
                self.close();
                Ok(())
            }
        };
        if let Err(err) = result {
            debug!(action, kind = err.kind(), "Command recovered from narration failure");
        }
        PresentationEvent {
            action: action.to_string(),
            snapshot: self.snapshot(),
        }
    }

    /// End the session: stop narration and hide any popover.
    pub fn close(&mut self) {
        self.narration.teardown();
        self.translator.dismiss();
        if !self.closed {
            self.closed = true;
            info!(id = %self.lesson.id, "Presentation session closed");
        }
    }
}

impl Drop for PresentationSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{HeadlessBackend, HeadlessProbe, pcm};
    use crate::clock::ManualClock;
    use crate::error::TranslationError;
    use crate::lesson::{QuizQuestion, Section};

    struct SilentNarration;

    impl NarrationService for SilentNarration {
        fn synthesize(&self, _text: &str, _voice: &str) -> Result<String, NarrationError> {
            Ok(pcm::encode_base64_pcm16le(&vec![0.0; 24_000 * 4]))
        }
    }

    struct FailingNarration;

    impl NarrationService for FailingNarration {
        fn synthesize(&self, _text: &str, _voice: &str) -> Result<String, NarrationError> {
            Err(NarrationError::Generation("service down".to_string()))
        }
    }

    struct Echo;

    impl TranslationService for Echo {
        fn translate(&self, word: &str) -> Result<String, TranslationError> {
            Ok(format!("<{word}>"))
        }
    }

    fn lesson(quick: bool) -> LessonDocument {
        LessonDocument {
            id: "lesson-1".to_string(),
            title: "Reading: Weather".to_string(),
            is_quick_lesson: quick,
            sections: (0..3)
                .map(|i| Section {
                    title: format!("Part {i}"),
                    student_content: format!("It rains on day {i}."),
                    ..Section::default()
                })
                .collect(),
            quiz: vec![QuizQuestion {
                question: "Is it sunny?".to_string(),
                options: vec!["yes".to_string(), "no".to_string()],
                correct_index: 1,
                explanation: "It rains.".to_string(),
            }],
            ..LessonDocument::default()
        }
    }

    fn session_with(
        lesson: LessonDocument,
        narration: Box<dyn NarrationService>,
    ) -> (PresentationSession, ManualClock, HeadlessProbe) {
        let clock = ManualClock::new();
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        let session = PresentationSession::new(
            lesson,
            &AppConfig::default(),
            SessionServices {
                narration,
                translation: Box::new(Echo),
                backend: Box::new(backend),
                clock: Box::new(clock.clone()),
            },
        );
        (session, clock, probe)
    }

    fn session(quick: bool) -> (PresentationSession, ManualClock, HeadlessProbe) {
        session_with(lesson(quick), Box::new(SilentNarration))
    }

    #[test]
    fn navigation_is_clamped_without_wraparound() {
        let (mut session, _, _) = session(false);
        assert_eq!(session.slide_count(), 5);
        assert!(!session.prev());
        assert_eq!(session.current_index(), 0);
        for _ in 0..10 {
            session.next();
        }
        assert_eq!(session.current_index(), 4);
        assert_eq!(session.current_slide().map(Slide::kind), Some("quiz"));
    }

    #[test]
    fn navigating_away_always_tears_down_playing_narration() {
        let (mut session, clock, probe) = session(true);
        session.prepare_narration().expect("prepared");
        session.play().expect("playing");
        clock.advance_secs(1.0);
        assert_eq!(session.narration().status(), PlaybackStatus::Playing);

        assert!(session.next());
        assert_eq!(session.narration().status(), PlaybackStatus::Idle);
        assert!(!session.narration().is_polling());
        assert!(probe.active().is_empty());

        // Boundary moves are no-ops for the index but still stop audio.
        let (mut session, _, probe) = self::session(true);
        session.prepare_narration().expect("prepared");
        session.play().expect("playing");
        assert!(!session.prev());
        assert_eq!(session.narration().status(), PlaybackStatus::Idle);
        assert!(probe.active().is_empty());
    }

    #[test]
    fn navigation_hides_hints_and_translation() {
        let (mut session, _, _) = session(false);
        assert!(session.toggle_hints());
        session.lookup_word("rains.", 4.0, 8.0);
        assert!(session.translation().is_some());
        session.next();
        assert!(!session.show_hints());
        assert!(session.translation().is_none());
    }

    #[test]
    fn font_size_defaults_by_mode_and_stays_in_bounds() {
        let (mut quick, _, _) = session(true);
        assert_eq!(quick.font_size(), 28);
        let (mut standard, _, _) = session(false);
        assert_eq!(standard.font_size(), 24);

        for _ in 0..200 {
            quick.increase_font();
            standard.decrease_font();
        }
        assert_eq!(quick.font_size(), MAX_FONT_SIZE);
        assert_eq!(standard.font_size(), MIN_FONT_SIZE);
        assert_eq!(quick.current_index(), 0);
    }

    #[test]
    fn quiz_first_answer_is_final_and_scored() {
        let (mut session, _, _) = session(true);
        assert!(session.answer(0, 1).is_none());
        session.next();
        assert_eq!(session.current_slide().map(Slide::kind), Some("quiz"));

        assert!(session.answer(0, 5).is_none());
        let first = session.answer(0, 0).expect("answered");
        assert!(!first.correct);
        assert!(!first.already_answered);
        let second = session.answer(0, 1).expect("repeat");
        assert!(second.already_answered);
        assert_eq!(second.selected, 0);
        assert_eq!(second.explanation, "It rains.");
        assert_eq!(
            session.score(),
            QuizScore {
                correct: 0,
                answered: 1,
                total: 1
            }
        );
    }

    #[test]
    fn narration_failure_surfaces_one_shot_notice() {
        let (mut session, _, _) = session_with(lesson(true), Box::new(FailingNarration));
        let event = session.apply_command(PresentationCommand::PrepareNarration);
        assert_eq!(event.action, "prepare_narration");
        assert_eq!(event.snapshot.narration.status, PlaybackStatus::Idle);
        assert!(event.snapshot.notice.is_some());

        let event = session.apply_command(PresentationCommand::Tick);
        assert!(event.snapshot.notice.is_none());
    }

    #[test]
    fn commands_drive_playback_and_report_snapshots() {
        let (mut session, clock, _) = session(true);
        session.apply_command(PresentationCommand::PrepareNarration);
        session.apply_command(PresentationCommand::Play);
        clock.advance_secs(1.0);
        session.apply_command(PresentationCommand::SetRate(2.0));
        clock.advance_secs(1.0);
        let event = session.apply_command(PresentationCommand::Tick);
        assert_eq!(event.snapshot.narration.status, PlaybackStatus::Playing);
        assert!((event.snapshot.narration.position_secs - 3.0).abs() < 1e-6);

        clock.advance_secs(1.0);
        let event = session.apply_command(PresentationCommand::Tick);
        assert_eq!(event.snapshot.narration.status, PlaybackStatus::Ended);
        assert_eq!(event.snapshot.narration.position_label, "0:04");

        let event = session.apply_command(PresentationCommand::LookupWord {
            token: "rains".to_string(),
            x: 1.0,
            y: 2.0,
        });
        assert_eq!(
            event.snapshot.translation.map(|popover| popover.display_text().to_string()),
            Some("<rains>".to_string())
        );
    }

    #[test]
    fn snapshot_serializes_for_the_presenter_view() {
        let (mut session, _, _) = session(false);
        let event = session.apply_command(PresentationCommand::Next);
        let json = serde_json::to_value(&event).expect("serializable");
        assert_eq!(json["action"], "next");
        assert_eq!(json["snapshot"]["index"], 1);
        assert_eq!(json["snapshot"]["slide"]["kind"], "content");
        assert_eq!(json["snapshot"]["narration"]["status"], "idle");
    }

    #[test]
    fn closing_or_dropping_stops_audio() {
        let (mut session, _, probe) = session(true);
        session.prepare_narration().expect("prepared");
        session.play().expect("playing");
        session.close();
        assert!(session.is_closed());
        assert!(probe.active().is_empty());

        let (mut session, _, probe) = self::session(true);
        session.prepare_narration().expect("prepared");
        session.play().expect("playing");
        drop(session);
        assert!(probe.active().is_empty());
    }
}
