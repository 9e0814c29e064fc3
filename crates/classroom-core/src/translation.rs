//! Word lookups and the transient popover that shows their result.

use crate::error::TranslationError;
use crate::services::TranslationService;
use crate::text_utils;
use serde::Serialize;
use tracing::{debug, info, warn};

pub const LOADING_PLACEHOLDER: &str = "Thinking...";
pub const ERROR_PLACEHOLDER: &str = "Error";

/// The clicked word together with where it was clicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupKey {
    pub word: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum LookupState {
    Loading,
    Translated(String),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationPopover {
    pub key: LookupKey,
    pub state: LookupState,
}

impl TranslationPopover {
    pub fn display_text(&self) -> &str {
        match &self.state {
            LookupState::Loading => LOADING_PLACEHOLDER,
            LookupState::Translated(text) => text,
            LookupState::Failed => ERROR_PLACEHOLDER,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupTicket {
    id: u64,
    key: LookupKey,
}

impl LookupTicket {
    pub fn word(&self) -> &str {
        &self.key.word
    }
}

/// Holds at most one lookup; a newer click replaces the older one and the
/// older response is dropped when it arrives.
#[derive(Debug, Default)]
pub struct WordTranslationAssistant {
    next_id: u64,
    current_id: Option<u64>,
    popover: Option<TranslationPopover>,
}

impl WordTranslationAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn popover(&self) -> Option<&TranslationPopover> {
        self.popover.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.popover.as_ref().map(|popover| &popover.state),
            Some(LookupState::Loading)
        )
    }

    /// Register a click on `token` at `(x, y)` and show the loading popover.
    ///
    /// A repeat click on the word already being looked up at the same spot
    /// starts nothing; any other click replaces the pending lookup.
    pub fn begin(&mut self, token: &str, x: f64, y: f64) -> Option<LookupTicket> {
        let word = text_utils::clean_word(token)?;
        let key = LookupKey {
            word,
            x: finite_or_zero(x),
            y: finite_or_zero(y),
        };
        let pending = self
            .popover
            .as_ref()
            .filter(|popover| popover.state == LookupState::Loading);
        if let Some(previous) = pending {
            if previous.key == key {
                debug!(word = %key.word, "Lookup already pending");
                return None;
            }
            debug!(previous = %previous.key.word, "Superseding pending lookup");
        }
        self.next_id = self.next_id.wrapping_add(1);
        self.current_id = Some(self.next_id);
        self.popover = Some(TranslationPopover {
            key: key.clone(),
            state: LookupState::Loading,
        });
        debug!(word = %key.word, id = self.next_id, "Lookup started");
        Some(LookupTicket {
            id: self.next_id,
            key,
        })
    }

    /// Apply a lookup result. Returns `false` when the ticket is stale.
    pub fn complete(
        &mut self,
        ticket: LookupTicket,
        result: Result<String, TranslationError>,
    ) -> bool {
        if self.current_id != Some(ticket.id) {
            debug!(word = %ticket.key.word, id = ticket.id, "Ignoring stale translation");
            return false;
        }
        let state = match result {
            Ok(text) if !text.trim().is_empty() => {
                info!(word = %ticket.key.word, "Translation received");
                LookupState::Translated(text.trim().to_string())
            }
            Ok(_) => {
                warn!(word = %ticket.key.word, "Translation came back empty");
                LookupState::Failed
            }
            Err(err) => {
                warn!(word = %ticket.key.word, "Translation failed: {err}");
                LookupState::Failed
            }
        };
        self.current_id = None;
        self.popover = Some(TranslationPopover {
            key: ticket.key,
            state,
        });
        true
    }

    pub fn lookup_with(
        &mut self,
        service: &dyn TranslationService,
        token: &str,
        x: f64,
        y: f64,
    ) -> Option<&TranslationPopover> {
        let ticket = self.begin(token, x, y)?;
        let result = service.translate(ticket.word());
        self.complete(ticket, result);
        self.popover()
    }

    /// Hide the popover; an in-flight result for it will be ignored.
    pub fn dismiss(&mut self) {
        if self.popover.take().is_some() {
            debug!("Translation popover dismissed");
        }
        self.current_id = None;
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_click_wins_even_when_earlier_answer_arrives_last() {
        let mut assistant = WordTranslationAssistant::new();
        let apple = assistant.begin("apple", 10.0, 20.0).expect("apple");
        let banana = assistant.begin("banana,", 30.0, 40.0).expect("banana");

        let shown = assistant.popover().expect("popover");
        assert_eq!(shown.key.word, "banana");
        assert_eq!(shown.display_text(), LOADING_PLACEHOLDER);

        assert!(assistant.complete(banana, Ok("banana".to_string())));
        assert!(!assistant.complete(apple, Ok("maçã".to_string())));

        let shown = assistant.popover().expect("popover");
        assert_eq!(shown.key.word, "banana");
        assert_eq!(shown.key.x, 30.0);
        assert_eq!(shown.state, LookupState::Translated("banana".to_string()));
    }

    #[test]
    fn stale_answer_arriving_first_does_not_replace_loading() {
        let mut assistant = WordTranslationAssistant::new();
        let apple = assistant.begin("apple", 0.0, 0.0).expect("apple");
        let banana = assistant.begin("banana", 5.0, 5.0).expect("banana");
        assert!(!assistant.complete(apple, Ok("maçã".to_string())));
        assert!(assistant.is_pending());
        assert!(assistant.complete(banana, Ok("banana".to_string())));
        assert!(!assistant.is_pending());
    }

    #[test]
    fn failure_shows_error_placeholder() {
        let mut assistant = WordTranslationAssistant::new();
        let ticket = assistant.begin("house", 1.0, 1.0).expect("house");
        assert!(assistant.complete(ticket, Err(TranslationError::Transport("timeout".to_string()))));
        let shown = assistant.popover().expect("popover");
        assert_eq!(shown.state, LookupState::Failed);
        assert_eq!(shown.display_text(), ERROR_PLACEHOLDER);

        let ticket = assistant.begin("door", 1.0, 1.0).expect("door");
        assert!(assistant.complete(ticket, Ok("   ".to_string())));
        assert_eq!(assistant.popover().map(|p| p.display_text()), Some(ERROR_PLACEHOLDER));
    }

    #[test]
    fn non_finite_coordinates_still_resolve_the_lookup() {
        let mut assistant = WordTranslationAssistant::new();
        let ticket = assistant.begin("apple", f64::NAN, f64::INFINITY).expect("apple");
        assert!(assistant.complete(ticket, Ok("maçã".to_string())));
        let shown = assistant.popover().expect("popover");
        assert_eq!(shown.display_text(), "maçã");
        assert_eq!((shown.key.x, shown.key.y), (0.0, 0.0));
    }

    #[test]
    fn repeat_click_on_pending_word_starts_no_second_lookup() {
        let mut assistant = WordTranslationAssistant::new();
        let first = assistant.begin("apple", 1.0, 1.0).expect("first click");
        assert!(assistant.begin("apple.", 1.0, 1.0).is_none());
        assert!(assistant.complete(first, Ok("maçã".to_string())));

        // Once resolved, clicking the same word again asks afresh.
        assert!(assistant.begin("apple", 1.0, 1.0).is_some());
    }

    #[test]
    fn click_elsewhere_while_pending_replaces_the_lookup() {
        let mut assistant = WordTranslationAssistant::new();
        let first = assistant.begin("apple", 1.0, 1.0).expect("first click");
        let moved = assistant.begin("apple", 9.0, 1.0).expect("same word, new spot");
        let other = assistant.begin("pear", 9.0, 1.0).expect("new word");
        assert!(!assistant.complete(first, Ok("maçã".to_string())));
        assert!(!assistant.complete(moved, Ok("maçã".to_string())));
        assert!(assistant.complete(other, Ok("pera".to_string())));
        assert_eq!(assistant.popover().map(|p| p.key.word.as_str()), Some("pear"));
    }

    #[test]
    fn punctuation_only_clicks_start_nothing() {
        let mut assistant = WordTranslationAssistant::new();
        assert!(assistant.begin("--", 0.0, 0.0).is_none());
        assert!(assistant.popover().is_none());
    }

    #[test]
    fn dismissed_lookup_ignores_its_answer() {
        let mut assistant = WordTranslationAssistant::new();
        let ticket = assistant.begin("tree", 0.0, 0.0).expect("tree");
        assistant.dismiss();
        assert!(!assistant.complete(ticket, Ok("árvore".to_string())));
        assert!(assistant.popover().is_none());
    }

    #[test]
    fn lookup_with_runs_the_round_trip() {
        struct Upper;
        impl TranslationService for Upper {
            fn translate(&self, word: &str) -> Result<String, TranslationError> {
                Ok(word.to_uppercase())
            }
        }
        let mut assistant = WordTranslationAssistant::new();
        let shown = assistant.lookup_with(&Upper, "(cat)", 2.0, 3.0).expect("popover");
        assert_eq!(shown.display_text(), "CAT");
    }
}
