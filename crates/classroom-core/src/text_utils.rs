//! Text helpers shared by the slide builder and the presenter view.

use once_cell::sync::Lazy;
use regex::Regex;

/// Separates the reading passage from its vocabulary listing.
pub const VOCAB_DELIMITER: &str = "||VOCAB||";

static RE_LEADING_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(reading|leitura|text|texto)\s*:\s*").unwrap());
static RE_BREAK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static RE_LIST_NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s*").unwrap());
static RE_WORD_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.,/#!$%^&*;:{}=\-_`~()]").unwrap());

/// Strip a leading label such as `Reading:` from a slide title.
pub fn clean_title(title: &str) -> String {
    RE_LEADING_LABEL.replace(title, "").trim().to_string()
}

/// Turn literal `\n` escapes and `<br>` tags into real line breaks.
pub fn normalize_line_breaks(content: &str) -> String {
    let unescaped = content.replace("\\n", "\n");
    RE_BREAK_TAG.replace_all(&unescaped, "\n").into_owned()
}

/// Split student content into `(reading text, vocabulary listing)`.
pub fn split_reading(content: &str) -> (String, String) {
    let normalized = normalize_line_breaks(content);
    match normalized.split_once(VOCAB_DELIMITER) {
        Some((text, vocab)) => {
            // Anything after a second delimiter still belongs to the listing.
            (text.trim().to_string(), vocab.replace(VOCAB_DELIMITER, "\n").trim().to_string())
        }
        None => (normalized.trim().to_string(), String::new()),
    }
}

/// Headwords from a vocabulary listing, one per non-blank line.
///
/// `1. journey - a long trip` yields `journey`.
pub fn vocabulary_headwords(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let head = line.split(['-', ':']).next().unwrap_or_default();
            let word = RE_LIST_NUMBERING.replace(head.trim(), "").trim().to_string();
            (!word.is_empty()).then_some(word)
        })
        .collect()
}

/// Strip punctuation from a clicked token; `None` when nothing is left.
pub fn clean_word(token: &str) -> Option<String> {
    let cleaned = RE_WORD_PUNCTUATION.replace_all(token, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Render a playback position as `m:ss`.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_reading_label_from_titles() {
        assert_eq!(clean_title("Reading: A Day at the Market"), "A Day at the Market");
        assert_eq!(clean_title("  reading :Lost Keys"), "Lost Keys");
        assert_eq!(clean_title("Reading Club"), "Reading Club");
    }

    #[test]
    fn splits_reading_and_vocabulary_after_normalizing_breaks() {
        let (text, vocab) =
            split_reading("First line\\nSecond line<br/>Third ||VOCAB|| 1. trip - a journey<br>2) bag: luggage");
        assert_eq!(text, "First line\nSecond line\nThird");
        assert_eq!(vocab, "1. trip - a journey\n2) bag: luggage");
        assert_eq!(vocabulary_headwords(&vocab), vec!["trip", "bag"]);
    }

    #[test]
    fn content_without_delimiter_has_empty_vocabulary() {
        let (text, vocab) = split_reading("  Only text here.  ");
        assert_eq!(text, "Only text here.");
        assert!(vocab.is_empty());
    }

    #[test]
    fn cleans_clicked_words() {
        assert_eq!(clean_word("(market),").as_deref(), Some("market"));
        assert_eq!(clean_word("!!"), None);
    }

    #[test]
    fn formats_clock_readout() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(12.4), "0:12");
        assert_eq!(format_clock(125.9), "2:05");
        assert_eq!(format_clock(f64::NAN), "0:00");
    }
}
