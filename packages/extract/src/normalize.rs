//! Text canonicalization for scraped values and label comparison.
//!
//! Values go through [`Normalizer::normalize`]: whitespace collapse, edge
//! punctuation trim, noise-phrase removal. Labels and node texts are
//! compared through [`fold_letters`] / [`fold_caseless`], which treat `ё`
//! and `е` as the same letter. Folding is for comparison only; values
//! returned to callers keep their original characters.

use std::sync::LazyLock;

use portal_scrape_extract_models::FieldValue;
use regex::Regex;

use crate::config::ExtractConfig;

/// Regex to collapse any run of whitespace into a single space.
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Characters trimmed from both ends of a value.
const EDGE_CHARS: &[char] = &[' ', '\u{200b}', '\t', '\r', '\n', ':', ';', '–', '—'];

/// Collapses whitespace runs to single spaces and trims the ends.
#[must_use]
pub fn collapse_ws(input: &str) -> String {
    WHITESPACE_RE.replace_all(input, " ").trim().to_owned()
}

/// Maps `ё`/`Ё` onto `е`/`Е`.
///
/// Both letters encode to two UTF-8 bytes, so byte offsets in the folded
/// string are valid offsets into the original.
#[must_use]
pub fn fold_letters(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'ё' => 'е',
            'Ё' => 'Е',
            other => other,
        })
        .collect()
}

/// [`fold_letters`] plus lowercasing, for case-insensitive comparison.
#[must_use]
pub fn fold_caseless(input: &str) -> String {
    fold_letters(input).to_lowercase()
}

/// Returns `true` if `text` begins with `label` once both are
/// whitespace-collapsed and letter-folded.
#[must_use]
pub fn starts_with_label(text: &str, label: &str) -> bool {
    let label = fold_letters(&collapse_ws(label));
    !label.is_empty() && fold_letters(&collapse_ws(text)).starts_with(&label)
}

/// Returns `true` if `text` equals `label` once both are
/// whitespace-collapsed and letter-folded.
#[must_use]
pub fn equals_label(text: &str, label: &str) -> bool {
    let label = fold_letters(&collapse_ws(label));
    !label.is_empty() && fold_letters(&collapse_ws(text)) == label
}

/// Cleans raw scraped strings into [`FieldValue`]s.
///
/// Holds the compiled noise-phrase pattern, so build one per config and
/// reuse it for every field.
#[derive(Debug, Clone)]
pub struct Normalizer {
    noise: Option<Regex>,
    phrases: Vec<String>,
}

impl Normalizer {
    /// Compiles the noise-phrase denylist from `config`.
    #[must_use]
    pub fn new(config: &ExtractConfig) -> Self {
        Self::with_phrases(&config.noise_phrases)
    }

    /// Compiles an explicit noise-phrase denylist.
    #[must_use]
    pub fn with_phrases<S: AsRef<str>>(phrases: &[S]) -> Self {
        let mut phrases: Vec<String> = phrases
            .iter()
            .map(|p| collapse_ws(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        // Longest first so a phrase is never shadowed by its own prefix.
        phrases.sort_by_key(|p| std::cmp::Reverse(p.chars().count()));

        let noise = if phrases.is_empty() {
            None
        } else {
            let alternation = phrases
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            compile_noise(&format!(r"(?i)\b(?:{alternation})\b"))
        };

        Self { noise, phrases }
    }

    /// Collapses whitespace, trims edge punctuation, strips noise
    /// phrases, and returns the sentinel if nothing is left.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> FieldValue {
        let collapsed = WHITESPACE_RE.replace_all(raw, " ");
        let trimmed = collapsed.trim_matches(EDGE_CHARS);

        let Some(noise) = &self.noise else {
            return FieldValue::new(trimmed);
        };

        let stripped = noise.replace_all(trimmed, "");
        let collapsed = WHITESPACE_RE.replace_all(&stripped, " ");
        FieldValue::new(collapsed.trim_matches(EDGE_CHARS))
    }

    /// Returns `true` if `value` is exactly one of the noise phrases.
    #[must_use]
    pub fn is_noise(&self, value: &str) -> bool {
        let value = fold_caseless(&collapse_ws(value));
        self.phrases.iter().any(|p| fold_caseless(p) == value)
    }
}

/// Removes a leading repetition of `label` (optionally followed by a
/// separator) from `value`.
///
/// The comparison is case-insensitive and letter-folded, but the returned
/// text is a slice of the original `value`. If stripping would leave
/// nothing, `value` is returned unchanged.
#[must_use]
pub fn strip_label(label: &str, value: &str) -> FieldValue {
    let original = value.trim();
    if original.is_empty() {
        return FieldValue::unknown();
    }

    let label = fold_letters(label.trim());
    if label.is_empty() {
        return FieldValue::new(original);
    }

    let Ok(prefix) = Regex::new(&format!(r"(?i)^{}\s*[:\-–—]?\s*", regex::escape(&label)))
    else {
        return FieldValue::new(original);
    };

    let folded = fold_letters(original);
    match prefix.find(&folded) {
        Some(m) if !original[m.end()..].trim().is_empty() => {
            FieldValue::new(original[m.end()..].trim())
        }
        _ => FieldValue::new(original),
    }
}

/// Compiles the noise pattern; on failure the filter is off.
fn compile_noise(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("Noise phrases did not compile, noise filter disabled: {e}");
            None
        }
    }
}
