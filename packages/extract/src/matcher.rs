//! Label node lookup.
//!
//! Finds the element whose text starts with (or equals) a known label
//! inside a scope. Candidate elements are tried tag group by tag group;
//! within a group the first match in document order wins and is then
//! narrowed to its innermost matching descendant, so a wrapper `div` whose
//! text happens to begin with the label gives way to the `label` or `span`
//! that actually carries it.

use scraper::ElementRef;

use crate::dom::{descendant_elements, tag_name, text_of};
use crate::normalize::{equals_label, starts_with_label};

/// Candidate tag groups in priority order.
const CANDIDATE_GROUPS: &[&[&str]] = &[
    &["th"],
    &["td"],
    &["dt"],
    &["label", "div", "span", "p", "li", "b", "strong"],
];

/// How node text is compared against a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Node text begins with the label. Panel labels often carry trailing
    /// hints ("Логин PPPoE (латиница)").
    Prefix,
    /// Node text equals the label.
    Exact,
}

impl MatchMode {
    /// Compares `text` with `label` after whitespace collapse and letter
    /// folding.
    #[must_use]
    pub fn matches(self, text: &str, label: &str) -> bool {
        match self {
            Self::Prefix => starts_with_label(text, label),
            Self::Exact => equals_label(text, label),
        }
    }
}

/// Finds the node carrying `label` within `scope`.
#[must_use]
pub fn find_label_node<'a>(
    scope: ElementRef<'a>,
    label: &str,
    mode: MatchMode,
) -> Option<ElementRef<'a>> {
    CANDIDATE_GROUPS.iter().find_map(|tags| {
        descendant_elements(scope)
            .find(|e| is_candidate(*e, tags, label, mode))
            .map(|e| innermost(e, tags, label, mode))
    })
}

fn is_candidate(el: ElementRef<'_>, tags: &[&str], label: &str, mode: MatchMode) -> bool {
    tags.contains(&tag_name(el)) && mode.matches(&text_of(el), label)
}

fn innermost<'a>(
    mut el: ElementRef<'a>,
    tags: &[&str],
    label: &str,
    mode: MatchMode,
) -> ElementRef<'a> {
    while let Some(inner) = descendant_elements(el).find(|e| is_candidate(*e, tags, label, mode)) {
        el = inner;
    }
    el
}
