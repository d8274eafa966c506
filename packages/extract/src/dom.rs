//! Small tree-walking helpers over [`scraper`] element references.
//!
//! These mirror the handful of axis queries the readers need (children,
//! following siblings, ancestors, document order) without building CSS
//! selectors from page- or label-derived strings.

use scraper::ElementRef;

/// Form controls whose current value stands in for a label's value.
const CONTROL_TAGS: &[&str] = &["input", "textarea", "select"];

/// Concatenated text content of `el`, like the DOM `textContent`.
#[must_use]
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Trimmed, non-empty text pieces of `el` joined by single spaces.
#[must_use]
pub fn spaced_text_of(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase tag name of `el`.
#[must_use]
pub fn tag_name<'a>(el: ElementRef<'a>) -> &'a str {
    el.value().name()
}

/// Returns `true` if `el` is an `input`, `textarea` or `select`.
#[must_use]
pub fn is_control(el: ElementRef<'_>) -> bool {
    CONTROL_TAGS.contains(&tag_name(el))
}

/// Returns `true` if the `class` attribute of `el` contains `needle` as a
/// substring.
#[must_use]
pub fn class_contains(el: ElementRef<'_>, needle: &str) -> bool {
    el.value().attr("class").is_some_and(|c| c.contains(needle))
}

/// Current value of a form control.
///
/// A `select` yields the text of its selected option (the first option if
/// none is marked), never the raw `value` attribute. An `input` yields its
/// `value` attribute, falling back to its text. A `textarea` yields its
/// content. Anything else yields its spaced text.
#[must_use]
pub fn control_value(el: ElementRef<'_>) -> String {
    match tag_name(el) {
        "select" => selected_option(el).map(text_of).unwrap_or_default(),
        "input" => match el.value().attr("value") {
            Some(v) if !v.trim().is_empty() => v.to_owned(),
            _ => text_of(el),
        },
        "textarea" => text_of(el),
        _ => spaced_text_of(el),
    }
}

/// The option a browser would report as selected.
fn selected_option(select: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut first = None;
    for option in descendant_elements(select).filter(|e| tag_name(*e) == "option") {
        if option.value().attr("selected").is_some() {
            return Some(option);
        }
        first.get_or_insert(option);
    }
    first
}

/// Element descendants of `scope` in document order, excluding `scope`.
pub fn descendant_elements<'a>(scope: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    scope.descendants().skip(1).filter_map(ElementRef::wrap)
}

/// Element children of `el`.
pub fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Element siblings after `el`, nearest first.
pub fn following_sibling_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.next_siblings().filter_map(ElementRef::wrap)
}

/// Element ancestors of `el`, nearest first.
pub fn ancestor_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.ancestors().filter_map(ElementRef::wrap)
}

/// Returns `true` if `node` is `container` or lies inside it.
#[must_use]
pub fn is_within(node: ElementRef<'_>, container: ElementRef<'_>) -> bool {
    node.id() == container.id() || node.ancestors().any(|a| a.id() == container.id())
}

/// Elements of `scope` that come after `el` in document order, skipping
/// `el`'s own descendants.
pub fn following_elements<'a>(
    scope: ElementRef<'a>,
    el: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> {
    descendant_elements(scope)
        .skip_while(move |e| e.id() != el.id())
        .skip(1)
        .filter(move |e| !is_within(*e, el))
}

/// First element in `scope` whose `id` attribute equals `id`.
#[must_use]
pub fn find_by_id<'a>(scope: ElementRef<'a>, id: &str) -> Option<ElementRef<'a>> {
    descendant_elements(scope).find(|e| e.value().id() == Some(id))
}
