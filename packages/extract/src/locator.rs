//! Value lookup for a matched label.
//!
//! A [`ValueLocator`] runs an ordered chain of [`LocatorStrategy`]
//! implementations and returns the first non-sentinel value. A strategy
//! that finds nothing returns `None`; absence is never an error, only a
//! reason to try the next strategy.
//!
//! Two chains are provided:
//!
//! - [`ValueLocator::panel`] for tab panels: explicit `label[for]` binding,
//!   nearby form controls, same-row table cell, raw-markup reparse.
//! - [`ValueLocator::main_page`] for the request-detail page: following
//!   table cell, second cell of the label's row, following block sibling,
//!   raw-markup reparse of the whole page.

use std::fmt;

use portal_scrape_extract_models::FieldValue;
use scraper::{ElementRef, Html};

use crate::dom::{
    ancestor_elements, child_elements, class_contains, control_value, descendant_elements,
    find_by_id, following_elements, following_sibling_elements, is_control, is_within,
    spaced_text_of, tag_name, text_of,
};
use crate::matcher::MatchMode;
use crate::normalize::{Normalizer, collapse_ws, fold_caseless};

/// Everything a strategy may look at for one field.
#[derive(Clone, Copy)]
pub struct LocateContext<'a, 'n> {
    /// Region the lookup is restricted to.
    pub scope: ElementRef<'a>,
    /// The label text being resolved.
    pub label: &'n str,
    /// The node the label matcher found, if any.
    pub label_node: Option<ElementRef<'a>>,
    /// Nearest row-like or group-like container of `label_node` within
    /// `scope`.
    pub group: Option<ElementRef<'a>>,
    /// Cleans candidate values.
    pub normalizer: &'n Normalizer,
}

impl<'a, 'n> LocateContext<'a, 'n> {
    /// Builds a context, resolving the label node's group container.
    #[must_use]
    pub fn new(
        scope: ElementRef<'a>,
        label: &'n str,
        label_node: Option<ElementRef<'a>>,
        normalizer: &'n Normalizer,
    ) -> Self {
        Self {
            scope,
            label,
            label_node,
            group: label_node.and_then(|node| closest_group(scope, node)),
            normalizer,
        }
    }

    /// Normalizes `raw`, returning `None` for the sentinel.
    fn clean(&self, raw: &str) -> Option<FieldValue> {
        Some(self.normalizer.normalize(raw)).filter(|v| !v.is_unknown())
    }

    /// Normalizes a form control's current value.
    fn clean_control(&self, control: ElementRef<'_>) -> Option<FieldValue> {
        self.clean(&control_value(control))
    }
}

/// Nearest enclosing table row, then `form-group`, then `row` container,
/// then parent. Only ancestors up to and including `scope` are considered.
#[must_use]
pub fn closest_group<'a>(scope: ElementRef<'a>, node: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut ancestors = Vec::new();
    for ancestor in ancestor_elements(node) {
        ancestors.push(ancestor);
        if ancestor.id() == scope.id() {
            break;
        }
    }

    ancestors
        .iter()
        .find(|a| tag_name(**a) == "tr")
        .or_else(|| ancestors.iter().find(|a| class_contains(**a, "form-group")))
        .or_else(|| ancestors.iter().find(|a| class_contains(**a, "row")))
        .or_else(|| ancestors.first())
        .copied()
}

/// One technique for finding the value that belongs to a label.
pub trait LocatorStrategy: fmt::Debug + Send + Sync {
    /// Short name used in trace logs.
    fn name(&self) -> &'static str;

    /// Attempts to find the value. Returns `None` when this technique does
    /// not apply or finds nothing usable.
    fn locate(&self, ctx: &LocateContext<'_, '_>) -> Option<FieldValue>;
}

/// `label[for=id]` pointing at a control inside the scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitBinding;

impl LocatorStrategy for ExplicitBinding {
    fn name(&self) -> &'static str {
        "explicit_binding"
    }

    fn locate(&self, ctx: &LocateContext<'_, '_>) -> Option<FieldValue> {
        let target = ctx.label_node?.value().attr("for")?.trim();
        if target.is_empty() {
            return None;
        }
        ctx.clean_control(find_by_id(ctx.scope, target)?)
    }
}

/// A form control near the label: a following sibling, the next control
/// in document order, or a control nested in the label itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlProximity;

impl LocatorStrategy for ControlProximity {
    fn name(&self) -> &'static str {
        "control_proximity"
    }

    fn locate(&self, ctx: &LocateContext<'_, '_>) -> Option<FieldValue> {
        let label = ctx.label_node?;

        following_sibling_elements(label)
            .find(|e| is_control(*e))
            .and_then(|c| ctx.clean_control(c))
            .or_else(|| {
                following_elements(ctx.scope, label)
                    .find(|e| is_control(*e))
                    .and_then(|c| ctx.clean_control(c))
            })
            .or_else(|| {
                descendant_elements(label)
                    .find(|e| is_control(*e))
                    .and_then(|c| ctx.clean_control(c))
            })
    }
}

/// The first non-empty cell after the label's cell in the same table row.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupRow;

impl LocatorStrategy for GroupRow {
    fn name(&self) -> &'static str {
        "group_row"
    }

    fn locate(&self, ctx: &LocateContext<'_, '_>) -> Option<FieldValue> {
        let label = ctx.label_node?;
        let row = ctx.group.filter(|g| tag_name(*g) == "tr")?;

        let cells: Vec<ElementRef<'_>> = child_elements(row).collect();
        let label_idx = cells.iter().position(|c| is_within(label, *c))?;

        cells[label_idx + 1..].iter().find_map(|cell| {
            ctx.clean(&spaced_text_of(*cell))
                .filter(|v| !ctx.normalizer.is_noise(v.as_str()))
        })
    }
}

/// Reparses the raw markup of the label's group (or the whole scope) and
/// reads the element following the label's text node.
///
/// Catches text the live tree walk misses, such as labels split across
/// inline elements by the page's framework.
#[derive(Debug, Clone, Copy)]
pub struct RawMarkup {
    mode: MatchMode,
}

impl RawMarkup {
    /// Prefix mode compares case-insensitively and walks every following
    /// sibling of the label's parent; exact mode reads only the first.
    #[must_use]
    pub const fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    fn text_matches(&self, text: &str, label: &str) -> bool {
        match self.mode {
            MatchMode::Prefix => {
                let label = fold_caseless(&collapse_ws(label));
                !label.is_empty() && fold_caseless(&collapse_ws(text)).starts_with(&label)
            }
            MatchMode::Exact => self.mode.matches(text, label),
        }
    }
}

impl LocatorStrategy for RawMarkup {
    fn name(&self) -> &'static str {
        match self.mode {
            MatchMode::Prefix => "raw_markup_prefix",
            MatchMode::Exact => "raw_markup_exact",
        }
    }

    fn locate(&self, ctx: &LocateContext<'_, '_>) -> Option<FieldValue> {
        let source = ctx
            .group
            .filter(|g| g.id() != ctx.scope.id())
            .unwrap_or(ctx.scope);

        let reparsed = if tag_name(source) == "html" {
            Html::parse_document(&source.html())
        } else {
            Html::parse_fragment(&source.inner_html())
        };

        for node in reparsed.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            if !self.text_matches(text, ctx.label) {
                continue;
            }
            let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
                continue;
            };

            let mut siblings = following_sibling_elements(parent);
            let found = match self.mode {
                MatchMode::Prefix => siblings.find_map(|s| ctx.clean(&spaced_text_of(s))),
                MatchMode::Exact => siblings.next().and_then(|s| ctx.clean(&spaced_text_of(s))),
            };
            if found.is_some() {
                return found;
            }
        }

        None
    }
}

/// `td` whose text equals the label, then its next `td` sibling.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowingCell;

impl LocatorStrategy for FollowingCell {
    fn name(&self) -> &'static str {
        "following_cell"
    }

    fn locate(&self, ctx: &LocateContext<'_, '_>) -> Option<FieldValue> {
        descendant_elements(ctx.scope)
            .filter(|e| tag_name(*e) == "td" && MatchMode::Exact.matches(&text_of(*e), ctx.label))
            .find_map(|cell| {
                following_sibling_elements(cell)
                    .find(|s| tag_name(*s) == "td")
                    .and_then(|s| ctx.clean(&spaced_text_of(s)))
            })
    }
}

/// Table row containing a `td` equal to the label, then that row's second
/// `td`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowSecondCell;

impl LocatorStrategy for RowSecondCell {
    fn name(&self) -> &'static str {
        "row_second_cell"
    }

    fn locate(&self, ctx: &LocateContext<'_, '_>) -> Option<FieldValue> {
        descendant_elements(ctx.scope)
            .filter(|e| tag_name(*e) == "tr")
            .filter(|row| {
                child_elements(*row).any(|c| {
                    tag_name(c) == "td" && MatchMode::Exact.matches(&text_of(c), ctx.label)
                })
            })
            .find_map(|row| {
                child_elements(row)
                    .filter(|c| tag_name(*c) == "td")
                    .nth(1)
                    .and_then(|cell| ctx.clean(&spaced_text_of(cell)))
            })
    }
}

/// `div` or `span` whose text equals the label, then its next element
/// sibling.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockSibling;

impl LocatorStrategy for BlockSibling {
    fn name(&self) -> &'static str {
        "block_sibling"
    }

    fn locate(&self, ctx: &LocateContext<'_, '_>) -> Option<FieldValue> {
        descendant_elements(ctx.scope)
            .filter(|e| {
                matches!(tag_name(*e), "div" | "span")
                    && MatchMode::Exact.matches(&text_of(*e), ctx.label)
            })
            .find_map(|block| {
                following_sibling_elements(block)
                    .next()
                    .and_then(|s| ctx.clean(&spaced_text_of(s)))
            })
    }
}

/// An ordered strategy chain.
#[derive(Debug)]
pub struct ValueLocator {
    strategies: Vec<Box<dyn LocatorStrategy>>,
}

impl ValueLocator {
    /// Builds a locator from an explicit chain.
    #[must_use]
    pub fn with_strategies(strategies: Vec<Box<dyn LocatorStrategy>>) -> Self {
        Self { strategies }
    }

    /// Chain for tab panels, keyed on a matched label node.
    #[must_use]
    pub fn panel() -> Self {
        Self::with_strategies(vec![
            Box::new(ExplicitBinding),
            Box::new(ControlProximity),
            Box::new(GroupRow),
            Box::new(RawMarkup::new(MatchMode::Prefix)),
        ])
    }

    /// Chain for the request-detail page, keyed on exact label text.
    #[must_use]
    pub fn main_page() -> Self {
        Self::with_strategies(vec![
            Box::new(FollowingCell),
            Box::new(RowSecondCell),
            Box::new(BlockSibling),
            Box::new(RawMarkup::new(MatchMode::Exact)),
        ])
    }

    /// Names of the strategies in the order they are tried.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Runs the chain and returns the first value found, or the sentinel.
    #[must_use]
    pub fn locate(&self, ctx: &LocateContext<'_, '_>) -> FieldValue {
        for strategy in &self.strategies {
            if let Some(value) = strategy.locate(ctx).filter(|v| !v.is_unknown()) {
                log::trace!("[{}] resolved by {}", ctx.label, strategy.name());
                return value;
            }
            log::trace!("[{}] {} found nothing", ctx.label, strategy.name());
        }
        FieldValue::unknown()
    }
}

#[cfg(test)]
mod tests {
    use scraper::Selector;

    use super::*;
    use crate::config::ExtractConfig;
    use crate::matcher::find_label_node;

    fn normalizer() -> Normalizer {
        Normalizer::new(&ExtractConfig::default())
    }

    fn scope<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        let sel = Selector::parse(css).unwrap();
        doc.select(&sel).next().unwrap()
    }

    fn panel_value(html: &str, label: &str) -> FieldValue {
        let doc = Html::parse_document(html);
        let panel = scope(&doc, "body");
        let n = normalizer();
        let node = find_label_node(panel, label, MatchMode::Prefix);
        ValueLocator::panel().locate(&LocateContext::new(panel, label, node, &n))
    }

    fn single(strategy: &dyn LocatorStrategy, html: &str, label: &str) -> Option<FieldValue> {
        let doc = Html::parse_document(html);
        let panel = scope(&doc, "body");
        let n = normalizer();
        let node = find_label_node(panel, label, MatchMode::Prefix);
        strategy.locate(&LocateContext::new(panel, label, node, &n))
    }

    #[test]
    fn explicit_binding_reads_input() {
        let html = r#"<label for="lg">Логин PPPoE</label><div><input id="lg" value="user1"></div>"#;
        assert_eq!(single(&ExplicitBinding, html, "Логин PPPoE").unwrap(), "user1");
    }

    #[test]
    fn explicit_binding_reads_selected_option() {
        let html = r#"<label for="t">Тариф</label>
            <select id="t"><option value="1">Базовый</option><option value="2" selected>Турбо 500</option></select>"#;
        assert_eq!(single(&ExplicitBinding, html, "Тариф").unwrap(), "Турбо 500");
    }

    #[test]
    fn explicit_binding_missing_target_falls_through() {
        let html = r#"<label for="absent">Имя</label><input value="Пётр">"#;
        assert!(single(&ExplicitBinding, html, "Имя").is_none());
        assert_eq!(panel_value(html, "Имя"), "Пётр");
    }

    #[test]
    fn proximity_prefers_sibling_control() {
        let html = r#"<div><span>Отчество</span><input value="Петрович"></div><input value="другое">"#;
        assert_eq!(single(&ControlProximity, html, "Отчество").unwrap(), "Петрович");
    }

    #[test]
    fn proximity_follows_document_order() {
        let html = r#"<div><span>Имя</span></div><div><input value="Анна"></div>"#;
        assert_eq!(single(&ControlProximity, html, "Имя").unwrap(), "Анна");
    }

    #[test]
    fn proximity_empty_control_falls_through() {
        let html = r#"<div><span>Имя</span><input value=""></div>"#;
        assert!(single(&ControlProximity, html, "Имя").is_none());
    }

    #[test]
    fn proximity_skips_noise_button() {
        let html = r#"<div><span>Имя</span><input type="button" value="Обновить"></div>"#;
        assert!(single(&ControlProximity, html, "Имя").is_none());
    }

    #[test]
    fn proximity_reads_nested_control() {
        let html = r#"<label>Фамилия <input value="Сидоров"></label>"#;
        assert_eq!(single(&ControlProximity, html, "Фамилия").unwrap(), "Сидоров");
    }

    #[test]
    fn group_row_returns_cell_after_label() {
        let html = r"<table><tr><td>Фамилия</td><td> </td><td>Обновить</td><td>Иванов</td></tr></table>";
        assert_eq!(single(&GroupRow, html, "Фамилия").unwrap(), "Иванов");
    }

    #[test]
    fn group_row_ignores_cells_before_label() {
        let html = r"<table><tr><td>Петров</td><td>Фамилия</td></tr></table>";
        assert!(single(&GroupRow, html, "Фамилия").is_none());
    }

    #[test]
    fn group_row_requires_table_row() {
        let html = r#"<div class="form-group"><span>Фамилия</span><span>Иванов</span></div>"#;
        assert!(single(&GroupRow, html, "Фамилия").is_none());
    }

    #[test]
    fn raw_markup_walks_siblings() {
        let html = r#"<div class="row"><div><span>Абонентский номер</span></div><div></div><div>9001234567</div></div>"#;
        let value = single(&RawMarkup::new(MatchMode::Prefix), html, "Абонентский номер");
        assert!(value.is_none(), "label span has no siblings of its own");

        let html = r#"<div class="row"><span>Абонентский номер</span><b></b><b>9001234567</b></div>"#;
        let value = single(&RawMarkup::new(MatchMode::Prefix), html, "абонентский НОМЕР");
        assert_eq!(value.unwrap(), "9001234567");
    }

    #[test]
    fn closest_group_prefers_table_row() {
        let doc = Html::parse_document(
            r#"<div class="row"><table><tr id="r"><td><span id="l">x</span></td></tr></table></div>"#,
        );
        let body = scope(&doc, "body");
        let group = closest_group(body, scope(&doc, "#l")).unwrap();
        assert_eq!(group.value().id(), Some("r"));
    }

    #[test]
    fn closest_group_stays_in_scope() {
        let doc = Html::parse_document(
            r#"<table><tr><td><div id="panel"><span id="l">x</span></div></td></tr></table>"#,
        );
        let panel = scope(&doc, "#panel");
        let group = closest_group(panel, scope(&doc, "#l")).unwrap();
        assert_eq!(group.value().id(), Some("panel"));
    }

    #[test]
    fn panel_chain_handles_label_for() {
        let html = r#"<div class="tab-pane active"><label for="lg">Логин PPPoE</label><input id="lg" value="user1"></div>"#;
        assert_eq!(panel_value(html, "Логин PPPoE"), "user1");
    }

    #[test]
    fn panel_chain_falls_back_to_row_cells() {
        let html = r"<table><tr><th>Мобильный телефон клиента</th><td>+7 900 000-00-00</td></tr></table>";
        assert_eq!(panel_value(html, "Мобильный телефон клиента"), "+7 900 000-00-00");
    }

    #[test]
    fn panel_chain_returns_sentinel_when_nothing_found() {
        let html = r"<div><span>Отчество</span></div>";
        assert!(panel_value(html, "Отчество").is_unknown());
        assert!(panel_value(html, "Несуществующее поле").is_unknown());
    }

    #[test]
    fn main_chain_order() {
        assert_eq!(
            ValueLocator::main_page().strategy_names(),
            vec!["following_cell", "row_second_cell", "block_sibling", "raw_markup_exact"]
        );
    }

    #[test]
    fn following_cell_uses_exact_match() {
        let html = r"<table><tr><td>Номер заявки</td><td>Req123456</td></tr></table>";
        assert_eq!(single(&FollowingCell, html, "Номер заявки").unwrap(), "Req123456");
        assert!(single(&FollowingCell, html, "Номер").is_none());
    }

    #[test]
    fn row_second_cell_skips_header_cells() {
        let html = r"<table><tr><th>#</th><td>Адрес подключения</td><td>ул. Мира, 1</td></tr></table>";
        assert_eq!(
            single(&RowSecondCell, html, "Адрес подключения").unwrap(),
            "ул. Мира, 1"
        );
    }

    #[test]
    fn block_sibling_reads_next_element() {
        let html = r"<div><span>Временный пароль</span><span>Ab12Cd34</span></div>";
        assert_eq!(single(&BlockSibling, html, "Временный пароль").unwrap(), "Ab12Cd34");
    }
}
