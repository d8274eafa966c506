//! Structured field reading for the two page shapes of the portal.
//!
//! [`FieldReader::read_main_field`] reads the request-detail page, where
//! labels sit in table cells or block elements with exact text.
//! [`FieldReader::read_panel_field`] reads the active tab panel, where
//! labels are matched by prefix and values usually live in form controls.
//! Both return the sentinel instead of failing.

use portal_scrape_extract_models::FieldValue;
use scraper::ElementRef;

use crate::config::ExtractConfig;
use crate::locator::{LocateContext, ValueLocator};
use crate::matcher::{MatchMode, find_label_node};
use crate::normalize::{Normalizer, strip_label};
use crate::session::Page;

/// Reads labeled values using a fixed normalizer and strategy chains.
#[derive(Debug)]
pub struct FieldReader {
    normalizer: Normalizer,
    panel: ValueLocator,
    main: ValueLocator,
}

impl FieldReader {
    /// Builds a reader with the default strategy chains.
    #[must_use]
    pub fn new(config: &ExtractConfig) -> Self {
        Self::with_locators(
            Normalizer::new(config),
            ValueLocator::panel(),
            ValueLocator::main_page(),
        )
    }

    /// Builds a reader with custom strategy chains.
    #[must_use]
    pub const fn with_locators(
        normalizer: Normalizer,
        panel: ValueLocator,
        main: ValueLocator,
    ) -> Self {
        Self {
            normalizer,
            panel,
            main,
        }
    }

    /// Reads `label` from the whole request-detail page, dropping a
    /// repeated label from the front of the value.
    #[must_use]
    pub fn read_main_field(&self, page: &Page, label: &str) -> FieldValue {
        let ctx = LocateContext::new(page.whole(), label, None, &self.normalizer);
        let value = self.main.locate(&ctx);

        match value.value() {
            Some(found) => strip_label(label, found),
            None => {
                log::debug!("[main] no value for '{label}'");
                value
            }
        }
    }

    /// Reads `label` from a tab panel.
    #[must_use]
    pub fn read_panel_field(&self, panel: ElementRef<'_>, label: &str) -> FieldValue {
        let Some(node) = find_label_node(panel, label, MatchMode::Prefix) else {
            log::debug!("[panel] label '{label}' not found");
            return FieldValue::unknown();
        };

        let value = self
            .panel
            .locate(&LocateContext::new(panel, label, Some(node), &self.normalizer));
        if value.is_unknown() {
            log::debug!("[panel] no value for '{label}'");
        }
        value
    }
}
