//! Page snapshots and the session interface the assembler drives.
//!
//! A [`Session`] is positioned on a record-detail page and can switch tabs.
//! Every read goes through a [`Page`], a parsed snapshot of the current
//! markup, so extraction itself never blocks on the session.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

use crate::dom::{class_contains, descendant_elements, tag_name, text_of};
use crate::normalize::collapse_ws;

/// File name of the manifest inside a captured session directory.
pub const MANIFEST_FILE: &str = "session.toml";

/// Errors raised while navigating a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No tab with the requested visible title.
    #[error("Tab not found: {title}")]
    TabNotFound { title: String },

    /// A bounded wait elapsed.
    #[error("Timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    /// Reading captured markup failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session manifest is malformed.
    #[error("Invalid session manifest: {0}")]
    Manifest(#[from] toml::de::Error),
}

/// A parsed snapshot of the current page.
#[derive(Debug, Clone)]
pub struct Page {
    html: Html,
}

impl Page {
    /// Parses a full HTML document.
    #[must_use]
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// The whole-page scope.
    #[must_use]
    pub fn whole(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// The active tab panel: the first element whose class list contains
    /// both `tab-pane` and `active`, else `<body>`, else the whole page.
    #[must_use]
    pub fn active_panel(&self) -> ElementRef<'_> {
        let root = self.whole();
        descendant_elements(root)
            .find(|e| class_contains(*e, "tab-pane") && class_contains(*e, "active"))
            .or_else(|| descendant_elements(root).find(|e| tag_name(*e) == "body"))
            .unwrap_or(root)
    }

    /// Returns `true` if the rendered text of the page contains `needle`.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        collapse_ws(&text_of(self.whole())).contains(&collapse_ws(needle))
    }

    /// Serialized markup of the whole page.
    #[must_use]
    pub fn markup(&self) -> String {
        self.html.html()
    }
}

/// A navigable, already authenticated record-detail page.
///
/// One scrape owns its session exclusively.
pub trait Session {
    /// Raw markup of the page in its current state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the page cannot be read.
    fn page_markup(&mut self) -> Result<String, SessionError>;

    /// Clicks the tab whose visible title contains `title`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TabNotFound`] or [`SessionError::Timeout`]
    /// if no such tab becomes clickable within `timeout`.
    fn activate_tab(&mut self, title: &str, timeout: Duration) -> Result<(), SessionError>;

    /// Parses the current markup into a [`Page`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the page cannot be read.
    fn snapshot(&mut self) -> Result<Page, SessionError> {
        Ok(Page::parse(&self.page_markup()?))
    }

    /// Polls the page every `poll` until its text contains `needle`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Timeout`] if `timeout` elapses first, or
    /// any error from reading the page.
    fn wait_for_text(
        &mut self,
        needle: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<(), SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.snapshot()?.contains_text(needle) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SessionError::Timeout {
                    what: format!("text '{needle}'"),
                    timeout,
                });
            }
            std::thread::sleep(poll);
        }
    }
}

/// A tab entry in a session manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabEntry {
    /// Visible tab title.
    pub title: String,
    /// Markup file, relative to the manifest.
    pub file: PathBuf,
}

/// Describes a captured session directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionManifest {
    /// Markup of the record-detail page before any tab is clicked.
    pub main: PathBuf,
    /// Markup after each tab click.
    #[serde(default)]
    pub tabs: Vec<TabEntry>,
}

/// A replayable session over captured markup.
///
/// Activating a tab switches the page to that tab's capture. Tab titles
/// match by substring, like the visible text of a tab link.
#[derive(Debug, Clone)]
pub struct StaticSession {
    main: String,
    tabs: Vec<(String, String)>,
    active: Option<usize>,
}

impl StaticSession {
    /// A session showing `main_markup` with no tabs.
    #[must_use]
    pub fn new(main_markup: impl Into<String>) -> Self {
        Self {
            main: main_markup.into(),
            tabs: Vec::new(),
            active: None,
        }
    }

    /// Adds the page shown after clicking the tab titled `title`.
    #[must_use]
    pub fn with_tab(mut self, title: impl Into<String>, markup: impl Into<String>) -> Self {
        self.tabs.push((title.into(), markup.into()));
        self
    }

    /// Loads a captured session from `dir`, as described by its
    /// [`MANIFEST_FILE`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the manifest or any markup file cannot
    /// be read or parsed.
    pub fn from_dir(dir: &Path) -> Result<Self, SessionError> {
        let manifest: SessionManifest =
            toml::from_str(&std::fs::read_to_string(dir.join(MANIFEST_FILE))?)?;

        let mut session = Self::new(std::fs::read_to_string(dir.join(&manifest.main))?);
        for tab in manifest.tabs {
            let markup = std::fs::read_to_string(dir.join(&tab.file))?;
            session = session.with_tab(tab.title, markup);
        }

        log::debug!(
            "Loaded session from {} ({} tabs)",
            dir.display(),
            session.tabs.len()
        );
        Ok(session)
    }
}

impl Session for StaticSession {
    fn page_markup(&mut self) -> Result<String, SessionError> {
        Ok(self
            .active
            .and_then(|i| self.tabs.get(i))
            .map_or_else(|| self.main.clone(), |(_, markup)| markup.clone()))
    }

    fn activate_tab(&mut self, title: &str, _timeout: Duration) -> Result<(), SessionError> {
        let wanted = collapse_ws(title);
        let index = self
            .tabs
            .iter()
            .position(|(t, _)| collapse_ws(t).contains(&wanted))
            .ok_or_else(|| SessionError::TabNotFound {
                title: title.to_owned(),
            })?;
        self.active = Some(index);
        Ok(())
    }
}
