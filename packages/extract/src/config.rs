//! Process-wide extraction configuration.
//!
//! Loaded once at startup (from TOML or [`Default`]) and then shared
//! read-only between scrape workers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors that can occur while loading an [`ExtractConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML or has the wrong shape.
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Button labels and other UI chrome that leak into scraped values.
const DEFAULT_NOISE_PHRASES: &[&str] = &[
    "Обновить",
    "Распечатать заявку",
    "Последние заявки клиента",
    "Показать удаленные подключения",
    "Скрыть удаленные подключения",
];

/// Extraction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Phrases removed from every extracted value (word-bounded,
    /// case-insensitive).
    pub noise_phrases: Vec<String>,
    /// Bounded waits used while navigating the record page.
    pub timeouts: Timeouts,
    /// When set, the markup of every page context is written here.
    pub dump_dir: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            noise_phrases: DEFAULT_NOISE_PHRASES
                .iter()
                .map(|&p| p.to_owned())
                .collect(),
            timeouts: Timeouts::default(),
            dump_dir: None,
        }
    }
}

impl ExtractConfig {
    /// Parses a config from a TOML string. Missing keys take their
    /// default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Sets the diagnostic dump directory.
    #[must_use]
    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    /// Sets all timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// Bounded waits, in the units named by each field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// How long to wait for the record page marker after login.
    pub page_ready_secs: u64,
    /// How long to wait for a tab to become clickable and for its marker.
    pub tab_secs: u64,
    /// Marker wait on the service-settings tab, which renders slowly.
    pub pppoe_marker_secs: u64,
    /// Fixed delay after a tab click before its panel is queried.
    pub settle_ms: u64,
    /// Interval between polls while waiting on the page.
    pub poll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_ready_secs: 30,
            tab_secs: 30,
            pppoe_marker_secs: 40,
            settle_ms: 1000,
            poll_ms: 250,
        }
    }
}

impl Timeouts {
    /// Timeouts with no settle delay and minimal polling, for replaying
    /// captured pages where nothing renders asynchronously.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            page_ready_secs: 0,
            tab_secs: 0,
            pppoe_marker_secs: 0,
            settle_ms: 0,
            poll_ms: 1,
        }
    }

    /// Bound on the wait for the page-ready marker.
    #[must_use]
    pub const fn page_ready(&self) -> Duration {
        Duration::from_secs(self.page_ready_secs)
    }

    /// Bound on a single tab activation.
    #[must_use]
    pub const fn tab(&self) -> Duration {
        Duration::from_secs(self.tab_secs)
    }

    /// Bound on the wait for the PPPoE panel marker.
    #[must_use]
    pub const fn pppoe_marker(&self) -> Duration {
        Duration::from_secs(self.pppoe_marker_secs)
    }

    /// Pause after a tab click before snapshotting.
    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Interval between page polls while waiting.
    #[must_use]
    pub const fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}
