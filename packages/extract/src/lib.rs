#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Label-driven field extraction for the account portal's record-detail
//! page.
//!
//! The portal has no API and its markup is inconsistent: values sit in
//! table cells, form controls, or plain siblings of their labels. This
//! crate finds a value by its visible label through an ordered chain of
//! [`locator::LocatorStrategy`] implementations, cleans it with a
//! [`normalize::Normalizer`], and assembles a full
//! [`portal_scrape_extract_models::CollectedRecord`] from the main page and
//! two tab panels ([`assemble::scrape`]).
//!
//! Pages are supplied through the [`session::Session`] trait.
//! [`session::StaticSession`] replays captured markup, and
//! [`pool::ScrapePool`] runs many scrapes concurrently, one session each.

pub mod assemble;
pub mod config;
pub mod dom;
pub mod locator;
pub mod matcher;
pub mod normalize;
pub mod pool;
pub mod reader;
pub mod refine;
pub mod services;
pub mod session;

#[cfg(test)]
mod test_pages;

pub use assemble::scrape;
pub use config::{ConfigError, ExtractConfig, Timeouts};
pub use pool::ScrapePool;
pub use session::{Page, Session, SessionError, StaticSession};

/// Errors that abort a whole scrape.
///
/// Missing fields never produce an error; they surface as the sentinel.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The page never reached the expected navigated state.
    #[error("Scrape failed at {stage}: {source}")]
    Structural {
        /// Which step failed (`record page` or a tab title).
        stage: &'static str,
        /// The underlying session failure.
        #[source]
        source: SessionError,
    },

    /// The scrape task could not run to completion.
    #[error("Scrape worker failed: {0}")]
    Worker(String),
}
