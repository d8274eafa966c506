//! Bounded concurrent scraping.
//!
//! Each scrape runs on the blocking thread pool and owns its session for
//! its whole lifetime. The only state shared between scrapes is the
//! read-only [`ExtractConfig`].

use std::sync::Arc;

use futures::future::join_all;
use portal_scrape_extract_models::CollectedRecord;
use tokio::sync::Semaphore;

use crate::ScrapeError;
use crate::assemble::scrape;
use crate::config::ExtractConfig;
use crate::session::Session;

/// Runs scrapes with at most a fixed number in flight.
#[derive(Debug, Clone)]
pub struct ScrapePool {
    config: Arc<ExtractConfig>,
    permits: Arc<Semaphore>,
}

impl ScrapePool {
    /// Creates a pool allowing `max_concurrent` scrapes at once (at least
    /// one).
    #[must_use]
    pub fn new(config: Arc<ExtractConfig>, max_concurrent: usize) -> Self {
        Self {
            config,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Scrapes one session once a slot is free.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Structural`] if navigation fails, or
    /// [`ScrapeError::Worker`] if the scrape task panics or the pool is
    /// closed.
    pub async fn run<S>(&self, mut session: S) -> Result<CollectedRecord, ScrapeError>
    where
        S: Session + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| ScrapeError::Worker(e.to_string()))?;
        let config = Arc::clone(&self.config);

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            scrape(&mut session, &config)
        })
        .await
        .map_err(|e| ScrapeError::Worker(e.to_string()))?
    }

    /// Scrapes every session, returning results in input order.
    pub async fn run_all<S, I>(&self, sessions: I) -> Vec<Result<CollectedRecord, ScrapeError>>
    where
        S: Session + Send + 'static,
        I: IntoIterator<Item = S>,
    {
        join_all(sessions.into_iter().map(|session| self.run(session))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::session::StaticSession;
    use crate::test_pages::{capture_dirs, full_session, numbered_session, temp_root};

    fn pool(max_concurrent: usize) -> ScrapePool {
        let config = ExtractConfig::default().with_timeouts(Timeouts::immediate());
        ScrapePool::new(Arc::new(config), max_concurrent)
    }

    #[tokio::test]
    async fn runs_single_scrape() {
        let record = pool(1).run(full_session()).await.unwrap();
        assert_eq!(record.pppoe.login, "user1");
    }

    #[tokio::test]
    async fn keeps_input_order_and_isolates_failures() {
        let sessions = vec![
            full_session(),
            StaticSession::new("<p>Неверный логин или пароль</p>"),
            full_session(),
        ];
        let results = pool(2).run_all(sessions).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ScrapeError::Structural { .. })));
        assert_eq!(
            results[2].as_ref().unwrap().main.request_number,
            "Req123456"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shared_dump_dir_keeps_captures_apart() {
        let root = temp_root("pool_dumps");
        let config = ExtractConfig::default()
            .with_timeouts(Timeouts::immediate())
            .with_dump_dir(&root);
        let pool = ScrapePool::new(Arc::new(config), 8);

        let results = pool
            .run_all((0..8).map(|i| numbered_session(100_000 + i)))
            .await;
        assert!(results.iter().all(Result::is_ok));

        let dirs = capture_dirs(&root);
        assert_eq!(dirs.len(), 8);

        let replay_config = ExtractConfig::default().with_timeouts(Timeouts::immediate());
        let mut seen = std::collections::BTreeSet::new();
        for dir in &dirs {
            let mut session = StaticSession::from_dir(dir).unwrap();
            let record = scrape(&mut session, &replay_config).unwrap();
            let number = record.main.request_number.as_str();
            let n = number.strip_prefix("Req").unwrap().to_owned();
            assert_eq!(record.pppoe.login.as_str(), format!("user{n}"));
            seen.insert(n);
        }
        assert_eq!(seen.len(), 8);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn zero_concurrency_still_runs() {
        assert_eq!(pool(0).permits.available_permits(), 1);
    }
}
