// src/pipeline/poll.rs

//! The poll loop: fetch, extract, diff, notify, persist, sleep.
//!
//! One cycle runs at a time and owns the history for its whole duration.
//! Cancellation is honoured while fetching, between notifications and while
//! sleeping, never while the history is being written.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Candidate, Config, MessageConfig, PollConfig, SeenSet};
use crate::pipeline::diff::{DiffCalculator, DiffResult};
use crate::services::{
    Extractor, Fetcher, HttpFetcher, Notifier, SelectorExtractor, TelegramNotifier,
    render_message,
};
use crate::storage::{self, LocalStorage, SeenStore};
use crate::utils::http::create_async_client;

/// Loop states, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Extracting,
    Diffing,
    Notifying,
    Persisting,
    Sleeping,
    Terminating,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a single cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The page could not be fetched
    FetchFailed,
    /// The page could not be read
    ExtractFailed,
    /// The page listed no chapters
    NoCandidates,
    /// The history could not be read, so nothing was sent
    HistoryUnavailable,
    /// Every listed chapter was already announced
    NothingNew,
    /// New chapters were announced (some sends may have failed)
    Notified,
    /// Shutdown was requested before anything was sent
    Cancelled,
}

impl CycleOutcome {
    /// Whether the cycle got past fetching.
    pub fn fetched(&self) -> bool {
        !matches!(self, Self::FetchFailed | Self::Cancelled)
    }
}

/// What happened during one cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Identifiers delivered successfully
    pub sent: Vec<String>,
    /// Identifiers whose delivery failed
    pub failed: Vec<String>,
    /// Whether the history was written
    pub persisted: bool,
    /// Recoverable errors raised along the way
    pub errors: Vec<AppError>,
}

impl CycleReport {
    fn new(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            sent: Vec::new(),
            failed: Vec::new(),
            persisted: false,
            errors: Vec::new(),
        }
    }
}

/// Totals over a whole run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Orchestrates poll cycles against injected collaborators.
pub struct PollLoop {
    target_url: String,
    poll: PollConfig,
    message: MessageConfig,
    diff: DiffCalculator,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn SeenStore>,
}

impl PollLoop {
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn SeenStore>,
    ) -> Self {
        Self {
            target_url: config.target.url.clone(),
            poll: config.poll.clone(),
            message: config.message.clone(),
            diff: DiffCalculator::new(config.poll.order),
            fetcher,
            extractor,
            notifier,
            store,
        }
    }

    /// Wire up HTTP fetching, selector extraction, Telegram delivery and
    /// the local state file. Fails if the storage directory cannot be used.
    pub async fn from_config(config: &Config) -> Result<Self> {
        LocalStorage::new(&config.storage.dir, &config.storage.file)
            .init()
            .await?;
        Self::dry_run(config)
    }

    /// Same wiring as [`PollLoop::from_config`], but the storage directory
    /// is left untouched. Meant for [`PollLoop::preview`].
    pub fn dry_run(config: &Config) -> Result<Self> {
        let client = create_async_client(&config.target)?;
        let store = LocalStorage::new(&config.storage.dir, &config.storage.file);

        Ok(Self::new(
            config,
            Arc::new(HttpFetcher::with_client(client.clone())),
            Arc::new(SelectorExtractor::new(&config.extractor, &config.target.url)?),
            Arc::new(TelegramNotifier::new(&config.telegram, client)),
            Arc::new(store),
        ))
    }

    /// Run cycles until cancelled, or until the first fetched cycle in
    /// run-once mode.
    pub async fn run(&self, cancel: CancellationToken) -> RunSummary {
        let mut summary = RunSummary::default();
        log::info!(
            "Polling {} every {}s (state: {})",
            self.target_url,
            self.poll.interval_secs,
            self.store.location()
        );

        loop {
            let report = self.run_cycle(&cancel).await;
            summary.cycles += 1;
            summary.sent += report.sent.len();
            summary.failed += report.failed.len();

            if cancel.is_cancelled() {
                break;
            }
            if self.poll.run_once && report.outcome.fetched() {
                log::info!("Run-once mode: cycle finished ({:?})", report.outcome);
                break;
            }

            log::debug!("{} for {}s", PollState::Sleeping, self.poll.interval_secs);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll.interval()) => {}
            }
        }

        log::info!(
            "{}: {} cycles, {} sent, {} failed",
            PollState::Terminating,
            summary.cycles,
            summary.sent,
            summary.failed
        );
        summary
    }

    /// Run one fetch, extract, diff, notify, persist cycle.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        log::debug!("{} -> {}", PollState::Idle, PollState::Fetching);

        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Shutdown requested before fetch completed");
                return CycleReport::new(CycleOutcome::Cancelled);
            }
            page = self.fetcher.fetch(&self.target_url) => page,
        };
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                log::error!("Fetching {} failed: {}", self.target_url, e);
                let mut report = CycleReport::new(CycleOutcome::FetchFailed);
                report.errors.push(e);
                return report;
            }
        };

        log::debug!("{}", PollState::Extracting);
        let candidates = match self.extractor.extract(&page) {
            Ok(candidates) => candidates,
            Err(e) => {
                log::error!("Reading chapters from {} failed: {}", self.target_url, e);
                let mut report = CycleReport::new(CycleOutcome::ExtractFailed);
                report.errors.push(e);
                return report;
            }
        };
        if candidates.is_empty() {
            log::warn!("No chapter entries found on {}", self.target_url);
            return CycleReport::new(CycleOutcome::NoCandidates);
        }

        log::debug!("{}", PollState::Diffing);
        let mut errors = Vec::new();
        let seen = match self.load_seen(&mut errors).await {
            Ok(seen) => seen,
            Err(e) => {
                log::error!(
                    "Reading history at {} failed, skipping this cycle: {}",
                    self.store.location(),
                    e
                );
                let mut report = CycleReport::new(CycleOutcome::HistoryUnavailable);
                report.errors = errors;
                report.errors.push(e);
                return report;
            }
        };
        let diff = self.diff.calculate(&candidates, &seen);
        if !diff.has_changes() {
            log::info!(
                "No new chapters ({} listed, {} already announced)",
                candidates.len(),
                diff.already_seen
            );
            let mut report = CycleReport::new(CycleOutcome::NothingNew);
            report.errors = errors;
            return report;
        }
        log::info!("Found {} new chapters", diff.added.len());

        let mut report = self.notify_all(&diff.added, cancel).await;
        errors.append(&mut report.errors);
        report.errors = errors;

        // Items are sent in order, so the attempted ones form a prefix.
        let attempted = &diff.added[..report.sent.len() + report.failed.len()];
        if attempted.is_empty() {
            report.outcome = CycleOutcome::Cancelled;
            return report;
        }

        log::debug!("{}", PollState::Persisting);
        let updated = storage::merge(&seen, attempted, Utc::now());
        match self.store.save(&updated).await {
            Ok(()) => report.persisted = true,
            Err(e) => {
                log::error!(
                    "Saving history failed, {} chapters may be announced again: {}",
                    attempted.len(),
                    e
                );
                report.errors.push(e);
            }
        }

        report
    }

    /// Fetch, extract and diff without sending or saving anything.
    pub async fn preview(&self) -> Result<DiffResult> {
        let page = self.fetcher.fetch(&self.target_url).await?;
        let candidates = self.extractor.extract(&page)?;
        let seen = match self.store.load().await {
            Ok(seen) => seen,
            Err(e @ AppError::CorruptState { .. }) => {
                log::warn!("History unparsable, previewing against empty: {}", e);
                SeenSet::new()
            }
            Err(e) => return Err(e),
        };
        Ok(self.diff.calculate(&candidates, &seen))
    }

    /// Format the message that would be sent for `candidate`.
    pub fn render(&self, candidate: &Candidate) -> String {
        render_message(&self.message, candidate)
    }

    /// Load the history. Unparsable content is set aside and replaced by an
    /// empty history; any other failure is returned.
    async fn load_seen(&self, errors: &mut Vec<AppError>) -> Result<SeenSet> {
        match self.store.load().await {
            Ok(seen) => Ok(seen),
            Err(e @ AppError::CorruptState { .. }) => {
                log::error!(
                    "History at {} is unparsable, starting from empty; \
                     already announced chapters may be sent again: {}",
                    self.store.location(),
                    e
                );
                if let Err(qe) = self.store.quarantine().await {
                    log::warn!("Could not move unparsable history aside: {}", qe);
                }
                errors.push(e);
                Ok(SeenSet::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Send one message per chapter, in order, one at a time.
    async fn notify_all(&self, items: &[Candidate], cancel: &CancellationToken) -> CycleReport {
        log::debug!("{}", PollState::Notifying);
        let mut report = CycleReport::new(CycleOutcome::Notified);

        for (i, item) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                log::warn!(
                    "Shutdown requested, {} chapters left unannounced",
                    items.len() - i
                );
                break;
            }

            let message = self.render(item);
            match self.notifier.send(&message).await {
                Ok(()) => {
                    log::info!("Notified chapter: {} ({})", item.heading(), item.identifier);
                    report.sent.push(item.identifier.clone());
                }
                Err(e) => {
                    let err = AppError::notify(&item.identifier, e);
                    log::error!("Failed to announce '{}': {}", item.title, err);
                    report.failed.push(item.identifier.clone());
                    report.errors.push(err);
                }
            }
        }

        report
    }
}
