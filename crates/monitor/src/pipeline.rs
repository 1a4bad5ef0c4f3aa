//! One monitoring pass over the site registry.
//!
//! Per site: `scrape → fingerprint → {Unchanged, Changed, ExtractionFailed}`.
//!
//! - **ExtractionFailed**: logged, nothing else happens for the site.
//! - **Unchanged**: screenshot, then a silent "No change detected" message.
//! - **Changed**: screenshot, an alert "Change detected", then the new
//!   fingerprint is stored.
//!
//! Screenshot and delivery failures are logged and never abort the run. A
//! "Monitoring completed." message is sent once at the end of every run.

use std::path::PathBuf;

use jobwatch_client::{Capturer, NotificationEvent, Notifier, Scraper, screenshot_path};
use jobwatch_core::{Error, Fingerprint, MonitoredSite, SiteDb, fingerprint};
use tracing::Instrument;

pub const COMPLETED_MESSAGE: &str = "Monitoring completed.";

/// What happened to one site during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteOutcome {
    Unchanged,
    Changed { previous: Option<Fingerprint>, current: Fingerprint },
    ExtractionFailed,
}

/// Per-outcome site counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub unchanged: usize,
    pub changed: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &SiteOutcome) {
        match outcome {
            SiteOutcome::Unchanged => self.unchanged += 1,
            SiteOutcome::Changed { .. } => self.changed += 1,
            SiteOutcome::ExtractionFailed => self.failed += 1,
        }
    }
}

/// Drives the registry, scraper, capturer and notifier through a run.
pub struct Monitor<'a> {
    db: SiteDb,
    scraper: &'a dyn Scraper,
    capturer: &'a dyn Capturer,
    notifier: &'a dyn Notifier,
    screenshot_dir: PathBuf,
}

impl<'a> Monitor<'a> {
    pub fn new(
        db: SiteDb, scraper: &'a dyn Scraper, capturer: &'a dyn Capturer, notifier: &'a dyn Notifier,
        screenshot_dir: impl Into<PathBuf>,
    ) -> Self {
        Self { db, scraper, capturer, notifier, screenshot_dir: screenshot_dir.into() }
    }

    /// Check every registered site in registry order, then send the
    /// completion message.
    ///
    /// # Errors
    ///
    /// Returns the registry error if the sites could not be listed. The
    /// completion message is sent in that case too.
    pub async fn run(&self) -> Result<RunSummary, Error> {
        let result = self.check_all().await;
        self.send(NotificationEvent::inform(COMPLETED_MESSAGE)).await;
        result
    }

    async fn check_all(&self) -> Result<RunSummary, Error> {
        let sites = self.db.list_sites().await.inspect_err(|e| {
            tracing::error!(error = %e, "listing monitored sites failed");
        })?;

        tracing::info!(sites = sites.len(), "monitoring run started");

        let mut summary = RunSummary::default();
        for site in &sites {
            let outcome = self.check_site(site).await;
            summary.record(&outcome);
        }

        tracing::info!(
            unchanged = summary.unchanged,
            changed = summary.changed,
            failed = summary.failed,
            "monitoring run finished"
        );
        Ok(summary)
    }

    /// Run the per-site state machine for one site.
    pub async fn check_site(&self, site: &MonitoredSite) -> SiteOutcome {
        let span = tracing::info_span!("site", url = %site.url, kind = %site.kind);
        self.check_site_inner(site).instrument(span).await
    }

    async fn check_site_inner(&self, site: &MonitoredSite) -> SiteOutcome {
        let extraction = self.scraper.scrape(&site.url, site.kind).await;
        if extraction.is_empty() {
            tracing::warn!("no listing content extracted, skipping site");
            return SiteOutcome::ExtractionFailed;
        }

        let current = fingerprint(&extraction.text);
        let previous = site.last_content_hash.clone();
        let changed = previous.as_ref() != Some(&current);

        let files = self.screenshot(&site.url, extraction.screenshot_selector.as_deref()).await;

        if !changed {
            tracing::info!(fingerprint = %current, "no change detected");
            let mut event = NotificationEvent::inform(format!("No change detected for {}", site.url));
            event.files = files;
            self.send(event).await;
            return SiteOutcome::Unchanged;
        }

        tracing::info!(
            previous = previous.as_ref().map(Fingerprint::as_str).unwrap_or("<none>"),
            current = %current,
            "change detected"
        );
        let mut event = NotificationEvent::alert(format!("Change detected for {}", site.url));
        event.files = files;
        self.send(event).await;

        match self.db.set_fingerprint(&site.url, &current).await {
            Ok(true) => tracing::debug!("fingerprint stored"),
            Ok(false) => tracing::warn!("site no longer registered, fingerprint not stored"),
            Err(e) => tracing::error!(error = %e, "storing fingerprint failed"),
        }

        SiteOutcome::Changed { previous, current }
    }

    /// Capture the site, returning the attachment list for its notification.
    async fn screenshot(&self, url: &str, selector: Option<&str>) -> Vec<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(&self.screenshot_dir).await {
            tracing::warn!(dir = %self.screenshot_dir.display(), error = %e, "cannot create screenshot directory");
            return Vec::new();
        }

        let path = screenshot_path(&self.screenshot_dir, url);
        match self.capturer.capture(url, &path, selector).await {
            Ok(()) => vec![path],
            Err(e) => {
                tracing::warn!(error = %e, "screenshot failed, notifying without it");
                Vec::new()
            }
        }
    }

    async fn send(&self, event: NotificationEvent) {
        if let Err(e) = self.notifier.notify(&event).await {
            tracing::error!(error = %e, text = %event.text, "notification failed");
        }
    }
}
