//! Breadth-first crawl scheduler
//!
//! The [`Crawler`] owns the frontier queue, the visited set and the single
//! page handle. Each dequeued URL is marked visited before anything else
//! happens to it, so every URL is navigated, captured and scanned for links
//! at most once per run, whether or not that work succeeds.

use crate::{
    capture_all, extract_links, is_within_seed, CaptureBatch, Config, CrawlError, CrawlMetrics,
    CrawlReport, Filesystem, PageErrorPolicy, PageRecord, PageStatus, Rejection, Renderer,
};
use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Lifecycle of a [`Crawler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// Constructed, seed not yet enqueued
    Idle,
    /// Processing the frontier
    Running,
    /// Frontier empty, report being assembled
    Draining,
    /// Finished, successfully or not; the crawler cannot run again
    Done,
}

pub struct Crawler<R, F> {
    config: Config,
    seed: Url,
    domain: String,
    renderer: R,
    filesystem: F,
    frontier: VecDeque<Url>,
    visited: HashSet<String>,
    state: CrawlState,
    metrics: CrawlMetrics,
}

impl<R, F> Crawler<R, F>
where
    R: Renderer,
    F: Filesystem,
{
    pub fn new(config: Config, renderer: R, filesystem: F) -> Result<Self, CrawlError> {
        config.validate()?;
        let seed = config.parsed_seed()?;
        let domain = config.crawl_domain()?;

        Ok(Self {
            config,
            seed,
            domain,
            renderer,
            filesystem,
            frontier: VecDeque::new(),
            visited: HashSet::new(),
            state: CrawlState::Idle,
            metrics: CrawlMetrics::new(),
        })
    }

    /// Crawl until the frontier is empty.
    ///
    /// Navigation failures are recorded and skipped. Capture and extraction
    /// failures follow the configured [`PageErrorPolicy`]; filesystem errors
    /// always end the run.
    pub async fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        if self.state != CrawlState::Idle {
            return Err(CrawlError::ConfigurationError(
                "a crawler can only run once".to_string(),
            ));
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start_time = Instant::now();

        info!(
            "Starting crawl {} from {} (domain: {}, resolutions: {})",
            run_id,
            self.seed,
            self.domain,
            self.config
                .resolutions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.frontier.push_back(self.seed.clone());
        self.state = CrawlState::Running;

        let mut pages = Vec::new();
        let mut duplicates_discarded = 0;

        while let Some(url) = self.frontier.pop_front() {
            if self.visited.contains(url.as_str()) {
                debug!("Discarding {}: already visited", url);
                duplicates_discarded += 1;
                self.metrics.duplicates_discarded.increment(1);
                continue;
            }

            self.visited.insert(url.to_string());
            self.metrics.pages_visited.increment(1);
            self.metrics
                .record_queue_sizes(self.frontier.len(), self.visited.len());

            info!(
                "Visiting {} (visited: {}, frontier: {})",
                url,
                self.visited.len(),
                self.frontier.len()
            );

            match self.visit(&url).await {
                Ok(record) => pages.push(record),
                Err(e) => {
                    self.state = CrawlState::Done;
                    return Err(e);
                }
            }
        }

        self.state = CrawlState::Draining;
        self.metrics
            .record_queue_sizes(self.frontier.len(), self.visited.len());

        let report = CrawlReport {
            run_id,
            seed_url: self.config.seed_url.clone(),
            domain: self.domain.clone(),
            started_at,
            finished_at: Utc::now(),
            elapsed: start_time.elapsed(),
            pages,
            duplicates_discarded,
        };

        info!(
            "Crawl {} finished: {} pages, {} screenshots, {} navigation failures",
            run_id,
            report.pages_visited(),
            report.screenshots_written(),
            report.navigation_failures()
        );

        self.state = CrawlState::Done;
        Ok(report)
    }

    async fn visit(&mut self, url: &Url) -> Result<PageRecord, CrawlError> {
        let start_time = Instant::now();

        if let Err(e) = self
            .renderer
            .navigate(url, self.config.navigation_timeout)
            .await
        {
            warn!("Skipping {}: {}", url, e);
            self.metrics.navigation_failures.increment(1);
            return Ok(PageRecord {
                url: url.to_string(),
                title: None,
                status: PageStatus::NavigationFailed {
                    reason: e.to_string(),
                },
                screenshots: Vec::new(),
            });
        }

        let title = match self.renderer.current_title().await {
            Ok(title) => {
                debug!("Loaded {} ({})", url, title);
                Some(title)
            }
            Err(e) => {
                debug!("No title for {}: {}", url, e);
                None
            }
        };

        let CaptureBatch { written, failure } = capture_all(
            &mut self.renderer,
            &self.filesystem,
            url,
            &self.config.resolutions,
            &self.config.output_root,
        )
        .await;

        if let Some(e) = failure {
            return self.page_failure(url, title, written, e);
        }

        let links = match extract_links(&mut self.renderer, &self.domain).await {
            Ok(links) => links,
            Err(e) => return self.page_failure(url, title, written, e),
        };

        let enqueued = self.enqueue(links);
        info!(
            "{}: {} screenshots, {} links enqueued (frontier: {})",
            url,
            written.len(),
            enqueued,
            self.frontier.len()
        );

        self.metrics.record_page(start_time.elapsed(), written.len());

        Ok(PageRecord {
            url: url.to_string(),
            title,
            status: PageStatus::Captured,
            screenshots: written,
        })
    }

    fn page_failure(
        &self,
        url: &Url,
        title: Option<String>,
        screenshots: Vec<PathBuf>,
        error: CrawlError,
    ) -> Result<PageRecord, CrawlError> {
        if !error.is_page_local() || self.config.page_error_policy == PageErrorPolicy::Abort {
            return Err(error);
        }

        warn!("Skipping rest of {}: {}", url, error);
        self.metrics.pages_skipped.increment(1);
        self.metrics
            .screenshots_written
            .increment(screenshots.len() as u64);

        Ok(PageRecord {
            url: url.to_string(),
            title,
            status: PageStatus::Skipped {
                reason: error.to_string(),
            },
            screenshots,
        })
    }

    /// Scheduler-side admission on top of the domain filter.
    fn check_candidate(&self, candidate: &Url) -> Result<(), Rejection> {
        if self.visited.contains(candidate.as_str()) {
            return Err(Rejection::AlreadyVisited);
        }
        if !is_within_seed(candidate, self.seed.as_str()) {
            return Err(Rejection::OutsideSeed);
        }
        Ok(())
    }

    fn enqueue(&mut self, links: Vec<Url>) -> usize {
        let mut enqueued = 0;

        for link in links {
            match self.check_candidate(&link) {
                Ok(()) => {
                    debug!("Enqueued {}", link);
                    self.frontier.push_back(link);
                    enqueued += 1;
                }
                Err(rejection) => debug!("Not enqueuing {}: {}", link, rejection),
            }
        }

        self.metrics.links_enqueued.increment(enqueued as u64);
        enqueued
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn has_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn filesystem(&self) -> &F {
        &self.filesystem
    }

    /// Give back the page handle and filesystem, e.g. to close the browser.
    pub fn into_parts(self) -> (R, F) {
        (self.renderer, self.filesystem)
    }
}
