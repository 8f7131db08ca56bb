use crate::CrawlError;
use metrics::{register_counter, register_gauge, register_histogram, Counter, Gauge, Histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Handles for the crawl's counters
///
/// Handles are bound to whichever recorder is installed when this is created;
/// without one they are no-ops, so create it after [`MetricsExporter::install`].
pub struct CrawlMetrics {
    pub pages_visited: Counter,
    pub navigation_failures: Counter,
    pub pages_skipped: Counter,
    pub screenshots_written: Counter,
    pub links_enqueued: Counter,
    pub duplicates_discarded: Counter,
    pub frontier_size: Gauge,
    pub visited_size: Gauge,
    pub page_duration: Histogram,
}

impl CrawlMetrics {
    pub fn new() -> Self {
        Self {
            pages_visited: register_counter!("crawlshot_pages_visited_total"),
            navigation_failures: register_counter!("crawlshot_navigation_failures_total"),
            pages_skipped: register_counter!("crawlshot_pages_skipped_total"),
            screenshots_written: register_counter!("crawlshot_screenshots_written_total"),
            links_enqueued: register_counter!("crawlshot_links_enqueued_total"),
            duplicates_discarded: register_counter!("crawlshot_duplicates_discarded_total"),
            frontier_size: register_gauge!("crawlshot_frontier_size"),
            visited_size: register_gauge!("crawlshot_visited_size"),
            page_duration: register_histogram!("crawlshot_page_duration_seconds"),
        }
    }

    pub fn record_queue_sizes(&self, frontier: usize, visited: usize) {
        self.frontier_size.set(frontier as f64);
        self.visited_size.set(visited as f64);
    }

    pub fn record_page(&self, duration: Duration, screenshots: usize) {
        self.screenshots_written.increment(screenshots as u64);
        self.page_duration.record(duration.as_secs_f64());
    }
}

impl Default for CrawlMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide Prometheus recorder whose text exposition can be saved to disk
pub struct MetricsExporter {
    handle: PrometheusHandle,
}

impl MetricsExporter {
    pub fn install() -> Result<Self, CrawlError> {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::set_boxed_recorder(Box::new(recorder))
            .map_err(|e| CrawlError::ConfigurationError(format!("metrics recorder: {e}")))?;

        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub async fn write_to(&self, path: &Path) -> Result<(), CrawlError> {
        tokio::fs::write(path, self.render()).await?;
        info!("Metrics written to {}", path.display());
        Ok(())
    }
}
