//! Per-run summary of what the crawl visited and wrote

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of one dequeued, previously unvisited URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    /// Every resolution was captured and links were extracted
    Captured,
    /// The page never loaded; nothing was written for it
    NavigationFailed { reason: String },
    /// Capture or extraction failed after the page loaded
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub url: String,
    pub title: Option<String>,
    #[serde(flatten)]
    pub status: PageStatus,
    pub screenshots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub run_id: Uuid,
    pub seed_url: String,
    pub domain: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Pages in visitation order
    pub pages: Vec<PageRecord>,
    /// Frontier entries dropped because their URL had already been visited
    pub duplicates_discarded: usize,
}

impl CrawlReport {
    pub fn pages_visited(&self) -> usize {
        self.pages.len()
    }

    pub fn navigation_failures(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| matches!(page.status, PageStatus::NavigationFailed { .. }))
            .count()
    }

    pub fn pages_skipped(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| matches!(page.status, PageStatus::Skipped { .. }))
            .count()
    }

    pub fn screenshots_written(&self) -> usize {
        self.pages.iter().map(|page| page.screenshots.len()).sum()
    }

    pub fn visit_order(&self) -> Vec<&str> {
        self.pages.iter().map(|page| page.url.as_str()).collect()
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Crawl {} of {} completed:", self.run_id, self.seed_url);
        let _ = writeln!(out, "  Domain: {}", self.domain);
        let _ = writeln!(out, "  Pages visited: {}", self.pages_visited());
        let _ = writeln!(out, "  Navigation failures: {}", self.navigation_failures());
        let _ = writeln!(out, "  Pages skipped: {}", self.pages_skipped());
        let _ = writeln!(out, "  Screenshots written: {}", self.screenshots_written());
        let _ = writeln!(out, "  Duplicates discarded: {}", self.duplicates_discarded);
        let _ = write!(out, "  Duration: {}", format_duration(self.elapsed));
        out
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let millis = duration.subsec_millis();

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else if seconds > 0 {
        format!("{}.{}s", seconds, millis / 100)
    } else {
        format!("{millis}ms")
    }
}
