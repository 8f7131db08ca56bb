//! # Crawlshot
//!
//! Crawls a single web domain breadth-first from a seed URL and captures a
//! full-page screenshot of every distinct page at each configured viewport
//! resolution, for auditing responsive layouts across device classes.
//!
//! ## Pipeline
//!
//! | Stage | Module | Notes |
//! |-------|--------|-------|
//! | Admission | [`filter`] | Exact-host match, literal `#`/`mailto:`/`tel:`/`javascript:` rejection |
//! | Scheduling | [`crawler`] | FIFO frontier, visited set, seed-prefix containment |
//! | Capture | [`capture`] | One full-page PNG per resolution, in configured order |
//! | Layout | [`paths`] | `<root>/images/<host>/<segments...>/<W>x<H>.png` |
//! | Discovery | [`links`] | Anchors of the rendered DOM, in document order |
//!
//! A crawl is strictly sequential: one Chrome tab is reused for every
//! navigation, capture and link query, and each step completes before the
//! next begins. Only navigation carries its own timeout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crawlshot::{ChromeRenderer, Config, Crawler, LocalFilesystem};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         seed_url: "https://example.com/".to_string(),
//!         resolutions: vec!["800x600".parse()?, "1024x768".parse()?],
//!         ..Default::default()
//!     };
//!
//!     let renderer = ChromeRenderer::launch(&config).await?;
//!     let mut crawler = Crawler::new(config, renderer, LocalFilesystem)?;
//!     let report = crawler.run().await?;
//!     println!("{}", report.summary());
//!
//!     let (renderer, _) = crawler.into_parts();
//!     renderer.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! crawlshot crawl --seed https://example.com/ -r 800x600 -r 1024x768 --output shots/
//! crawlshot validate --config crawl.json
//! ```

/// Crawl configuration and Chrome launch settings
pub mod config;

/// Error types and admission rejections
pub mod error;

/// Link admission rules
pub mod filter;

/// Output directory and filename derivation
pub mod paths;

/// Filesystem capability
pub mod filesystem;

/// Rendering capability and the Chrome-backed implementation
pub mod renderer;

/// Screenshot capture at each configured resolution
pub mod capture;

/// Link extraction from the rendered page
pub mod links;

/// Breadth-first crawl scheduler
pub mod crawler;

/// Run report
pub mod report;

/// Crawl metrics and Prometheus export
pub mod telemetry;

/// Command-line interface implementation
pub mod cli;


pub use capture::*;
pub use cli::*;
pub use config::*;
pub use crawler::*;
pub use error::*;
pub use filesystem::*;
pub use filter::*;
pub use links::*;
pub use paths::*;
pub use renderer::*;
pub use report::*;
pub use telemetry::*;
