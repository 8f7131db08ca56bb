use crate::{
    ChromeRenderer, Config, CrawlError, CrawlReport, Crawler, ErrorSeverity, LocalFilesystem,
    MetricsExporter, PageErrorPolicy, Resolution,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "crawlshot")]
#[command(about = "Crawl a site breadth-first and screenshot every page at several resolutions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Navigation timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, help = "Chrome executable path")]
    pub chrome_path: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl from a seed URL and capture every page
    Crawl {
        #[arg(short, long, help = "Seed URL (absolute)")]
        seed: Option<String>,

        #[arg(short, long, help = "Hostname links must match (default: seed host)")]
        domain: Option<String>,

        #[arg(
            short = 'r',
            long = "resolution",
            help = "Viewport as WxH; repeat for several, captured in the given order"
        )]
        resolutions: Vec<Resolution>,

        #[arg(short, long, help = "Directory under which images/ is written")]
        output: Option<PathBuf>,

        #[arg(long, help = "On capture or extraction failure: skip or abort")]
        on_page_error: Option<PageErrorPolicy>,

        #[arg(long, help = "Write a JSON crawl report to this file")]
        report: Option<PathBuf>,

        #[arg(long, help = "Write Prometheus metrics to this file when done")]
        metrics_file: Option<PathBuf>,

        #[arg(long, help = "Show the browser window")]
        headed: bool,
    },

    /// Validate configuration
    Validate {
        #[arg(short, long, help = "Configuration file to validate")]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    pub seed: Option<String>,
    pub domain: Option<String>,
    pub resolutions: Vec<Resolution>,
    pub output: Option<PathBuf>,
    pub on_page_error: Option<PageErrorPolicy>,
    pub report: Option<PathBuf>,
    pub metrics_file: Option<PathBuf>,
    pub headed: bool,
}

impl CrawlOptions {
    /// Overlay command-line values on a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(seed) = &self.seed {
            config.seed_url = seed.clone();
        }
        if let Some(domain) = &self.domain {
            config.domain = Some(domain.clone());
        }
        if !self.resolutions.is_empty() {
            config.resolutions = self.resolutions.clone();
        }
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }
        if let Some(policy) = self.on_page_error {
            config.page_error_policy = policy;
        }
        if self.headed {
            config.headless = false;
        }
    }
}

pub struct CliRunner {
    pub config: Config,
}

impl CliRunner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self, command: Commands, shutdown: broadcast::Receiver<()>) -> Result<()> {
        match command {
            Commands::Crawl {
                seed,
                domain,
                resolutions,
                output,
                on_page_error,
                report,
                metrics_file,
                headed,
            } => {
                self.run_crawl(
                    CrawlOptions {
                        seed,
                        domain,
                        resolutions,
                        output,
                        on_page_error,
                        report,
                        metrics_file,
                        headed,
                    },
                    shutdown,
                )
                .await
            }
            Commands::Validate { config } => self.validate_config(&config).await,
        }
    }

    pub async fn run_crawl(
        &self,
        options: CrawlOptions,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        let mut config = self.config.clone();
        options.apply(&mut config);
        config.validate().context("Invalid crawl configuration")?;

        // Install before the crawler registers its counters
        let exporter = match &options.metrics_file {
            Some(_) => Some(MetricsExporter::install()?),
            None => None,
        };

        info!("Launching Chrome");
        let renderer = ChromeRenderer::launch(&config).await?;
        let mut crawler = Crawler::new(config, renderer, LocalFilesystem)?;

        let outcome = tokio::select! {
            result = crawler.run() => Some(result),
            _ = shutdown.recv() => {
                warn!("Crawl interrupted, closing browser");
                None
            }
        };

        let visited = crawler.visited_count();
        let (renderer, _) = crawler.into_parts();
        renderer.close().await;

        if let (Some(exporter), Some(path)) = (&exporter, &options.metrics_file) {
            exporter.write_to(path).await?;
        }

        let report = match outcome {
            Some(Ok(report)) => report,
            Some(Err(e)) => {
                log_crawl_error(&e);
                return Err(e).context("Crawl aborted");
            }
            None => {
                info!("Stopped after visiting {} pages", visited);
                return Ok(());
            }
        };

        if let Some(path) = &options.report {
            write_report(&report, path).await?;
        }

        println!("{}", report.summary());
        Ok(())
    }

    pub async fn validate_config(&self, config_path: &Path) -> Result<()> {
        println!("Validating configuration: {}", config_path.display());

        let config = read_config_file(config_path).await?;
        config.validate()?;

        println!("Configuration is valid:");
        println!("  Seed URL: {}", config.seed_url);
        println!("  Domain: {}", config.crawl_domain()?);
        println!(
            "  Resolutions: {}",
            config
                .resolutions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("  Output root: {}", config.output_root.display());
        println!("  Navigation timeout: {:?}", config.navigation_timeout);
        println!("  Page error policy: {:?}", config.page_error_policy);

        Ok(())
    }
}

fn log_crawl_error(error: &CrawlError) {
    match error.severity() {
        ErrorSeverity::High => error!("Crawl failed: {}", error),
        _ => warn!("Crawl stopped on page error: {}", error),
    }
}

pub async fn read_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Reading {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("Parsing {}", path.display()))?;
    Ok(config)
}

pub async fn write_report(report: &CrawlReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(CrawlError::from)?;
    fs::write(path, json)
        .await
        .with_context(|| format!("Writing report to {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

pub fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Installing log subscriber: {e}"))?;

    Ok(())
}
