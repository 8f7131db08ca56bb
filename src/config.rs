//! Configuration management with serde serialization/deserialization
//!
//! This module provides the static crawl configuration: the seed URL, the
//! crawl domain, the ordered list of viewport resolutions and the browser
//! launch settings. It is read once at start and handed to the crawler.

use crate::CrawlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Main configuration structure for a crawl
///
/// # Examples
///
/// ```rust
/// use crawlshot::{Config, Resolution};
///
/// let config = Config {
///     seed_url: "https://example.com/".to_string(),
///     resolutions: vec!["800x600".parse().unwrap(), Resolution::new(1024, 768)],
///     ..Default::default()
/// };
/// assert_eq!(config.crawl_domain().unwrap(), "example.com");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Absolute URL the crawl starts from (default: https://example.com/)
    ///
    /// Every page enqueued after the seed must have this string as a prefix.
    pub seed_url: String,

    /// Hostname used for exact-match link filtering (default: the seed's host)
    pub domain: Option<String>,

    /// Viewport sizes captured for every page, in capture order
    pub resolutions: Vec<Resolution>,

    /// Directory under which `images/` is created (default: current directory)
    pub output_root: PathBuf,

    /// Upper bound for a single navigation (default: 30 seconds)
    pub navigation_timeout: Duration,

    /// What to do when capture or link extraction fails on a page (default: skip)
    pub page_error_policy: PageErrorPolicy,

    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// Custom User-Agent string for requests (default: Chrome default)
    pub user_agent: Option<String>,

    /// Run Chrome without a visible window (default: true)
    pub headless: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_url: "https://example.com/".to_string(),
            domain: None,
            resolutions: vec![
                Resolution::new(375, 667),
                Resolution::new(768, 1024),
                Resolution::new(1920, 1080),
            ],
            output_root: PathBuf::from("."),
            navigation_timeout: Duration::from_secs(30),
            page_error_policy: PageErrorPolicy::default(),
            chrome_path: None,
            user_agent: None,
            headless: true,
        }
    }
}

impl Config {
    /// Parse the seed URL, requiring an http(s) scheme and a host.
    pub fn parsed_seed(&self) -> Result<Url, CrawlError> {
        let seed = Url::parse(&self.seed_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", self.seed_url, e)))?;

        match seed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CrawlError::InvalidUrl(format!(
                    "{}: unsupported scheme '{}'",
                    self.seed_url, other
                )))
            }
        }

        if seed.host_str().is_none() {
            return Err(CrawlError::InvalidUrl(format!("{}: missing host", self.seed_url)));
        }

        Ok(seed)
    }

    /// The hostname links must match exactly to be admitted.
    pub fn crawl_domain(&self) -> Result<String, CrawlError> {
        match &self.domain {
            Some(domain) => Ok(domain.clone()),
            None => {
                let seed = self.parsed_seed()?;
                seed.host_str()
                    .map(str::to_string)
                    .ok_or_else(|| CrawlError::InvalidUrl(self.seed_url.clone()))
            }
        }
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        let seed = self.parsed_seed()?;

        if self.resolutions.is_empty() {
            return Err(CrawlError::ConfigurationError(
                "At least one resolution is required".to_string(),
            ));
        }

        if self.navigation_timeout.is_zero() {
            return Err(CrawlError::ConfigurationError(
                "Navigation timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(domain) = &self.domain {
            if seed.host_str() != Some(domain.as_str()) {
                return Err(CrawlError::ConfigurationError(format!(
                    "Domain '{}' does not match the seed host '{}'",
                    domain,
                    seed.host_str().unwrap_or_default()
                )));
            }
        }

        Ok(())
    }
}

/// A viewport size, written `"WxH"` in configuration files and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FromStr for Resolution {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CrawlError::InvalidResolution(s.to_string());

        let (width, height) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;

        let width: u32 = width.trim().parse().map_err(|_| invalid())?;
        let height: u32 = height.trim().parse().map_err(|_| invalid())?;

        if width == 0 || height == 0 {
            return Err(invalid());
        }

        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = CrawlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(resolution: Resolution) -> Self {
        resolution.to_string()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Handling of capture and link-extraction failures on a single page
///
/// Navigation failures always skip the page and filesystem failures always
/// end the crawl; this only governs the failures in between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageErrorPolicy {
    /// Record the page as skipped and keep crawling
    #[default]
    Skip,
    /// Stop the whole crawl with the error
    Abort,
}

impl FromStr for PageErrorPolicy {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(CrawlError::ConfigurationError(format!(
                "Unknown page error policy '{other}' (expected skip or abort)"
            ))),
        }
    }
}

/// A fresh Chrome profile directory under the system temp dir, unique per run
pub fn profile_directory() -> PathBuf {
    std::env::temp_dir().join(format!(
        "crawlshot-{}-{}",
        std::process::id(),
        uuid::Uuid::new_v4()
    ))
}

/// Generate Chrome command-line arguments based on configuration
///
/// The initial window matches the first configured resolution; each capture
/// overrides the viewport anyway. Chrome keeps its profile in `profile_dir`,
/// which the caller owns and removes.
pub fn get_chrome_args(config: &Config, profile_dir: &Path) -> Vec<String> {
    let window = config
        .resolutions
        .first()
        .copied()
        .unwrap_or(Resolution::new(1920, 1080));

    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--hide-scrollbars".to_string(),
        format!("--window-size={},{}", window.width, window.height),
        format!("--user-data-dir={}", profile_dir.display()),
    ];

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args
}

pub fn create_browser_config(
    config: &Config,
    profile_dir: &Path,
) -> Result<chromiumoxide::browser::BrowserConfig, CrawlError> {
    use chromiumoxide::browser::BrowserConfig;

    let mut builder = BrowserConfig::builder().args(get_chrome_args(config, profile_dir));

    if !config.headless {
        builder = builder.with_head();
    }

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build().map_err(CrawlError::BrowserLaunchFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parsing() {
        assert_eq!("800x600".parse::<Resolution>().unwrap(), Resolution::new(800, 600));
        assert_eq!(" 1024 X 768 ".parse::<Resolution>().unwrap(), Resolution::new(1024, 768));
        assert!("800".parse::<Resolution>().is_err());
        assert!("0x600".parse::<Resolution>().is_err());
        assert!("800x".parse::<Resolution>().is_err());
        assert!("wide x tall".parse::<Resolution>().is_err());
        assert!("-800x600".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_resolution_display() {
        assert_eq!(Resolution::new(375, 667).to_string(), "375x667");
    }

    #[test]
    fn test_config_json_uses_compact_resolutions() {
        let json = r#"{
            "seed_url": "https://example.com/docs/",
            "resolutions": ["1024x768", "800x600"],
            "page_error_policy": "abort"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.resolutions,
            vec![Resolution::new(1024, 768), Resolution::new(800, 600)]
        );
        assert_eq!(config.page_error_policy, PageErrorPolicy::Abort);
        assert_eq!(config.navigation_timeout, Duration::from_secs(30));

        let round = serde_json::to_value(&config).unwrap();
        assert_eq!(round["resolutions"][0], "1024x768");
    }

    #[test]
    fn test_config_rejects_bad_resolution_in_json() {
        let json = r#"{ "resolutions": ["big"] }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn test_crawl_domain_defaults_to_seed_host() {
        let config = Config {
            seed_url: "https://docs.example.com/guide/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.crawl_domain().unwrap(), "docs.example.com");
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let no_resolutions = Config {
            resolutions: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            no_resolutions.validate(),
            Err(CrawlError::ConfigurationError(_))
        ));

        let relative_seed = Config {
            seed_url: "/docs".to_string(),
            ..Default::default()
        };
        assert!(matches!(relative_seed.validate(), Err(CrawlError::InvalidUrl(_))));

        let ftp_seed = Config {
            seed_url: "ftp://example.com/".to_string(),
            ..Default::default()
        };
        assert!(ftp_seed.validate().is_err());

        let mismatched_domain = Config {
            domain: Some("other.com".to_string()),
            ..Default::default()
        };
        assert!(mismatched_domain.validate().is_err());

        let zero_timeout = Config {
            navigation_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_page_error_policy_parsing() {
        assert_eq!("skip".parse::<PageErrorPolicy>().unwrap(), PageErrorPolicy::Skip);
        assert_eq!("ABORT".parse::<PageErrorPolicy>().unwrap(), PageErrorPolicy::Abort);
        assert!("retry".parse::<PageErrorPolicy>().is_err());
    }

    #[test]
    fn test_chrome_args_generation() {
        let config = Config {
            resolutions: vec![Resolution::new(800, 600)],
            user_agent: Some("crawlshot-test".to_string()),
            ..Default::default()
        };
        let profile = PathBuf::from("/tmp/crawlshot-profile");
        let args = get_chrome_args(&config, &profile);

        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--window-size=800,600".to_string()));
        assert!(args.contains(&"--user-agent=crawlshot-test".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/crawlshot-profile".to_string()));
    }

    #[test]
    fn test_profile_directories_are_unique() {
        let first = profile_directory();
        let second = profile_directory();

        assert_ne!(first, second);
        assert!(first.starts_with(std::env::temp_dir()));
    }
}
