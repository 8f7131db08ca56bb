use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CrawlError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Screenshot capture failed: {0}")]
    CaptureFailed(String),

    #[error("Link extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid resolution '{0}' (expected WxH, e.g. 1024x768)")]
    InvalidResolution(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CrawlError {
    /// Errors confined to the page being processed; everything else ends the crawl.
    pub fn is_page_local(&self) -> bool {
        matches!(
            self,
            CrawlError::Navigation { .. }
                | CrawlError::Timeout(_)
                | CrawlError::CaptureFailed(_)
                | CrawlError::ExtractionFailed(_)
        )
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CrawlError::Navigation { .. } => ErrorSeverity::Low,
            CrawlError::Timeout(_) => ErrorSeverity::Low,
            CrawlError::ConfigurationError(_) => ErrorSeverity::High,
            CrawlError::BrowserLaunchFailed(_) => ErrorSeverity::High,
            CrawlError::Io(_) => ErrorSeverity::High,
            _ => ErrorSeverity::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
}

/// Why a discovered link was kept out of the frontier
///
/// Rejections are an expected outcome of admission, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    IllegalPattern(&'static str),
    Unresolvable(String),
    ForeignDomain(String),
    OutsideSeed,
    AlreadyVisited,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty href"),
            Rejection::IllegalPattern(pattern) => write!(f, "contains '{pattern}'"),
            Rejection::Unresolvable(reason) => write!(f, "unresolvable: {reason}"),
            Rejection::ForeignDomain(host) => write!(f, "foreign host '{host}'"),
            Rejection::OutsideSeed => write!(f, "outside the seed subtree"),
            Rejection::AlreadyVisited => write!(f, "already visited"),
        }
    }
}

impl From<std::io::Error> for CrawlError {
    fn from(err: std::io::Error) -> Self {
        CrawlError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CrawlError {
    fn from(err: serde_json::Error) -> Self {
        CrawlError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_local_errors() {
        assert!(CrawlError::Navigation {
            url: "https://example.com/file.zip".to_string(),
            reason: "net::ERR_ABORTED".to_string(),
        }
        .is_page_local());
        assert!(CrawlError::Timeout(Duration::from_secs(30)).is_page_local());
        assert!(CrawlError::CaptureFailed("test".to_string()).is_page_local());
        assert!(CrawlError::ExtractionFailed("test".to_string()).is_page_local());
        assert!(!CrawlError::Io("disk full".to_string()).is_page_local());
        assert!(!CrawlError::ConfigurationError("test".to_string()).is_page_local());
    }

    #[test]
    fn test_error_severity() {
        assert_eq!(CrawlError::Timeout(Duration::from_secs(1)).severity(), ErrorSeverity::Low);
        assert_eq!(CrawlError::CaptureFailed("test".to_string()).severity(), ErrorSeverity::Medium);
        assert_eq!(CrawlError::Io("test".to_string()).severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_io_error_conversion() {
        let err: CrawlError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, CrawlError::Io(ref msg) if msg.contains("denied")));
    }
}
