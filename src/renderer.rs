//! Rendering capability and its Chrome implementation
//!
//! The crawler only talks to a [`Renderer`]: a single stateful page handle that
//! can navigate, resize its viewport, rasterise the whole page and report the
//! anchors it currently shows. [`ChromeRenderer`] drives headless Chrome over
//! the DevTools protocol; tests substitute scripted fakes.

use crate::{create_browser_config, profile_directory, Config, CrawlError};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use url::Url;

/// JavaScript run in the page to list anchors in document order.
///
/// For HTML anchors `a.href` is already resolved against the document base.
/// SVG anchors expose an `SVGAnimatedString` instead, whose `baseVal` is the
/// raw attribute. Anchors without an `href` yield an empty string.
const ANCHOR_QUERY: &str = "Array.from(document.querySelectorAll('a')).map(a => [\
    typeof a.href === 'string' ? a.href : ((a.href && a.href.baseVal) || ''), \
    document.baseURI])";

/// One anchor as seen in the rendered DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorHref {
    /// The anchor's href as reported by the page
    pub raw: String,
    /// URL the href is resolved against
    pub base: Url,
}

/// A single page handle, owned exclusively by the crawl
///
/// Every call completes before the next one starts. The viewport set by
/// [`Renderer::set_viewport`] persists on the handle until changed again.
#[async_trait]
pub trait Renderer: Send {
    /// Load `url`, giving up after `limit`.
    async fn navigate(&mut self, url: &Url, limit: Duration) -> Result<(), CrawlError>;

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), CrawlError>;

    /// PNG of the whole scrollable page at the current viewport width.
    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>, CrawlError>;

    async fn current_title(&mut self) -> Result<String, CrawlError>;

    async fn query_anchor_hrefs(&mut self) -> Result<Vec<AnchorHref>, CrawlError>;
}

/// Headless Chrome with one reusable tab
pub struct ChromeRenderer {
    browser: Browser,
    handler: tokio::task::JoinHandle<Result<(), chromiumoxide::error::CdpError>>,
    page: Page,
    profile_dir: PathBuf,
}

impl ChromeRenderer {
    pub async fn launch(config: &Config) -> Result<Self, CrawlError> {
        let profile_dir = profile_directory();

        match Self::start(config, &profile_dir).await {
            Ok((browser, handler, page)) => {
                info!("Chrome renderer ready");
                Ok(Self {
                    browser,
                    handler,
                    page,
                    profile_dir,
                })
            }
            Err(e) => {
                remove_profile_directory(&profile_dir).await;
                Err(e)
            }
        }
    }

    async fn start(
        config: &Config,
        profile_dir: &Path,
    ) -> Result<
        (
            Browser,
            tokio::task::JoinHandle<Result<(), chromiumoxide::error::CdpError>>,
            Page,
        ),
        CrawlError,
    > {
        let browser_config = create_browser_config(config, profile_dir)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CrawlError::BrowserLaunchFailed(e.to_string()))?;

        // The handler is a Stream of DevTools events and must be polled for
        // any page command to complete
        let handler = tokio::spawn(async move {
            loop {
                match handler.next().await {
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        error!("Browser handler error: {}", e);
                        return Err(e);
                    }
                    None => {
                        debug!("Browser handler stream ended");
                        break;
                    }
                }
            }
            Ok(())
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlError::BrowserLaunchFailed(e.to_string()))?;

        Ok((browser, handler, page))
    }

    /// Best-effort return to an empty document after a failed navigation.
    async fn reset(&self) {
        if let Err(e) = self.page.goto("about:blank").await {
            debug!("Could not reset page to about:blank: {}", e);
        }
    }

    pub async fn close(mut self) {
        info!("Closing Chrome renderer...");
        let _ = self.page.close().await;
        if let Err(e) = self.browser.close().await {
            debug!("Browser close returned an error: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        remove_profile_directory(&self.profile_dir).await;
        info!("Chrome renderer closed");
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn navigate(&mut self, url: &Url, limit: Duration) -> Result<(), CrawlError> {
        let outcome = match timeout(limit, self.page.goto(url.as_str())).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(CrawlError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(CrawlError::Timeout(limit)),
        };

        if outcome.is_err() {
            self.reset().await;
        }

        outcome
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), CrawlError> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(width)
            .height(height)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(CrawlError::CaptureFailed)?;

        self.page
            .execute(params)
            .await
            .map_err(|e| CrawlError::CaptureFailed(e.to_string()))?;

        Ok(())
    }

    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>, CrawlError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        self.page
            .screenshot(params)
            .await
            .map_err(|e| CrawlError::CaptureFailed(e.to_string()))
    }

    async fn current_title(&mut self) -> Result<String, CrawlError> {
        self.page
            .get_title()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| CrawlError::ExtractionFailed(e.to_string()))
    }

    async fn query_anchor_hrefs(&mut self) -> Result<Vec<AnchorHref>, CrawlError> {
        let rows: Value = self
            .page
            .evaluate(ANCHOR_QUERY)
            .await
            .map_err(|e| CrawlError::ExtractionFailed(e.to_string()))?
            .into_value()
            .map_err(|e| CrawlError::ExtractionFailed(e.to_string()))?;

        parse_anchor_rows(rows)
    }
}

/// Decode the `[href, baseURI]` rows returned by the anchor query.
///
/// An href that is not a string is read as empty and later rejected by
/// admission; only a malformed row shape or base URI fails the page.
pub fn parse_anchor_rows(rows: Value) -> Result<Vec<AnchorHref>, CrawlError> {
    let rows = match rows {
        Value::Array(rows) => rows,
        other => {
            return Err(CrawlError::ExtractionFailed(format!(
                "expected an array of anchors, got {other}"
            )))
        }
    };

    rows.into_iter()
        .map(|row| {
            let (href, base) = match row {
                Value::Array(mut pair) if pair.len() == 2 => {
                    let base = pair.pop().unwrap_or_default();
                    let href = pair.pop().unwrap_or_default();
                    (href, base)
                }
                other => {
                    return Err(CrawlError::ExtractionFailed(format!(
                        "malformed anchor row {other}"
                    )))
                }
            };

            let raw = match href {
                Value::String(raw) => raw,
                _ => String::new(),
            };
            let base = base
                .as_str()
                .ok_or_else(|| CrawlError::ExtractionFailed(format!("base URI {base}")))
                .and_then(|b| {
                    Url::parse(b)
                        .map_err(|e| CrawlError::ExtractionFailed(format!("base URI {b}: {e}")))
                })?;

            Ok(AnchorHref { raw, base })
        })
        .collect()
}

/// Best-effort removal of a Chrome profile directory.
pub async fn remove_profile_directory(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => debug!("Removed Chrome profile {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove Chrome profile {}: {}", path.display(), e),
    }
}
