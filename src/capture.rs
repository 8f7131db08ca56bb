//! Multi-resolution screenshot capture for the page currently loaded

use crate::{build_directory, screenshot_filename, CrawlError, Filesystem, Renderer, Resolution};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Files written for one page, plus the error that stopped the sequence early
#[derive(Debug, Default)]
pub struct CaptureBatch {
    pub written: Vec<PathBuf>,
    pub failure: Option<CrawlError>,
}

/// Resize the viewport and rasterise the full page as PNG.
pub async fn capture<R>(renderer: &mut R, resolution: Resolution) -> Result<Vec<u8>, CrawlError>
where
    R: Renderer + ?Sized,
{
    renderer
        .set_viewport(resolution.width, resolution.height)
        .await?;

    let data = renderer.screenshot_full_page().await?;

    match image::guess_format(&data) {
        Ok(ImageFormat::Png) => Ok(data),
        Ok(other) => Err(CrawlError::CaptureFailed(format!(
            "expected PNG at {resolution}, got {other:?}"
        ))),
        Err(e) => Err(CrawlError::CaptureFailed(format!(
            "unrecognised image data at {resolution}: {e}"
        ))),
    }
}

/// Capture `url` at every resolution, in the given order, writing each image
/// as soon as it is produced.
///
/// Stops at the first failure; files written before it are kept and listed.
pub async fn capture_all<R, F>(
    renderer: &mut R,
    filesystem: &F,
    url: &Url,
    resolutions: &[Resolution],
    root: &Path,
) -> CaptureBatch
where
    R: Renderer + ?Sized,
    F: Filesystem + ?Sized,
{
    let mut batch = CaptureBatch {
        written: Vec::with_capacity(resolutions.len()),
        failure: None,
    };

    let directory = build_directory(url, root);
    if let Err(e) = filesystem.ensure_directory(&directory).await {
        batch.failure = Some(e);
        return batch;
    }

    for &resolution in resolutions {
        debug!("Capturing {} at {}", url, resolution);

        let data = match capture(renderer, resolution).await {
            Ok(data) => data,
            Err(e) => {
                batch.failure = Some(e);
                break;
            }
        };

        let path = directory.join(screenshot_filename(resolution));
        if let Err(e) = filesystem.write_file(&path, &data).await {
            batch.failure = Some(e);
            break;
        }
        info!("Saved screenshot: {} ({} bytes)", path.display(), data.len());

        batch.written.push(path);
    }

    batch
}
