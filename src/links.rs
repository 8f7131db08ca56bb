//! Anchor discovery on the currently rendered page

use crate::{admit, CrawlError, Renderer};
use tracing::debug;
use url::Url;

/// Admitted links of the current page, in document order.
///
/// This is a snapshot of the DOM at call time; duplicates are kept and left
/// for the scheduler's visited check.
pub async fn extract_links<R>(renderer: &mut R, domain: &str) -> Result<Vec<Url>, CrawlError>
where
    R: Renderer + ?Sized,
{
    let anchors = renderer.query_anchor_hrefs().await?;
    let total = anchors.len();

    let admitted: Vec<Url> = anchors
        .into_iter()
        .filter_map(|anchor| match admit(&anchor.raw, &anchor.base, domain) {
            Ok(url) => {
                debug!("Admitted link {}", url);
                Some(url)
            }
            Err(rejection) => {
                debug!("Rejected link '{}': {}", anchor.raw, rejection);
                None
            }
        })
        .collect();

    debug!("Found {} anchors, {} admitted", total, admitted.len());
    Ok(admitted)
}
