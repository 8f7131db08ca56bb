//! Output path layout: `<root>/images/<hostname>/<path segments...>/<W>x<H>.png`
//!
//! Paths depend only on the URL string and the resolution, so re-running a
//! crawl overwrites the same files instead of creating new ones.

use crate::Resolution;
use std::path::{Path, PathBuf};
use url::Url;

/// Name of the directory created under the output root
pub const IMAGES_DIR: &str = "images";

/// Strip characters that are illegal in path components on common filesystems.
pub fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| !matches!(*c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .collect()
}

/// Directory that holds every screenshot of `url`.
///
/// The URL string is split on `/`; empty segments and the scheme are dropped,
/// the hostname is used verbatim and every later segment is sanitized.
/// Segments that sanitize to nothing, `.` or `..` are skipped, so the result
/// always stays under `<root>/images/<hostname>`.
pub fn build_directory(url: &Url, root: &Path) -> PathBuf {
    let mut segments = url
        .as_str()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| !matches!(*segment, "https:" | "http:"));

    let mut directory = root.join(IMAGES_DIR);

    if let Some(hostname) = segments.next() {
        directory.push(hostname);
    }

    for segment in segments {
        let sanitized = sanitize_segment(segment);
        if !matches!(sanitized.as_str(), "" | "." | "..") {
            directory.push(sanitized);
        }
    }

    directory
}

pub fn screenshot_filename(resolution: Resolution) -> String {
    format!("{}x{}.png", resolution.width, resolution.height)
}

pub fn output_path(url: &Url, resolution: Resolution, root: &Path) -> PathBuf {
    build_directory(url, root).join(screenshot_filename(resolution))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("about"), "about");
        assert_eq!(sanitize_segment("search?q=a|b"), "searchq=ab");
        assert_eq!(sanitize_segment("a<b>c:\"d\"*"), "abcd");
        assert_eq!(sanitize_segment("tab\there\u{1}"), "tabhere");
    }

    #[test]
    fn test_root_page_directory() {
        let dir = build_directory(&url("https://example.com/"), Path::new("/out"));
        assert_eq!(dir, PathBuf::from("/out/images/example.com"));
    }

    #[test]
    fn test_nested_page_directory() {
        let dir = build_directory(&url("https://example.com/docs/setup/"), Path::new("out"));
        assert_eq!(dir, PathBuf::from("out/images/example.com/docs/setup"));
    }

    #[test]
    fn test_query_characters_are_stripped() {
        let dir = build_directory(&url("https://example.com/search?q=a*b"), Path::new("out"));
        assert_eq!(dir, PathBuf::from("out/images/example.com/searchq=ab"));
    }

    #[test]
    fn test_segments_sanitized_into_dot_segments_are_skipped() {
        let page = url("https://example.com/.|./.:./.*./x/pwned");
        let path = output_path(&page, Resolution::new(800, 600), Path::new("out"));

        assert_eq!(path, PathBuf::from("out/images/example.com/x/pwned/800x600.png"));
        assert!(path
            .components()
            .all(|c| !matches!(c, std::path::Component::ParentDir | std::path::Component::CurDir)));
    }

    #[test]
    fn test_http_scheme_is_dropped() {
        let dir = build_directory(&url("http://example.com/a"), Path::new("out"));
        assert_eq!(dir, PathBuf::from("out/images/example.com/a"));
    }

    #[test]
    fn test_output_path_is_deterministic() {
        let page = url("https://example.com/a");
        let resolution = Resolution::new(800, 600);

        let first = output_path(&page, resolution, Path::new("out"));
        let second = output_path(&page, resolution, Path::new("out"));

        assert_eq!(first, second);
        assert_eq!(first, PathBuf::from("out/images/example.com/a/800x600.png"));
    }

    #[test]
    fn test_screenshot_filename() {
        assert_eq!(screenshot_filename(Resolution::new(1024, 768)), "1024x768.png");
    }
}
