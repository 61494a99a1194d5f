//! Viewport capture with a settle delay after every scroll.
//!
//! Multi-viewport mode visits up to `max_captures` scroll positions but only
//! the first frame is returned; frames are not stitched.

use a11ylens_core::config::ScanConfig;
use a11ylens_core::{Result, ScreenshotMode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::page::{evaluate_as, scroll_to, PageHandle};

#[derive(Debug, Clone, Copy)]
pub struct ScreenshotOptions {
    pub mode: ScreenshotMode,
    pub settle: Duration,
    pub max_captures: usize,
}

impl ScreenshotOptions {
    pub fn from_config(scan: &ScanConfig) -> Self {
        Self {
            mode: scan.screenshot,
            settle: scan.settle_delay(),
            max_captures: scan.capture_limit(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrollMetrics {
    viewport_height: f64,
    page_height: f64,
    scroll_x: f64,
    scroll_y: f64,
}

const METRICS_JS: &str = "({viewportHeight: window.innerHeight, \
    pageHeight: Math.max(document.body ? document.body.scrollHeight : 0, document.documentElement.scrollHeight), \
    scrollX: window.scrollX, scrollY: window.scrollY})";

/// Vertical scroll offsets to visit, starting at the top.
fn capture_offsets(viewport_height: f64, page_height: f64, max_captures: usize) -> Vec<f64> {
    let max_captures = max_captures.max(1);
    if viewport_height <= 0.0 {
        return vec![0.0];
    }
    let mut offsets = Vec::new();
    let mut y = 0.0;
    while offsets.len() < max_captures && (offsets.is_empty() || y < page_height) {
        offsets.push(y);
        y += viewport_height;
    }
    offsets
}

async fn capture_frames(
    page: &dyn PageHandle,
    options: &ScreenshotOptions,
    metrics: &ScrollMetrics,
) -> Result<Vec<String>> {
    let offsets = match options.mode {
        ScreenshotMode::Multi => capture_offsets(
            metrics.viewport_height,
            metrics.page_height,
            options.max_captures,
        ),
        _ => vec![0.0],
    };
    let mut frames = Vec::with_capacity(offsets.len());
    for y in offsets {
        scroll_to(page, 0.0, y).await?;
        tokio::time::sleep(options.settle).await;
        frames.push(page.capture_viewport().await?);
    }
    Ok(frames)
}

/// Capture the page. Any failure is logged and yields `None`.
pub async fn capture(page: &dyn PageHandle, options: &ScreenshotOptions) -> Option<String> {
    if options.mode == ScreenshotMode::Off {
        return None;
    }

    let metrics: ScrollMetrics = match evaluate_as(page, METRICS_JS).await {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "Could not read scroll metrics, skipping screenshot");
            return None;
        }
    };

    let result = capture_frames(page, options, &metrics).await;

    if let Err(e) = scroll_to(page, metrics.scroll_x, metrics.scroll_y).await {
        debug!(error = %e, "Failed to restore scroll position");
    }

    match result {
        Ok(frames) => {
            debug!(frames = frames.len(), "Screenshot captured");
            frames.into_iter().next()
        }
        Err(e) => {
            warn!(error = %e, "Screenshot capture failed, continuing without it");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::testing::FakePage;
    use serde_json::json;

    fn options(mode: ScreenshotMode) -> ScreenshotOptions {
        ScreenshotOptions {
            mode,
            settle: Duration::from_millis(1),
            max_captures: 3,
        }
    }

    fn long_page() -> FakePage {
        FakePage::with(vec![(
            "viewportHeight",
            json!({"viewportHeight": 700, "pageHeight": 5000, "scrollX": 0, "scrollY": 250}),
        )])
    }

    #[test]
    fn test_capture_offsets() {
        assert_eq!(capture_offsets(700.0, 5000.0, 3), vec![0.0, 700.0, 1400.0]);
        assert_eq!(capture_offsets(700.0, 900.0, 3), vec![0.0, 700.0]);
        assert_eq!(capture_offsets(700.0, 300.0, 3), vec![0.0]);
        assert_eq!(capture_offsets(0.0, 300.0, 3), vec![0.0]);
    }

    #[tokio::test]
    async fn test_off_mode_does_nothing() {
        let page = long_page();
        assert!(capture(&page, &options(ScreenshotMode::Off)).await.is_none());
        assert!(page.calls().is_empty());
    }

    #[tokio::test]
    async fn test_viewport_mode_scrolls_top_and_restores() {
        let page = long_page();
        let shot = capture(&page, &options(ScreenshotMode::Viewport)).await;
        assert_eq!(shot.as_deref(), Some("iVBORw0KGgo="));
        let calls = page.calls();
        assert_eq!(calls[1], "window.scrollTo(0, 0)");
        assert_eq!(calls[2], "<capture>");
        assert_eq!(calls.last().map(String::as_str), Some("window.scrollTo(0, 250)"));
    }

    #[tokio::test]
    async fn test_multi_mode_is_capped() {
        let page = long_page();
        let shot = capture(&page, &options(ScreenshotMode::Multi)).await;
        assert!(shot.is_some());
        let captures = page.calls().iter().filter(|c| *c == "<capture>").count();
        assert_eq!(captures, 3);
    }

    #[tokio::test]
    async fn test_capture_failure_yields_none() {
        let mut page = long_page();
        page.screenshot = None;
        assert!(capture(&page, &options(ScreenshotMode::Viewport)).await.is_none());
        assert_eq!(
            page.calls().last().map(String::as_str),
            Some("window.scrollTo(0, 250)")
        );
    }
}
