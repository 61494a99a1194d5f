//! The page capability seam: everything above this trait talks to a page
//! only through script evaluation and viewport capture.

use a11ylens_core::{ElementRect, Error, PageDimensions, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::session::BrowserSession;

/// Wait after `scrollIntoView` before measuring the element.
pub const SCROLL_SETTLE: Duration = Duration::from_millis(500);

#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Evaluate an expression in the page and return its JSON value.
    async fn evaluate(&self, expression: &str) -> Result<Value>;

    /// Capture the visible viewport as base64 PNG.
    async fn capture_viewport(&self) -> Result<String>;
}

#[async_trait]
impl PageHandle for BrowserSession {
    async fn evaluate(&self, expression: &str) -> Result<Value> {
        self.cdp.evaluate(expression).await
    }

    async fn capture_viewport(&self) -> Result<String> {
        self.cdp.screenshot().await
    }
}

pub async fn evaluate_as<T: DeserializeOwned>(page: &dyn PageHandle, expression: &str) -> Result<T> {
    let value = page.evaluate(expression).await?;
    Ok(serde_json::from_value(value)?)
}

/// Serialized document plus title and location.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSnapshot {
    pub html: String,
    pub title: String,
    pub url: String,
}

pub async fn snapshot_document(page: &dyn PageHandle) -> Result<DocumentSnapshot> {
    evaluate_as(
        page,
        "({html: document.documentElement.outerHTML, title: document.title, url: location.href})",
    )
    .await
}

pub async fn dimensions(page: &dyn PageHandle) -> Result<PageDimensions> {
    evaluate_as(
        page,
        "({width: window.innerWidth, height: document.documentElement.scrollHeight, \
          scrollHeight: document.body ? document.body.scrollHeight : 0})",
    )
    .await
}

pub async fn scroll_to(page: &dyn PageHandle, x: f64, y: f64) -> Result<()> {
    if !x.is_finite() || !y.is_finite() {
        return Err(Error::Validation(format!("invalid scroll target ({}, {})", x, y)));
    }
    page.evaluate(&format!("window.scrollTo({}, {})", x, y))
        .await?;
    Ok(())
}

/// Scroll an element into the middle of the viewport, wait for layout to
/// settle, then report its document-relative rectangle.
pub async fn scroll_to_element(page: &dyn PageHandle, selector: &str) -> Result<ElementRect> {
    let sel = serde_json::to_string(selector)?;
    let found = page
        .evaluate(&format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
             el.scrollIntoView({{behavior: 'auto', block: 'center'}}); return true; }})()"
        ))
        .await?;
    if found != Value::Bool(true) {
        return Err(Error::NotFound(format!("Element not found: {}", selector)));
    }

    tokio::time::sleep(SCROLL_SETTLE).await;

    let rect = page
        .evaluate(&format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return null; \
             const r = el.getBoundingClientRect(); \
             return {{x: r.left + window.scrollX, y: r.top + window.scrollY, width: r.width, height: r.height}}; }})()"
        ))
        .await?;
    if rect.is_null() {
        return Err(Error::NotFound(format!("Element not found: {}", selector)));
    }
    Ok(serde_json::from_value(rect)?)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Scripted page: answers each evaluation from the first rule whose
    /// needle occurs in the expression.
    #[derive(Default)]
    pub struct FakePage {
        pub rules: Vec<(&'static str, Value)>,
        pub screenshot: Option<String>,
        pub log: Mutex<Vec<String>>,
    }

    impl FakePage {
        pub fn with(rules: Vec<(&'static str, Value)>) -> Self {
            Self {
                rules,
                screenshot: Some("iVBORw0KGgo=".to_string()),
                log: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageHandle for FakePage {
        async fn evaluate(&self, expression: &str) -> Result<Value> {
            self.log.lock().unwrap().push(expression.to_string());
            Ok(self
                .rules
                .iter()
                .find(|(needle, _)| expression.contains(needle))
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null))
        }

        async fn capture_viewport(&self) -> Result<String> {
            self.log.lock().unwrap().push("<capture>".to_string());
            self.screenshot
                .clone()
                .ok_or_else(|| Error::Browser("capture failed".to_string()))
        }
    }
}
