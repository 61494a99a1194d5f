//! Request dispatcher standing in for the in-page content script.
//!
//! Every `BridgeRequest` is answered with exactly one `BridgeResponse`; errors
//! never escape as `Err`, they become `{success: false, error}`.

use a11ylens_browser::{
    capture, dimensions, highlight, remove_highlights, scroll_to, scroll_to_element,
    snapshot_document, PageHandle, ScreenshotOptions,
};
use a11ylens_core::{
    BridgeRequest, BridgeResponse, Error, PageAnalysis, ResponsePayload, Result, WcagLevel,
};
use a11ylens_scanner::{scan_document, ScanOptions};
use tracing::{debug, warn};

use crate::backend::{AnalyzeRequest, BackendClient};

pub struct PageAgent<'a> {
    page: &'a dyn PageHandle,
    level: WcagLevel,
    screenshot: ScreenshotOptions,
    backend: Option<&'a BackendClient>,
}

impl<'a> PageAgent<'a> {
    pub fn new(page: &'a dyn PageHandle, level: WcagLevel, screenshot: ScreenshotOptions) -> Self {
        Self {
            page,
            level,
            screenshot,
            backend: None,
        }
    }

    /// Route `analyzeWithBackend` through this client.
    pub fn with_backend(mut self, backend: &'a BackendClient) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn level(&self) -> WcagLevel {
        self.level
    }

    pub async fn handle(&self, request: BridgeRequest) -> BridgeResponse {
        let action = request.action();
        debug!(action, "Bridge request");
        match self.dispatch(request).await {
            Ok(Some(payload)) => BridgeResponse::with(payload),
            Ok(None) => BridgeResponse::ok(),
            Err(e) => {
                warn!(action, error = %e, "Bridge request failed");
                BridgeResponse::failure(e.to_string())
            }
        }
    }

    async fn dispatch(&self, request: BridgeRequest) -> Result<Option<ResponsePayload>> {
        match request {
            BridgeRequest::AnalyzePage => {
                let doc = snapshot_document(self.page)
                    .await
                    .map_err(|e| Error::PageUnavailable(e.to_string()))?;
                let options = ScanOptions::new(Some(doc.url.as_str()), self.level);
                let client_checks = scan_document(&doc.html, &options);
                Ok(Some(ResponsePayload::Analysis(PageAnalysis {
                    html: doc.html,
                    title: doc.title,
                    url: doc.url,
                    client_checks,
                })))
            }
            BridgeRequest::AnalyzeWithBackend {
                html,
                url,
                title,
                level,
                screenshot,
            } => {
                let backend = self
                    .backend
                    .ok_or_else(|| Error::Backend("API not available".to_string()))?;
                let request = AnalyzeRequest {
                    html,
                    url,
                    title,
                    level,
                    screenshot,
                };
                let (_, assessment) = backend.analyze_with_discovery(&request).await?;
                Ok(Some(ResponsePayload::Backend(assessment)))
            }
            BridgeRequest::HighlightElements { issues } => {
                let count = highlight(self.page, &issues).await?;
                Ok(Some(ResponsePayload::Highlighted { count }))
            }
            BridgeRequest::RemoveHighlights => {
                remove_highlights(self.page).await?;
                Ok(None)
            }
            BridgeRequest::ScrollToElement { selector } => {
                let rect = scroll_to_element(self.page, &selector).await?;
                Ok(Some(ResponsePayload::Rect(rect)))
            }
            BridgeRequest::GetPageDimensions => {
                Ok(Some(ResponsePayload::Dimensions(dimensions(self.page).await?)))
            }
            BridgeRequest::CaptureFullPageScreenshot => {
                let screenshot = capture(self.page, &self.screenshot).await;
                Ok(Some(ResponsePayload::Screenshot { screenshot }))
            }
            BridgeRequest::ScrollTo { x, y } => {
                scroll_to(self.page, x, y).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use a11ylens_browser::PageHandle;
    use a11ylens_core::{Error, Result};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Scripted page keyed on fragments of the evaluated expression.
    pub struct ScriptedPage {
        pub rules: Vec<(&'static str, Value)>,
        pub screenshot: Option<String>,
        pub log: Mutex<Vec<String>>,
    }

    impl ScriptedPage {
        pub fn serving(html: &str, url: &str) -> Self {
            Self {
                rules: vec![
                    ("outerHTML", json!({"html": html, "title": "Fixture", "url": url})),
                    ("(plan, attr)", json!(2)),
                    ("old.length", json!(2)),
                    ("innerWidth", json!({"width": 1280, "height": 3000, "scrollHeight": 2990})),
                    (
                        "viewportHeight",
                        json!({"viewportHeight": 720, "pageHeight": 3000, "scrollX": 0, "scrollY": 40}),
                    ),
                    ("scrollIntoView", json!(true)),
                    ("r.left", json!({"x": 8, "y": 1200, "width": 100, "height": 20})),
                ],
                screenshot: Some("iVBORw0KGgo=".to_string()),
                log: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageHandle for ScriptedPage {
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

    /// A page whose agent never answers.
    pub struct DeadPage;

    #[async_trait]
    impl PageHandle for DeadPage {
        async fn evaluate(&self, _expression: &str) -> Result<Value> {
            Err(Error::Browser("target closed".to_string()))
        }

        async fn capture_viewport(&self) -> Result<String> {
            Err(Error::Browser("target closed".to_string()))
        }
    }
}
