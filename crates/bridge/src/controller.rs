//! One analysis session: scan, highlight, capture, then the backend with a
//! client-only fallback.
//!
//! `run` borrows the controller mutably, so a second analysis cannot start
//! while one is in flight.

use a11ylens_core::{
    BackendAssessment, BridgeRequest, Error, Paths, ResponsePayload, Result, WcagLevel,
};
use a11ylens_report::{build_report, ReportRequest};
use a11ylens_scanner::LocalAnalysis;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::agent::PageAgent;

/// URL schemes that belong to the browser itself.
pub const RESTRICTED_PREFIXES: &[&str] = &["chrome://", "edge://", "chrome-extension://", "about:"];

pub fn is_restricted_url(url: &str) -> bool {
    RESTRICTED_PREFIXES.iter().any(|p| url.starts_with(p))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Analyzing,
    Complete,
    Partial,
    Failed(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => write!(f, "Ready"),
            Status::Analyzing => write!(f, "Analyzing page..."),
            Status::Complete => write!(f, "✓ Analysis complete!"),
            Status::Partial => write!(f, "⚠ Partial analysis (client-side only)"),
            Status::Failed(msg) => write!(f, "✗ {}", msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub url: String,
    pub title: String,
    pub level: WcagLevel,
    pub local: LocalAnalysis,
    pub highlighted: usize,
    pub screenshot: Option<String>,
    pub backend: Option<BackendAssessment>,
    /// Why the backend step was skipped or failed.
    pub backend_error: Option<String>,
}

impl AnalysisOutcome {
    pub fn is_partial(&self) -> bool {
        self.backend.is_none()
    }

    /// Render the self-contained HTML report for this outcome.
    pub fn render_report(&self) -> String {
        let mut request = ReportRequest::new(
            &self.url,
            &self.title,
            &self.local.issues,
            self.level,
        );
        request.screenshot = self.screenshot.as_deref();
        request.backend = self.backend.as_ref();
        request.insights = Some(&self.local.insights);
        request.advisories = &self.local.advisories;
        build_report(&request)
    }

    /// Write the report under the reports directory as `<stem>.html`.
    pub fn save_report(&self, paths: &Paths, stem: &str) -> Result<PathBuf> {
        let path = paths.report_file(stem);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.render_report())?;
        info!(path = %path.display(), "Report written");
        Ok(path)
    }
}

pub struct AnalysisController<'a> {
    agent: PageAgent<'a>,
    status: Status,
    current: Option<AnalysisOutcome>,
}

impl<'a> AnalysisController<'a> {
    pub fn new(agent: PageAgent<'a>) -> Self {
        Self {
            agent,
            status: Status::Idle,
            current: None,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn current(&self) -> Option<&AnalysisOutcome> {
        self.current.as_ref()
    }

    /// Analyze the page at `url`. The previous outcome is discarded on entry.
    pub async fn run(&mut self, url: &str) -> Result<&AnalysisOutcome> {
        self.current = None;
        if is_restricted_url(url) {
            let err = Error::Restricted(url.to_string());
            self.status = Status::Failed(err.to_string());
            return Err(err);
        }

        self.status = Status::Analyzing;
        match self.analyze().await {
            Ok(outcome) => {
                self.status = if outcome.is_partial() {
                    Status::Partial
                } else {
                    Status::Complete
                };
                info!(
                    url = %outcome.url,
                    total = outcome.local.issues.total(),
                    partial = outcome.is_partial(),
                    "Analysis finished"
                );
                Ok(self.current.insert(outcome))
            }
            Err(e) => {
                self.status = Status::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn analyze(&self) -> Result<AnalysisOutcome> {
        let resp = self.agent.handle(BridgeRequest::AnalyzePage).await;
        let page = match resp.data {
            Some(ResponsePayload::Analysis(page)) if resp.success => page,
            _ => {
                return Err(Error::PageUnavailable(
                    resp.error.unwrap_or_else(|| "no response from page".to_string()),
                ))
            }
        };
        let issues = page.client_checks;

        let resp = self
            .agent
            .handle(BridgeRequest::HighlightElements {
                issues: issues.clone(),
            })
            .await;
        let highlighted = match resp.data {
            Some(ResponsePayload::Highlighted { count }) => count,
            _ => {
                warn!(error = ?resp.error, "Highlighting failed, continuing");
                0
            }
        };

        let resp = self.agent.handle(BridgeRequest::CaptureFullPageScreenshot).await;
        let screenshot = match resp.data {
            Some(ResponsePayload::Screenshot { screenshot }) => screenshot,
            _ => None,
        };

        let resp = self
            .agent
            .handle(BridgeRequest::AnalyzeWithBackend {
                html: page.html.clone(),
                url: page.url.clone(),
                title: page.title.clone(),
                level: self.agent.level(),
                screenshot: screenshot.clone(),
            })
            .await;
        let (backend, backend_error) = match resp.data {
            Some(ResponsePayload::Backend(assessment)) => (Some(assessment), None),
            _ => {
                let reason = resp.error.unwrap_or_else(|| "API not available".to_string());
                warn!(reason = %reason, "Backend analysis unavailable, using client-side results");
                (None, Some(reason))
            }
        };

        Ok(AnalysisOutcome {
            local: LocalAnalysis::from_report(&page.html, issues, self.agent.level()),
            url: page.url,
            title: page.title,
            level: self.agent.level(),
            highlighted,
            screenshot,
            backend,
            backend_error,
        })
    }

    /// Clear page markers and forget the current outcome.
    pub async fn reset(&mut self) -> Result<()> {
        let resp = self.agent.handle(BridgeRequest::RemoveHighlights).await;
        self.current = None;
        self.status = Status::Idle;
        if resp.success {
            Ok(())
        } else {
            Err(Error::Browser(resp.error.unwrap_or_default()))
        }
    }
}
