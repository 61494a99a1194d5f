use serde::{Deserialize, Serialize};

use crate::types::{BackendAssessment, IssueReport, WcagLevel};

/// Actions exchanged between the page agent, the bridge and the UI session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BridgeRequest {
    AnalyzePage,
    AnalyzeWithBackend {
        html: String,
        url: String,
        title: String,
        level: WcagLevel,
        #[serde(default)]
        screenshot: Option<String>,
    },
    HighlightElements {
        issues: IssueReport,
    },
    RemoveHighlights,
    ScrollToElement {
        selector: String,
    },
    GetPageDimensions,
    CaptureFullPageScreenshot,
    /// Fixed scroll action in place of arbitrary script evaluation.
    ScrollTo {
        x: f64,
        y: f64,
    },
}

impl BridgeRequest {
    pub fn action(&self) -> &'static str {
        match self {
            BridgeRequest::AnalyzePage => "analyzePage",
            BridgeRequest::AnalyzeWithBackend { .. } => "analyzeWithBackend",
            BridgeRequest::HighlightElements { .. } => "highlightElements",
            BridgeRequest::RemoveHighlights => "removeHighlights",
            BridgeRequest::ScrollToElement { .. } => "scrollToElement",
            BridgeRequest::GetPageDimensions => "getPageDimensions",
            BridgeRequest::CaptureFullPageScreenshot => "captureFullPageScreenshot",
            BridgeRequest::ScrollTo { .. } => "scrollTo",
        }
    }
}

/// Page snapshot returned by `analyzePage`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub html: String,
    pub title: String,
    pub url: String,
    pub client_checks: IssueReport,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
    pub scroll_height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResponsePayload {
    Analysis(PageAnalysis),
    Backend(BackendAssessment),
    Highlighted { count: usize },
    Rect(ElementRect),
    Dimensions(PageDimensions),
    Screenshot { screenshot: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponsePayload>,
}

impl BridgeResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    pub fn with(data: ResponsePayload) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }
}
