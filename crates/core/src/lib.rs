pub mod config;
pub mod error;
pub mod message;
pub mod paths;
pub mod types;

pub use config::{Config, ScreenshotMode};
pub use error::{Error, Result};
pub use message::{
    BridgeRequest, BridgeResponse, ElementRect, PageAnalysis, PageDimensions, ResponsePayload,
};
pub use paths::Paths;
pub use types::{
    AriaIssue, AssessmentPatterns, BackendAssessment, Category, ComplianceAssessment,
    ContrastIssue, HeadingIssue, ImageIssue, InputIssue, IssueReport, LinkIssue, ReportEntry,
    RiskEntry, Severity, Tier, WcagLevel,
};
