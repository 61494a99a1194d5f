//! Message routing between the analysis session, the page and the remote
//! backend.

pub mod agent;
pub mod backend;
pub mod controller;

pub use agent::PageAgent;
pub use backend::{
    normalize_response, report_url, AnalyzeRequest, BackendClient, MobileAnalyzeRequest,
    MobileAnalyzeResult,
};
pub use controller::{is_restricted_url, AnalysisController, AnalysisOutcome, Status};
