pub mod advisory;
pub mod contrast;
pub mod dom;
pub mod explain;
pub mod insights;
pub mod score;

pub use advisory::{advisory_checks, Advisory, AdvisoryKind};
pub use dom::{document_title, scan_document, ScanOptions};
pub use explain::{explain, Explanation, ExplanationSet, Recommendation};
pub use insights::{page_insights, PageInsights};
pub use score::score;

use a11ylens_core::{ComplianceAssessment, IssueReport, WcagLevel};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything derived locally from one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalAnalysis {
    pub issues: IssueReport,
    pub assessment: ComplianceAssessment,
    pub explanations: ExplanationSet,
    pub insights: PageInsights,
    /// Level AAA advisories. Not part of `issues` and never scored.
    #[serde(default)]
    pub advisories: Vec<Advisory>,
}

impl LocalAnalysis {
    /// Derive score, explanations, insights and advisories for an already
    /// scanned report.
    pub fn from_report(html: &str, issues: IssueReport, level: WcagLevel) -> Self {
        Self {
            assessment: score(&issues),
            explanations: explain(&issues),
            insights: page_insights(html),
            advisories: advisory_checks(html, level),
            issues,
        }
    }
}

pub fn analyze_html(html: &str, options: &ScanOptions) -> LocalAnalysis {
    let issues = scan_document(html, options);
    let analysis = LocalAnalysis::from_report(html, issues, options.level);
    info!(
        total = analysis.issues.total(),
        score = analysis.assessment.compliance_score,
        advisories = analysis.advisories.len(),
        tier = %analysis.assessment.tier,
        "Local analysis complete"
    );
    analysis
}
