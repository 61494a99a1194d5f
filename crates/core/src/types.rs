use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Fixed partition of accessibility checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Images,
    Inputs,
    Headings,
    Links,
    Aria,
    Contrast,
}

impl Category {
    /// Report and summary order.
    pub const ALL: [Category; 6] = [
        Category::Images,
        Category::Inputs,
        Category::Headings,
        Category::Links,
        Category::Aria,
        Category::Contrast,
    ];

    /// Marker drawing order. Contrast markers are drawn last.
    pub const HIGHLIGHT_ORDER: [Category; 6] = [
        Category::Images,
        Category::Inputs,
        Category::Links,
        Category::Headings,
        Category::Aria,
        Category::Contrast,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Inputs => "inputs",
            Category::Headings => "headings",
            Category::Links => "links",
            Category::Aria => "aria",
            Category::Contrast => "contrast",
        }
    }

    /// Selector whose match positions define an issue's `index`.
    pub fn selector(&self) -> &'static str {
        match self {
            Category::Images => "img",
            Category::Inputs => "input",
            Category::Headings => "h1, h2, h3, h4, h5, h6",
            Category::Links => "a",
            Category::Aria => "[role]",
            Category::Contrast => "[style]",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Images => "Images Missing Alt Text",
            Category::Inputs => "Form Inputs Without Labels",
            Category::Headings => "Heading Hierarchy Issues",
            Category::Links => "Link Issues",
            Category::Aria => "ARIA Issues",
            Category::Contrast => "Color Contrast Issues",
        }
    }

    /// Short caption shown next to a highlight badge.
    pub fn marker_label(&self) -> &'static str {
        match self {
            Category::Images => "Image Missing Alt",
            Category::Inputs => "Input Missing Label",
            Category::Headings => "Heading Hierarchy",
            Category::Links => "Link Issue",
            Category::Aria => "ARIA Issue",
            Category::Contrast => "Low Contrast",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageIssue {
    pub index: usize,
    pub src: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputIssue {
    pub index: usize,
    #[serde(rename = "type")]
    pub input_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeadingIssue {
    pub index: usize,
    pub level: u8,
    pub previous_level: u8,
    pub text: String,
    pub message: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkIssue {
    pub index: usize,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub message: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AriaIssue {
    pub index: usize,
    pub role: String,
    pub message: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContrastIssue {
    pub index: usize,
    pub ratio: f64,
    pub required: f64,
    pub text: String,
    pub style: String,
    pub snippet: String,
}

/// Per-category issue lists produced by one scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IssueReport {
    #[serde(default)]
    pub images: Vec<ImageIssue>,
    #[serde(default)]
    pub inputs: Vec<InputIssue>,
    #[serde(default)]
    pub headings: Vec<HeadingIssue>,
    #[serde(default)]
    pub links: Vec<LinkIssue>,
    #[serde(default)]
    pub aria: Vec<AriaIssue>,
    #[serde(default)]
    pub contrast: Vec<ContrastIssue>,
}

impl IssueReport {
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Images => self.images.len(),
            Category::Inputs => self.inputs.len(),
            Category::Headings => self.headings.len(),
            Category::Links => self.links.len(),
            Category::Aria => self.aria.len(),
            Category::Contrast => self.contrast.len(),
        }
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Element positions flagged in a category, in issue order.
    pub fn indices(&self, category: Category) -> Vec<usize> {
        match category {
            Category::Images => self.images.iter().map(|i| i.index).collect(),
            Category::Inputs => self.inputs.iter().map(|i| i.index).collect(),
            Category::Headings => self.headings.iter().map(|i| i.index).collect(),
            Category::Links => self.links.iter().map(|i| i.index).collect(),
            Category::Aria => self.aria.iter().map(|i| i.index).collect(),
            Category::Contrast => self.contrast.iter().map(|i| i.index).collect(),
        }
    }

    pub fn non_empty_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.count(*c) > 0)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskEntry {
    #[serde(rename = "type")]
    pub category: Category,
    pub count: usize,
    pub severity: Severity,
    pub impact: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssessmentPatterns {
    pub total_issues: usize,
    pub critical_issues: usize,
    pub medium_issues: usize,
    pub has_alt_text_issues: bool,
    pub has_label_issues: bool,
    pub has_structure_issues: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Tier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Excellent => "Excellent",
            Tier::Good => "Good",
            Tier::Fair => "Fair",
            Tier::Poor => "Poor",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived from an [`IssueReport`]; never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceAssessment {
    pub high_risk_issues: Vec<RiskEntry>,
    pub low_risk_issues: Vec<RiskEntry>,
    pub compliance_score: u8,
    pub patterns: AssessmentPatterns,
    pub tier: Tier,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum WcagLevel {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "AA")]
    Aa,
    #[serde(rename = "AAA")]
    #[default]
    Aaa,
}

impl WcagLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WcagLevel::A => "A",
            WcagLevel::Aa => "AA",
            WcagLevel::Aaa => "AAA",
        }
    }

    /// Minimum text contrast ratio checked at this level.
    pub fn min_contrast_ratio(&self) -> f64 {
        match self {
            WcagLevel::Aaa => 7.0,
            WcagLevel::A | WcagLevel::Aa => 4.5,
        }
    }
}

impl fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WcagLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(WcagLevel::A),
            "AA" => Ok(WcagLevel::Aa),
            "AAA" => Ok(WcagLevel::Aaa),
            other => Err(Error::Validation(format!(
                "unknown WCAG level '{}', expected A|AA|AAA",
                other
            ))),
        }
    }
}

/// Normalized result of a backend analysis, whichever response shape it arrived in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BackendAssessment {
    pub ai_ml_enabled: bool,
    #[serde(default)]
    pub ai_ml_results: serde_json::Value,
    #[serde(default)]
    pub issues: Option<serde_json::Value>,
    #[serde(default)]
    pub total_issues: Option<u64>,
    #[serde(default)]
    pub report_path: Option<String>,
    #[serde(default)]
    pub report_url: Option<String>,
}

/// One entry of the mobile report history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub title: String,
    pub package_name: String,
    pub report_url: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<u64>,
}

impl ReportEntry {
    pub fn new(title: &str, package_name: &str, report_url: &str, issues: Option<u64>) -> Self {
        Self {
            title: title.to_string(),
            package_name: package_name.to_string(),
            report_url: report_url.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> IssueReport {
        IssueReport {
            images: vec![ImageIssue {
                index: 2,
                src: "a.png".into(),
                snippet: "<img src=\"a.png\">".into(),
            }],
            headings: vec![HeadingIssue {
                index: 1,
                level: 3,
                previous_level: 1,
                text: "Deep".into(),
                message: "Heading level skipped from h1 to h3".into(),
                snippet: String::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_issue_report_counts() {
        let report = sample_report();
        assert_eq!(report.total(), 2);
        assert_eq!(report.count(Category::Images), 1);
        assert_eq!(report.indices(Category::Images), vec![2]);
        assert_eq!(
            report.non_empty_categories(),
            vec![Category::Images, Category::Headings]
        );
        assert!(IssueReport::default().is_empty());
    }

    #[test]
    fn test_issue_field_names_on_the_wire() {
        let json = serde_json::to_value(sample_report()).unwrap();
        assert_eq!(json["headings"][0]["previousLevel"], 1);
        let input = InputIssue {
            index: 0,
            input_type: "email".into(),
            id: None,
            name: Some("mail".into()),
            snippet: String::new(),
        };
        let value = serde_json::to_value(input).unwrap();
        assert_eq!(value["type"], "email");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_partial_report_deserializes() {
        let report: IssueReport =
            serde_json::from_str(r#"{"images":[{"index":0,"src":"x","snippet":"<img>"}]}"#)
                .unwrap();
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn test_wcag_level_parse_and_ratio() {
        assert_eq!("aa".parse::<WcagLevel>().unwrap(), WcagLevel::Aa);
        assert_eq!(WcagLevel::Aaa.min_contrast_ratio(), 7.0);
        assert_eq!(WcagLevel::A.min_contrast_ratio(), 4.5);
        assert_eq!(serde_json::to_string(&WcagLevel::Aaa).unwrap(), "\"AAA\"");
        assert!("AAAA".parse::<WcagLevel>().is_err());
    }

    #[test]
    fn test_highlight_order_differs_from_report_order() {
        assert_eq!(Category::HIGHLIGHT_ORDER[2], Category::Links);
        assert_eq!(Category::ALL[2], Category::Headings);
    }
}
