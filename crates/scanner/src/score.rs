//! Heuristic compliance scoring. The score is a linear count penalty; the
//! category buckets only affect how findings are presented.

use a11ylens_core::{
    AssessmentPatterns, Category, ComplianceAssessment, IssueReport, RiskEntry, Severity, Tier,
};

/// Fixed bucket assignment per category: (high risk?, severity, impact).
fn classify(category: Category) -> (bool, Severity, &'static str) {
    match category {
        Category::Images => (
            true,
            Severity::Critical,
            "Blind users cannot understand image content",
        ),
        Category::Inputs => (
            true,
            Severity::Critical,
            "Screen reader users cannot identify form fields",
        ),
        Category::Headings => (
            true,
            Severity::High,
            "Users cannot navigate page structure efficiently",
        ),
        Category::Links => (
            false,
            Severity::Medium,
            "Link purpose may be unclear to screen reader users",
        ),
        Category::Aria => (
            true,
            Severity::Critical,
            "Custom UI components may not be properly announced",
        ),
        Category::Contrast => (
            true,
            Severity::High,
            "Users with low vision cannot read text that blends into its background",
        ),
    }
}

pub fn compliance_score(total_issues: usize) -> u8 {
    (100 - total_issues.min(100)) as u8
}

pub fn tier_for(total_issues: usize, score: u8) -> Tier {
    if total_issues == 0 {
        Tier::Excellent
    } else if score >= 80 {
        Tier::Good
    } else if score >= 60 {
        Tier::Fair
    } else {
        Tier::Poor
    }
}

/// Plain-language summary line keyed on the issue count.
pub fn summary_line(total_issues: usize) -> String {
    match total_issues {
        0 => "Great job! Your page is accessible and easy for everyone to use.".to_string(),
        n if n < 5 => format!(
            "Your page has {} small issues. They're easy to fix and will help people with disabilities use your site better.",
            n
        ),
        n if n < 15 => format!(
            "Your page has {} issues that need attention. Fixing these will make your site usable for people who are blind, have low vision, or use keyboards instead of a mouse.",
            n
        ),
        n => format!(
            "Your page has {} issues that create barriers for people with disabilities. Let's fix these to make your site accessible to everyone.",
            n
        ),
    }
}

pub fn score(report: &IssueReport) -> ComplianceAssessment {
    let total = report.total();
    let mut high_risk_issues = Vec::new();
    let mut low_risk_issues = Vec::new();

    for category in Category::ALL {
        let count = report.count(category);
        if count == 0 {
            continue;
        }
        let (high_risk, severity, impact) = classify(category);
        let entry = RiskEntry {
            category,
            count,
            severity,
            impact: impact.to_string(),
        };
        if high_risk {
            high_risk_issues.push(entry);
        } else {
            low_risk_issues.push(entry);
        }
    }

    let patterns = AssessmentPatterns {
        total_issues: total,
        critical_issues: high_risk_issues.iter().map(|e| e.count).sum(),
        medium_issues: low_risk_issues.iter().map(|e| e.count).sum(),
        has_alt_text_issues: !report.images.is_empty(),
        has_label_issues: !report.inputs.is_empty(),
        has_structure_issues: !report.headings.is_empty(),
    };

    let compliance_score = compliance_score(total);
    ComplianceAssessment {
        high_risk_issues,
        low_risk_issues,
        compliance_score,
        patterns,
        tier: tier_for(total, compliance_score),
        summary: summary_line(total),
    }
}
