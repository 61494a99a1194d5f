use a11ylens_core::{Category, Config, Paths, WcagLevel};
use a11ylens_report::{build_batch_report, build_report, ReportRequest, SiteSummary};
use a11ylens_scanner::{analyze_html, document_title, LocalAnalysis, ScanOptions};
use chrono::Utc;
use clap::ValueEnum;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("a11ylens/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

async fn fetch_html(client: &reqwest::Client, url: &str) -> anyhow::Result<String> {
    let resp = client.get(url).send().await?.error_for_status()?;
    Ok(resp.text().await?)
}

fn is_remote(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Scan a single file or URL.
pub async fn run(
    target: &str,
    level: Option<WcagLevel>,
    base_url: Option<String>,
    output: OutputFormat,
    report: Option<PathBuf>,
) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let level = level.unwrap_or(config.scan.level);

    let (html, base) = if is_remote(target) {
        let html = fetch_html(&http_client()?, target).await?;
        (html, Some(target.to_string()))
    } else {
        (std::fs::read_to_string(target)?, base_url)
    };

    let analysis = analyze_html(&html, &ScanOptions::new(base.as_deref(), level));

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Human => print_analysis(target, level, &analysis),
    }

    if let Some(path) = report {
        let title = document_title(&html).unwrap_or_else(|| target.to_string());
        write_report(&path, target, &title, level, &analysis)?;
        println!("✓ Report written to {}", path.display());
    }
    Ok(())
}

/// Scan every URL listed in a CSV file: one report per site plus a combined
/// index covering all of them.
pub async fn batch(csv_path: &Path, level: Option<WcagLevel>, out_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let level = level.unwrap_or(config.scan.level);
    let out_dir = out_dir.unwrap_or_else(|| paths.reports_dir());
    std::fs::create_dir_all(&out_dir)?;

    let urls = read_urls(std::fs::File::open(csv_path)?)?;
    if urls.is_empty() {
        println!("⚠ No URLs found in {}", csv_path.display());
        return Ok(());
    }

    let client = http_client()?;
    let mut sites = Vec::with_capacity(urls.len());
    println!("Scanning {} site(s) at WCAG {}", urls.len(), level);
    println!();

    for (i, url) in urls.iter().enumerate() {
        let html = match fetch_html(&client, url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed");
                println!("  ✗ {}: {}", url, e);
                sites.push(SiteSummary::failed(url, e.to_string()));
                continue;
            }
        };
        let analysis = analyze_html(&html, &ScanOptions::new(Some(url.as_str()), level));
        let title = document_title(&html);
        let file_name = format!("{}.html", report_stem(url, i + 1));
        let path = out_dir.join(&file_name);
        write_report(&path, url, title.as_deref().unwrap_or(url), level, &analysis)?;
        println!(
            "  ✓ {}  score {}/100 ({}), {} issue(s), {} advisories → {}",
            url,
            analysis.assessment.compliance_score,
            analysis.assessment.tier,
            analysis.issues.total(),
            analysis.advisories.len(),
            path.display()
        );
        sites.push(SiteSummary::scanned(url, title, &analysis, Some(file_name)));
    }

    let index = write_index(&out_dir, &sites, level)?;
    let failed = sites.iter().filter(|s| s.is_failed()).count();
    println!();
    println!("Scanned {}/{} site(s)", sites.len() - failed, urls.len());
    println!("✓ Combined report written to {}", index.display());
    info!(scanned = sites.len() - failed, failed, total = urls.len(), "Batch scan complete");
    Ok(())
}

/// Write the combined `accessibility_report_<timestamp>.html` index.
fn write_index(out_dir: &Path, sites: &[SiteSummary], level: WcagLevel) -> anyhow::Result<PathBuf> {
    let now = Utc::now();
    let path = out_dir.join(format!(
        "accessibility_report_{}.html",
        now.format("%Y%m%d_%H%M%S")
    ));
    std::fs::write(&path, build_batch_report(sites, level, now))?;
    Ok(path)
}

/// Values of the `url` column, blanks skipped.
pub fn read_urls<R: Read>(reader: R) -> anyhow::Result<Vec<String>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let column = rdr
        .headers()?
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("url"))
        .ok_or_else(|| anyhow::anyhow!("CSV has no 'url' column"))?;

    let mut urls = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(url) = record.get(column).map(str::trim).filter(|u| !u.is_empty()) {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

/// `003_example.com` style file stem for the n-th site.
pub fn report_stem(url: &str, n: usize) -> String {
    let host = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "site".to_string());
    let host: String = host
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("{:03}_{}", n, host)
}

fn write_report(
    path: &Path,
    url: &str,
    title: &str,
    level: WcagLevel,
    analysis: &LocalAnalysis,
) -> anyhow::Result<()> {
    let mut request = ReportRequest::new(url, title, &analysis.issues, level);
    request.insights = Some(&analysis.insights);
    request.advisories = &analysis.advisories;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, build_report(&request))?;
    Ok(())
}

pub(crate) fn print_analysis(target: &str, level: WcagLevel, analysis: &LocalAnalysis) {
    let assessment = &analysis.assessment;
    println!();
    println!("📋 {}", target);
    println!("  WCAG level: {}", level);
    println!(
        "  Score:      {}/100 ({})",
        assessment.compliance_score, assessment.tier
    );
    println!("  {}", assessment.summary);
    println!();

    for category in Category::ALL {
        let count = analysis.issues.count(category);
        let mark = if count == 0 { "✓" } else { "✗" };
        println!("  {} {:<28} {}", mark, category.label(), count);
    }
    println!("  {:<30} {}", "Total", analysis.issues.total());

    if !analysis.advisories.is_empty() {
        println!();
        println!("AAA advisories (not scored):");
        for advisory in &analysis.advisories {
            println!("  [{}] {}", advisory.kind.criterion(), advisory.message);
        }
    }

    if !analysis.explanations.explanations.is_empty() {
        println!();
        println!("Explanations:");
        for e in &analysis.explanations.explanations {
            println!("  [{}] {}", e.severity, e.issue);
            println!("      Fix: {}", e.fix);
            println!("      {}", e.wcag_reference);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_urls() {
        let csv = "name,URL\nHome, https://example.com \nBlank,\nShop,https://shop.example.com/a\n";
        let urls = read_urls(csv.as_bytes()).unwrap();
        assert_eq!(urls, vec!["https://example.com", "https://shop.example.com/a"]);
    }

    #[test]
    fn test_read_urls_requires_column() {
        let err = read_urls("name,site\na,b\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn test_report_stem() {
        assert_eq!(report_stem("https://www.example.com/page?q=1", 3), "003_www.example.com");
        assert_eq!(report_stem("not a url", 12), "012_site");
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/report.html");
        let html = r#"<html><body><img src="x.png"></body></html>"#;
        let analysis = analyze_html(html, &ScanOptions::new(None, WcagLevel::Aa));
        write_report(&path, "file://x", "Fixture", WcagLevel::Aa, &analysis).unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.starts_with("<!DOCTYPE html>") || body.contains("<html"));
        assert!(body.contains("Fixture"));
    }

    #[test]
    fn test_write_report_lists_advisories() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("aaa.html");
        let html = r#"<html><body><a href="/x">here</a></body></html>"#;
        let analysis = analyze_html(html, &ScanOptions::new(None, WcagLevel::Aaa));
        write_report(&path, "file://x", "Fixture", WcagLevel::Aaa, &analysis).unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.contains("Level AAA Advisory Checks"));
        assert!(body.contains("Link text &#39;here&#39; needs context"));
    }

    #[test]
    fn test_write_index() {
        let dir = tempfile::TempDir::new().unwrap();
        let analysis = analyze_html("<html><body></body></html>", &ScanOptions::default());
        let sites = vec![
            SiteSummary::scanned(
                "https://a.example",
                Some("A".into()),
                &analysis,
                Some("001_a.example.html".into()),
            ),
            SiteSummary::failed("https://b.example", "connection refused"),
        ];
        let path = write_index(dir.path(), &sites, WcagLevel::Aaa).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("accessibility_report_") && name.ends_with(".html"));
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.contains("001_a.example.html"));
        assert!(body.contains("connection refused"));
    }
}
