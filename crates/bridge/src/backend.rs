//! HTTP client for the remote analysis backend.
//!
//! Endpoint discovery checks each candidate base URL once against
//! `/api/health`; there are no other retries. Every request carries its own
//! timeout and a timeout is reported as a failure.

use a11ylens_core::config::BackendConfig;
use a11ylens_core::{BackendAssessment, Error, Result, WcagLevel};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("a11ylens/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub html: String,
    pub url: String,
    pub title: String,
    pub level: WcagLevel,
    /// Serialized as `null` when absent.
    pub screenshot: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MobileAnalyzeRequest {
    pub app_name: String,
    pub package_name: String,
    pub level: WcagLevel,
    pub view_hierarchy_json: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_requested: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MobileAnalyzeResult {
    /// Absolute report URL, resolved against the backend base.
    pub report_url: String,
    pub app_name: Option<String>,
    pub package_name: Option<String>,
    pub total_issues: Option<u64>,
}

pub struct BackendClient {
    http: reqwest::Client,
    candidates: Vec<String>,
    health_timeout: Duration,
    analyze_timeout: Duration,
    auth_token: Option<String>,
}

fn map_reqwest(e: reqwest::Error, what: &str, timeout: Duration) -> Error {
    if e.is_timeout() {
        Error::Timeout(format!("{} timed out after {}s", what, timeout.as_secs()))
    } else if e.is_connect() {
        Error::Http(format!("{}: connection failed: {}", what, e))
    } else {
        Error::Http(format!("{}: {}", what, e))
    }
}

fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}

/// Resolve a report location (absolute, rooted or bare file name) against a base URL.
pub fn report_url(base: &str, report: &str) -> String {
    if report.starts_with("http://") || report.starts_with("https://") {
        return report.to_string();
    }
    if report.starts_with('/') {
        return format!("{}{}", trim_base(base), report);
    }
    format!("{}/reports/{}", trim_base(base), report)
}

/// Accepts both `{success, data: {...}}` and the bare `{ai_ml_enabled, ...}` shape.
pub fn normalize_response(value: Value) -> Result<BackendAssessment> {
    let data = match value.get("success").and_then(|v| v.as_bool()) {
        Some(false) => {
            let msg = value
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("backend reported failure");
            return Err(Error::Backend(msg.to_string()));
        }
        Some(true) => value
            .get("data")
            .cloned()
            .ok_or_else(|| Error::Backend("response is missing 'data'".to_string()))?,
        None => value,
    };
    if !data.is_object() {
        return Err(Error::Backend("response data is not an object".to_string()));
    }

    let str_field = |key: &str| {
        data.get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Ok(BackendAssessment {
        ai_ml_enabled: data
            .get("ai_ml_enabled")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        ai_ml_results: data.get("ai_ml_results").cloned().unwrap_or(Value::Null),
        issues: data.get("issues").cloned(),
        total_issues: data.get("totalIssues").and_then(|v| v.as_u64()),
        report_path: str_field("reportPath"),
        report_url: str_field("reportUrl"),
    })
}

impl BackendClient {
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            candidates: config.candidate_urls.clone(),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
            analyze_timeout: Duration::from_secs(config.analyze_timeout_secs),
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn health(&self, base: &str) -> Result<()> {
        let url = format!("{}/api/health", trim_base(base));
        let resp = self
            .http
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| map_reqwest(e, "Health check", self.health_timeout))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::Backend(format!("Health check returned HTTP {}", resp.status())))
        }
    }

    /// First candidate whose health endpoint answers successfully.
    pub async fn discover(&self) -> Option<String> {
        for base in &self.candidates {
            match self.health(base).await {
                Ok(()) => {
                    info!(base = %base, "Backend available");
                    return Some(base.clone());
                }
                Err(e) => debug!(base = %base, error = %e, "Backend candidate unavailable"),
            }
        }
        warn!(
            candidates = self.candidates.len(),
            "No backend reachable, falling back to client-side analysis"
        );
        None
    }

    pub async fn analyze(&self, base: &str, request: &AnalyzeRequest) -> Result<BackendAssessment> {
        let url = format!("{}/api/analyze", trim_base(base));
        let resp = self
            .authorize(self.http.post(&url))
            .timeout(self.analyze_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| map_reqwest(e, "Analyze request", self.analyze_timeout))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Backend(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| map_reqwest(e, "Analyze response", self.analyze_timeout))?;
        normalize_response(body)
    }

    /// Discover a backend and run the analysis there.
    pub async fn analyze_with_discovery(
        &self,
        request: &AnalyzeRequest,
    ) -> Result<(String, BackendAssessment)> {
        let base = self
            .discover()
            .await
            .ok_or_else(|| Error::Backend("API not available".to_string()))?;
        let mut assessment = self.analyze(&base, request).await?;
        if assessment.report_url.is_none() {
            assessment.report_url = assessment
                .report_path
                .as_deref()
                .map(|path| report_url(&base, path));
        }
        Ok((base, assessment))
    }

    pub async fn download_report(&self, base: &str, report: &str, dest: &Path) -> Result<PathBuf> {
        self.download(&report_url(base, report), dest).await
    }

    /// Save the document at an absolute URL to `dest`.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        let resp = self
            .authorize(self.http.get(url))
            .timeout(self.analyze_timeout)
            .send()
            .await
            .map_err(|e| map_reqwest(e, "Report download", self.analyze_timeout))?;
        if !resp.status().is_success() {
            return Err(Error::NotFound(format!("{} (HTTP {})", url, resp.status())));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| map_reqwest(e, "Report download", self.analyze_timeout))?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, &bytes)?;
        Ok(dest.to_path_buf())
    }

    pub async fn mobile_analyze(
        &self,
        base: &str,
        request: &MobileAnalyzeRequest,
    ) -> Result<MobileAnalyzeResult> {
        let url = format!("{}/api/mobile/analyze", trim_base(base));
        let resp = self
            .authorize(self.http.post(&url))
            .timeout(self.analyze_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| map_reqwest(e, "Mobile analyze request", self.analyze_timeout))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Backend(format!("HTTP {}", status.as_u16())));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| map_reqwest(e, "Mobile analyze response", self.analyze_timeout))?;
        let data = body.get("data").cloned().unwrap_or(Value::Null);
        let report = data
            .get("reportUrl")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                Error::Backend("Analysis response missing report URL".to_string())
            })?;
        let text = |key: &str| data.get(key).and_then(|v| v.as_str()).map(str::to_string);
        Ok(MobileAnalyzeResult {
            report_url: report_url(base, report),
            app_name: text("appName"),
            package_name: text("packageName"),
            total_issues: data.get("totalIssues").and_then(|v| v.as_u64()),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    pub async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// A base URL nothing listens on.
    pub async fn dead_base() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    /// A base URL that accepts connections and never answers.
    pub async fn silent_base() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    pub fn healthy_router() -> Router {
        Router::new()
            .route("/api/health", get(|| async { Json(json!({"status": "ok"})) }))
            .route(
                "/api/analyze",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "success": true,
                        "data": {
                            "ai_ml_enabled": true,
                            "ai_ml_results": {"status": "AI/ML analysis completed", "echo_level": body["level"]},
                            "totalIssues": 2,
                            "reportPath": "report_1.html"
                        }
                    }))
                }),
            )
    }

    pub fn client_for(candidates: Vec<String>) -> BackendClient {
        let config = BackendConfig {
            candidate_urls: candidates,
            health_timeout_secs: 2,
            analyze_timeout_secs: 5,
            ..BackendConfig::default()
        };
        BackendClient::from_config(&config).unwrap()
    }

    fn request() -> AnalyzeRequest {
        AnalyzeRequest {
            html: "<html></html>".into(),
            url: "https://example.com".into(),
            title: "Example".into(),
            level: WcagLevel::Aa,
            screenshot: None,
        }
    }

    #[test]
    fn test_normalize_wrapped_and_bare() {
        let wrapped = normalize_response(json!({
            "success": true,
            "data": {"ai_ml_enabled": true, "ai_ml_results": {"a": 1}, "reportPath": "r.html"}
        }))
        .unwrap();
        assert!(wrapped.ai_ml_enabled);
        assert_eq!(wrapped.report_path.as_deref(), Some("r.html"));

        let bare = normalize_response(json!({"ai_ml_enabled": false, "ai_ml_results": {}})).unwrap();
        assert!(!bare.ai_ml_enabled);
        assert!(bare.report_path.is_none());

        let failed = normalize_response(json!({"success": false, "error": "bad html"}));
        assert!(matches!(failed, Err(Error::Backend(msg)) if msg == "bad html"));
        assert!(normalize_response(json!("nope")).is_err());
    }

    #[test]
    fn test_report_url_forms() {
        assert_eq!(
            report_url("http://localhost:5000/", "r.html"),
            "http://localhost:5000/reports/r.html"
        );
        assert_eq!(
            report_url("https://reports.example.org", "/reports/x.html"),
            "https://reports.example.org/reports/x.html"
        );
        assert_eq!(report_url("http://a", "https://b/c.html"), "https://b/c.html");
    }

    #[test]
    fn test_null_screenshot_serialized() {
        let value = serde_json::to_value(request()).unwrap();
        assert!(value["screenshot"].is_null());
        assert_eq!(value["level"], "AA");
    }

    #[tokio::test]
    async fn test_discovery_skips_dead_candidates() {
        let live = spawn_backend(healthy_router()).await;
        let client = client_for(vec![dead_base().await, live.clone()]);
        assert_eq!(client.discover().await, Some(live));
    }

    #[tokio::test]
    async fn test_all_candidates_dead_returns_promptly() {
        let client = client_for(vec![dead_base().await, dead_base().await]);
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            client.analyze_with_discovery(&request()),
        )
        .await
        .expect("discovery must not hang");
        assert!(matches!(result, Err(Error::Backend(_))));
    }

    #[tokio::test]
    async fn test_silent_backend_times_out() {
        let silent = silent_base().await;
        let config = BackendConfig {
            candidate_urls: vec![silent.clone()],
            health_timeout_secs: 1,
            ..BackendConfig::default()
        };
        let client = BackendClient::from_config(&config).unwrap();

        let health = client.health(&silent).await;
        assert!(matches!(health, Err(Error::Timeout(msg)) if msg.contains("after 1s")));

        let found = tokio::time::timeout(Duration::from_secs(5), client.discover())
            .await
            .expect("discovery must give up after the health timeout");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_analyze_round_trip() {
        let base = spawn_backend(healthy_router()).await;
        let client = client_for(vec![base.clone()]);
        let (found, assessment) = client.analyze_with_discovery(&request()).await.unwrap();
        assert_eq!(found, base);
        assert!(assessment.ai_ml_enabled);
        assert_eq!(assessment.total_issues, Some(2));
        assert_eq!(assessment.ai_ml_results["echo_level"], "AA");
        assert_eq!(
            assessment.report_url,
            Some(format!("{}/reports/report_1.html", base))
        );
    }

    #[tokio::test]
    async fn test_analyze_http_error() {
        let router = Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .route(
                "/api/analyze",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let base = spawn_backend(router).await;
        let err = client_for(vec![base.clone()])
            .analyze(&base, &request())
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::Backend(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_mobile_analyze_sends_token_and_resolves_url() {
        let router = Router::new().route(
            "/api/mobile/analyze",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({
                    "data": {
                        "reportUrl": "/reports/mobile_1.html",
                        "appName": body["app_name"],
                        "packageName": auth,
                        "totalIssues": 4
                    }
                }))
            }),
        );
        let base = spawn_backend(router).await;
        let config = BackendConfig {
            auth_token: Some("secret".into()),
            ..BackendConfig::default()
        };
        let client = BackendClient::from_config(&config).unwrap();
        let result = client
            .mobile_analyze(
                &base,
                &MobileAnalyzeRequest {
                    app_name: "Bank".into(),
                    package_name: "com.example.bank".into(),
                    level: WcagLevel::Aaa,
                    view_hierarchy_json: json!([{"className": "android.widget.Button"}]),
                    ai_requested: Some(false),
                },
            )
            .await
            .unwrap();
        assert_eq!(result.report_url, format!("{}/reports/mobile_1.html", base));
        assert_eq!(result.app_name.as_deref(), Some("Bank"));
        assert_eq!(result.package_name.as_deref(), Some("Bearer secret"));
        assert_eq!(result.total_issues, Some(4));
    }

    #[tokio::test]
    async fn test_mobile_analyze_missing_report_url() {
        let router = Router::new().route(
            "/api/mobile/analyze",
            post(|| async { Json(json!({"data": {}})) }),
        );
        let base = spawn_backend(router).await;
        let err = client_for(vec![])
            .mobile_analyze(
                &base,
                &MobileAnalyzeRequest {
                    app_name: "A".into(),
                    package_name: "p".into(),
                    level: WcagLevel::Aaa,
                    view_hierarchy_json: json!([]),
                    ai_requested: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing report URL"));
    }

    #[tokio::test]
    async fn test_download_report() {
        let router = Router::new().route(
            "/reports/r.html",
            get(|| async { "<html>report</html>" }),
        );
        let base = spawn_backend(router).await;
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("out/r.html");
        client_for(vec![])
            .download_report(&base, "r.html", &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "<html>report</html>");
    }
}
