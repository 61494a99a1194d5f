//! Launches a Chromium-family browser with remote debugging enabled and
//! attaches a CDP client to its first page target.

use a11ylens_core::config::BrowserConfig;
use a11ylens_core::{Error, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::cdp::CdpClient;

const CDP_READY_TIMEOUT_SECS: u64 = 15;
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BrowserSession {
    pub debug_port: u16,
    pub user_data_dir: PathBuf,
    pub headed: bool,
    pub cdp: CdpClient,
    process: Child,
}

impl BrowserSession {
    pub async fn launch(config: &BrowserConfig, user_data_dir: &Path) -> Result<Self> {
        let browser_path = match &config.binary {
            Some(path) => path.clone(),
            None => find_browser_binary().ok_or_else(|| {
                Error::Browser(
                    "No Chrome, Chromium or Edge found. Install one or set browser.binary"
                        .to_string(),
                )
            })?,
        };

        std::fs::create_dir_all(user_data_dir)?;
        let debug_port = find_free_port().await?;
        let args = build_browser_args(config, debug_port, user_data_dir);

        info!(
            port = debug_port,
            headed = config.headed,
            browser = %browser_path,
            "Launching browser"
        );

        let process = Command::new(&browser_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Browser(format!("Failed to launch {}: {}", browser_path, e)))?;

        wait_for_cdp_ready(debug_port, CDP_READY_TIMEOUT_SECS).await?;
        let page_ws_url = get_page_ws_url(debug_port).await?;
        let cdp = CdpClient::connect(&page_ws_url).await?;
        cdp.enable_domain("Page").await?;
        cdp.enable_domain("Runtime").await?;
        cdp.set_viewport(config.viewport_width, config.viewport_height)
            .await?;

        info!(ws_url = %page_ws_url, "CDP connection established");

        Ok(Self {
            debug_port,
            user_data_dir: user_data_dir.to_path_buf(),
            headed: config.headed,
            cdp,
            process,
        })
    }

    pub async fn open(&self, url: &str) -> Result<()> {
        info!(url = %url, "Opening page");
        self.cdp.navigate(url, NAVIGATION_TIMEOUT).await
    }

    pub async fn close(&mut self) {
        if let Err(e) = self.cdp.send_command("Browser.close", json!({})).await {
            debug!("CDP Browser.close failed (may already be closed): {}", e);
        }
        let _ = self.process.kill().await;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.process.start_kill();
    }
}

fn build_browser_args(config: &BrowserConfig, debug_port: u16, user_data_dir: &Path) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={}", debug_port),
        format!("--user-data-dir={}", user_data_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-extensions".to_string(),
        "--disable-sync".to_string(),
        "--disable-translate".to_string(),
        "--hide-scrollbars".to_string(),
        "--password-store=basic".to_string(),
    ];
    if !config.headed {
        args.push("--headless=new".to_string());
    }
    args.push(format!(
        "--window-size={},{}",
        config.viewport_width, config.viewport_height
    ));
    args.push("about:blank".to_string());
    args
}

/// Find a Chromium-family browser binary on this system.
pub fn find_browser_binary() -> Option<String> {
    let candidates: Vec<&str> = if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
            "microsoft-edge",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
        ]
    } else {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ]
    };

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
        if !candidate.contains('/') && !candidate.contains('\\') && which::which(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }
    None
}

async fn find_free_port() -> Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

/// Poll `/json/version` until the debugger endpoint answers.
async fn wait_for_cdp_ready(port: u16, timeout_secs: u64) -> Result<String> {
    let start = std::time::Instant::now();
    let timeout = Duration::from_secs(timeout_secs);
    let url = format!("http://127.0.0.1:{}/json/version", port);

    loop {
        if start.elapsed() > timeout {
            return Err(Error::Timeout(format!(
                "Browser CDP not ready after {}s on port {}",
                timeout_secs, port
            )));
        }
        if let Ok(resp) = reqwest::get(&url).await {
            if let Ok(body) = resp.json::<Value>().await {
                if let Some(ws_url) = body.get("webSocketDebuggerUrl").and_then(|v| v.as_str()) {
                    return Ok(ws_url.to_string());
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// First `page` target's WebSocket URL from `/json/list`.
async fn get_page_ws_url(port: u16) -> Result<String> {
    let url = format!("http://127.0.0.1:{}/json/list", port);

    for attempt in 0..10 {
        if attempt > 0 {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        let Ok(resp) = reqwest::get(&url).await else {
            continue;
        };
        let Ok(targets) = resp.json::<Vec<Value>>().await else {
            continue;
        };
        if let Some(ws_url) = first_page_target(&targets) {
            return Ok(ws_url);
        }
    }
    Err(Error::Browser("No page target found after retries".to_string()))
}

fn first_page_target(targets: &[Value]) -> Option<String> {
    targets
        .iter()
        .filter(|t| t.get("type").and_then(|v| v.as_str()) == Some("page"))
        .find_map(|t| t.get("webSocketDebuggerUrl").and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_args_by_default() {
        let config = BrowserConfig::default();
        let args = build_browser_args(&config, 9333, Path::new("/tmp/profile"));
        assert!(args.contains(&"--remote-debugging-port=9333".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--window-size=1280,720".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("about:blank"));
    }

    #[test]
    fn test_headed_args_skip_headless() {
        let config = BrowserConfig {
            headed: true,
            ..BrowserConfig::default()
        };
        let args = build_browser_args(&config, 1, Path::new("/tmp/p"));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
    }

    #[test]
    fn test_first_page_target_skips_workers() {
        let targets = vec![
            json!({"type": "service_worker", "webSocketDebuggerUrl": "ws://w"}),
            json!({"type": "page", "webSocketDebuggerUrl": "ws://p"}),
        ];
        assert_eq!(first_page_target(&targets).as_deref(), Some("ws://p"));
        assert!(first_page_target(&[]).is_none());
    }

    #[tokio::test]
    async fn test_find_free_port() {
        let port = find_free_port().await.unwrap();
        assert!(port > 0);
    }
}
