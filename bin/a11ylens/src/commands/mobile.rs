use a11ylens_bridge::{BackendClient, MobileAnalyzeRequest};
use a11ylens_core::{Config, Paths, ReportEntry, WcagLevel};
use a11ylens_storage::{MobilePrefs, PrefStore, ReportHistory};
use serde_json::Value;
use std::path::Path;

/// Env var consulted for the bearer token when none is saved.
const AUTH_TOKEN_ENV: &str = "A11YLENS_AUTH_TOKEN";

pub async fn analyze(
    hierarchy: &Path,
    app_name: &str,
    package: &str,
    level: Option<WcagLevel>,
    base_url: Option<String>,
    no_ai: bool,
) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let store = PrefStore::new(&paths);
    let prefs = MobilePrefs::load(&store)?;

    let view_hierarchy_json: Value = serde_json::from_str(&std::fs::read_to_string(hierarchy)?)?;
    if !view_hierarchy_json.is_array() {
        anyhow::bail!("View hierarchy must be a JSON array of nodes");
    }

    let base = base_url
        .or(prefs.base_url.clone())
        .unwrap_or_else(|| config.backend.mobile_base_url.clone());

    let mut backend = config.backend.clone();
    backend.auth_token = prefs
        .auth_token
        .clone()
        .or(backend.auth_token)
        .or_else(|| std::env::var(AUTH_TOKEN_ENV).ok());
    let client = BackendClient::from_config(&backend)?;

    let request = MobileAnalyzeRequest {
        app_name: app_name.to_string(),
        package_name: package.to_string(),
        level: level.unwrap_or(config.scan.level),
        view_hierarchy_json,
        ai_requested: ai_flag(prefs.ai_enabled && !no_ai),
    };

    println!("Analyzing {} ({}) at {} ...", app_name, package, base);
    let result = match client.mobile_analyze(&base, &request).await {
        Ok(result) => result,
        Err(e) => {
            println!("✗ Analysis failed: {}", e);
            return Err(e.into());
        }
    };

    let title = result.app_name.as_deref().unwrap_or(app_name);
    let package_name = result.package_name.as_deref().unwrap_or(package);
    let history = ReportHistory::new(&store, config.history.limit);
    history.add(ReportEntry::new(
        title,
        package_name,
        &result.report_url,
        result.total_issues,
    ))?;

    println!("✓ Analysis complete");
    println!("  App:     {} ({})", title, package_name);
    if let Some(total) = result.total_issues {
        println!("  Issues:  {}", total);
    }
    println!("  Report:  {}", result.report_url);
    Ok(())
}

/// `ai_requested` is only sent when AI has been switched off.
fn ai_flag(enabled: bool) -> Option<bool> {
    if enabled {
        None
    } else {
        Some(false)
    }
}

pub async fn prefs(
    base_url: Option<String>,
    ai: Option<bool>,
    screenshot: Option<bool>,
    token: Option<String>,
) -> anyhow::Result<()> {
    let paths = Paths::new();
    let store = PrefStore::new(&paths);
    let mut prefs = MobilePrefs::load(&store)?;

    let changed = base_url.is_some() || ai.is_some() || screenshot.is_some() || token.is_some();
    if let Some(url) = base_url {
        prefs.base_url = Some(url.trim().trim_end_matches('/').to_string()).filter(|u| !u.is_empty());
    }
    if let Some(ai) = ai {
        prefs.ai_enabled = ai;
    }
    if let Some(screenshot) = screenshot {
        prefs.screenshot_enabled = screenshot;
    }
    if let Some(token) = token {
        prefs.auth_token = Some(token).filter(|t| !t.is_empty());
    }
    if changed {
        prefs.save(&store)?;
        println!("✓ Preferences saved");
    }

    println!("Mobile preferences");
    println!(
        "  Base URL:    {}",
        prefs.base_url.as_deref().unwrap_or("(config default)")
    );
    println!("  AI:          {}", if prefs.ai_enabled { "on" } else { "off" });
    println!(
        "  Screenshots: {}",
        if prefs.screenshot_enabled { "on" } else { "off" }
    );
    println!(
        "  Auth token:  {}",
        if prefs.auth_token.is_some() { "set" } else { "not set" }
    );
    Ok(())
}
