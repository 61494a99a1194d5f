use a11ylens_bridge::BackendClient;
use a11ylens_browser::find_browser_binary;
use a11ylens_core::{Config, Paths};
use a11ylens_storage::{PrefStore, ReportHistory};

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!("a11ylens status");
    println!("===============");
    println!();

    let config_path = paths.config_file();
    println!(
        "Config:    {} {}",
        config_path.display(),
        if config_path.exists() { "✓" } else { "✗ (using defaults)" }
    );
    let reports = paths.reports_dir();
    println!(
        "Reports:   {} {}",
        reports.display(),
        if reports.exists() { "✓" } else { "✗ (not created yet)" }
    );

    let config = Config::load_or_default(&paths)?;
    println!("Level:     WCAG {}", config.scan.level);

    let browser = config.browser.binary.clone().or_else(find_browser_binary);
    match browser {
        Some(path) => println!("Browser:   {} ✓", path),
        None => println!("Browser:   ✗ no Chrome, Chromium or Edge found (needed for `analyze`)"),
    }

    let store = PrefStore::new(&paths);
    let history = ReportHistory::new(&store, config.history.limit).entries()?;
    println!("History:   {} of {} report(s)", history.len(), config.history.limit);

    println!();
    println!("Backend candidates:");
    let client = BackendClient::from_config(&config.backend)?;
    for base in client.candidates() {
        let state = match client.health(base).await {
            Ok(()) => "✓ healthy".to_string(),
            Err(e) => format!("✗ {}", e),
        };
        println!("  {:<28} {}", base, state);
    }
    Ok(())
}
