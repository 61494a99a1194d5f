use a11ylens_browser::{BrowserSession, ScreenshotOptions};
use a11ylens_bridge::{is_restricted_url, AnalysisController, BackendClient, PageAgent, Status};
use a11ylens_core::{Config, Error, Paths, ScreenshotMode, WcagLevel};
use std::path::PathBuf;
use tracing::warn;

use super::scan::print_analysis;

pub struct AnalyzeArgs {
    pub url: String,
    pub level: Option<WcagLevel>,
    pub screenshot: Option<ScreenshotMode>,
    pub headed: bool,
    pub no_backend: bool,
    pub report: Option<PathBuf>,
    pub download: bool,
    pub keep_open: bool,
}

pub async fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    if is_restricted_url(&args.url) {
        return Err(Error::Restricted(args.url).into());
    }

    let paths = Paths::new();
    paths.ensure_dirs()?;
    let mut config = Config::load_or_default(&paths)?;
    if let Some(level) = args.level {
        config.scan.level = level;
    }
    if let Some(mode) = args.screenshot {
        config.scan.screenshot = mode;
    }
    config.browser.headed |= args.headed;
    let keep_open = args.keep_open || config.browser.keep_open;

    let client = BackendClient::from_config(&config.backend)?;
    let mut session = BrowserSession::launch(&config.browser, &paths.browser_dir()).await?;

    let result = async {
        session.open(&args.url).await?;

        let mut agent = PageAgent::new(
            &session,
            config.scan.level,
            ScreenshotOptions::from_config(&config.scan),
        );
        if !args.no_backend {
            agent = agent.with_backend(&client);
        }
        let mut controller = AnalysisController::new(agent);

        println!("Analyzing {} ...", args.url);
        let run = controller.run(&args.url).await;
        let outcome = match run {
            Ok(outcome) => outcome.clone(),
            Err(e) => {
                println!("✗ {}", e);
                return Err(anyhow::Error::from(e));
            }
        };

        print_analysis(&outcome.title, outcome.level, &outcome.local);
        println!();
        println!("{}", controller.status());
        println!("  {} element(s) highlighted", outcome.highlighted);

        if *controller.status() == Status::Partial {
            println!();
            if args.no_backend {
                println!("⚠ Backend skipped (--no-backend)");
            } else {
                println!("⚠ Backend API not available");
                println!("  Make sure the analysis server is running (see `a11ylens status`).");
                println!("  You can still see basic client-side checks above.");
            }
        }

        let stem = format!("report_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"));
        let report_path = match &args.report {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, outcome.render_report())?;
                path.clone()
            }
            None => outcome.save_report(&paths, &stem)?,
        };
        println!("✓ Report written to {}", report_path.display());

        if let Some(url) = outcome.backend.as_ref().and_then(|b| b.report_url.clone()) {
            println!("  Backend report: {}", url);
            if args.download {
                let dest = paths.report_file(&format!(
                    "accessibility_report_{}",
                    chrono::Utc::now().timestamp_millis()
                ));
                match client.download(&url, &dest).await {
                    Ok(path) => println!("✓ Backend report downloaded to {}", path.display()),
                    Err(e) => println!("⚠ Could not download backend report: {}", e),
                }
            }
        }

        if keep_open {
            println!();
            println!("Browser left open with highlights. Press Ctrl+C to exit.");
            tokio::signal::ctrl_c().await?;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    session.close().await;
    if let Err(e) = &result {
        warn!(error = %e, "Analysis aborted");
    }
    result
}
