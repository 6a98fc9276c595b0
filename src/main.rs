//! CLI entry point: load configuration, run one crawl, exit with status.
//!
//! Exit codes: 0 when every category succeeded, 1 when the run finished but
//! some categories failed, 2 for errors fatal to the whole run.

use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use bookscrape::logging::init_logging;
use bookscrape::{CrawlOrchestrator, CrawlerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match CrawlerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e:#}");
            return ExitCode::from(2);
        }
    };
    if let Err(e) = init_logging(&config.log_level) {
        eprintln!("logging setup failed: {e:#}");
    }

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling crawl");
            signal_token.cancel();
        }
    });

    let orchestrator = match CrawlOrchestrator::new(config, token) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("failed to start crawler: {e:#}");
            return ExitCode::from(2);
        }
    };

    match orchestrator.run().await {
        Ok(summary) => {
            summary.log_report();
            if summary.all_succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!("crawl aborted: {e}");
            ExitCode::from(2)
        }
    }
}
