//! Sitewatch binary: one detection cycle per invocation.
//!
//! Scheduling is external (cron or similar); the process loads its
//! configuration, walks every target once, and exits.

mod config;
mod logging;

use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use sitewatch_engine::{
    DisabledNotifier, FileStateStore, Notifier, Orchestrator, ReqwestFetcher, TelegramNotifier,
};
use watch_logging::{watch_info, watch_warn};

const DEFAULT_CONFIG_PATH: &str = "sitewatch.ron";

fn main() -> anyhow::Result<()> {
    logging::initialize();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = config::load(Path::new(&config_path))
        .with_context(|| format!("loading configuration from {config_path}"))?;

    // Missing credentials are surfaced once here, never per target.
    let notifier: Arc<dyn Notifier> = match &config.credentials {
        Some(creds) => Arc::new(TelegramNotifier::new(&creds.bot_token, &creds.chat_id)),
        None => {
            watch_warn!("Telegram credentials are not set; notifications will only be logged");
            Arc::new(DisabledNotifier)
        }
    };

    let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
    let store = Arc::new(FileStateStore::new(config.state_dir.clone()));
    let orchestrator = Orchestrator::new(fetcher, store, notifier, config.pipeline.clone());

    let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;

    watch_info!(
        "starting detection cycle over {} target(s)",
        config.targets.len()
    );
    let reports = runtime.block_on(orchestrator.run_cycle(&config.targets));

    let errored = reports.iter().filter(|r| r.error.is_some()).count();
    watch_info!(
        "detection cycle complete: {} target(s), {} with errors",
        reports.len(),
        errored
    );
    Ok(())
}
