//! `artefacts index`: one reconciliation pass, or a periodic loop.
//!
//! The loop runs passes one after another on a single task, so two
//! passes never overlap. A failed pass is logged and retried at the next
//! tick.

use anyhow::Result;
use std::time::Duration;
use tracing::{error, info};

use crate::config::Config;
use crate::service::IndexReport;
use crate::sqlite_store::open_catalog;

pub async fn run_index(config: &Config) -> Result<()> {
    let service = open_catalog(config).await?;
    let result = service.index().await;
    service.store().close().await;

    print_report(&result?);
    Ok(())
}

pub async fn run_index_watch(config: &Config) -> Result<()> {
    let service = open_catalog(config).await?;
    let period = Duration::from_secs(config.index.interval_secs);
    info!(interval_secs = config.index.interval_secs, "periodic indexing started");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match service.index().await {
                    Ok(report) => print_report(&report),
                    Err(e) => error!(error = %format!("{:#}", e), "index pass failed"),
                }
            }
            _ = &mut shutdown => {
                info!("periodic indexing stopped");
                break;
            }
        }
    }

    service.store().close().await;
    Ok(())
}

fn print_report(report: &IndexReport) {
    println!("index");
    println!("  scanned manifests: {}", report.scanned);
    println!("  indexed artefacts: {}", report.indexed);
    println!("  failed: {}", report.failed);
    println!("  deleted: {}", report.deleted);
    println!("ok");
}
