use crate::cmd::{build_feed, render_categories, report_feed_problems};
use crate::modules::config::Config;
use anyhow::Result;
use clap::Args;
use kontest_libs::{FeedWarning, ReconcileReport, Snapshot};
use tokio::{
    task::JoinSet,
    time::{self, Duration, MissedTickBehavior},
};

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Minutes between two fetches of every source.
    #[arg(long, default_value_t = 30)]
    refresh_mins: u64,
    /// Clean the calendar and notifications after every fetch.
    #[arg(long)]
    reconcile: bool,
}

/// Store work that follows a published fetch.
struct Maintenance {
    warnings: Vec<FeedWarning>,
    report: Option<ReconcileReport>,
}

pub async fn run(args: WatchArgs) -> Result<()> {
    let config = Config::from_env()?;
    let mut feed = build_feed(&config)?;

    feed.refresh().await;
    report_feed_problems(&feed);
    println!("{}", render_categories(feed.categories()));

    let mut ticker = time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let refetch_period = Duration::from_secs(args.refresh_mins.max(1) * 60);
    let mut refetch = time::interval_at(time::Instant::now() + refetch_period, refetch_period);

    // Neither set borrows the feed, so ticks keep running while they are busy.
    let mut fetches: JoinSet<Snapshot> = JoinSet::new();
    let mut maintenance: JoinSet<Maintenance> = JoinSet::new();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let before = feed.categories().summary();
                if feed.tick() {
                    let after = feed.categories().summary();
                    if before != after {
                        tracing::info!("categories changed: {}", after);
                        println!("{}", render_categories(feed.categories()));
                    }
                }
            }
            _ = refetch.tick() => {
                if !fetches.is_empty() {
                    tracing::warn!("previous fetch is still running; skip this one.");
                    continue;
                }
                fetches.spawn(feed.fetch());
            }
            Some(joined) = fetches.join_next() => {
                let snapshot = match joined {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        tracing::error!("fetch task failed: {:?}", e);
                        continue;
                    }
                };
                feed.publish(snapshot);
                tracing::info!("contests refreshed: {}", feed.categories().summary());
                println!("{}", render_categories(feed.categories()));

                let housekeeping = feed.housekeeping();
                let reconcile = args.reconcile.then(|| feed.reconcile_task());
                maintenance.spawn(async move {
                    let warnings = housekeeping.await;
                    let report = match reconcile {
                        Some(task) => Some(task.await),
                        None => None,
                    };
                    Maintenance { warnings, report }
                });
            }
            Some(joined) = maintenance.join_next() => {
                match joined {
                    Ok(done) => {
                        feed.set_warnings(done.warnings);
                        report_feed_problems(&feed);
                        if let Some(report) = done.report {
                            tracing::info!("{} stale entries removed.", report.removed());
                        }
                    }
                    Err(e) => tracing::error!("maintenance task failed: {:?}", e),
                }
            }
        }
    }

    fetches.abort_all();
    maintenance.abort_all();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, stop watching.");
}
