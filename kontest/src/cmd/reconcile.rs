use crate::cmd::{build_feed, report_feed_problems};
use crate::modules::config::Config;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Skip cleanup when any source failed, so its contests are not taken as cancelled.
    #[arg(long)]
    strict: bool,
}

pub async fn run(args: ReconcileArgs) -> Result<()> {
    let config = Config::from_env()?;
    let mut feed = build_feed(&config)?;

    feed.refresh().await;
    report_feed_problems(&feed);
    if args.strict && !feed.failures().is_empty() {
        let message = format!(
            "{} sources failed; calendar and notifications are left untouched.",
            feed.failures().len()
        );
        tracing::error!(message);
        anyhow::bail!(message)
    }

    let report = feed.reconcile().await;
    if report.calendar_skipped {
        println!("calendar access is not granted; calendar was not cleaned.");
    }
    if report.notifications_skipped {
        println!("notification permission is not granted; notifications were not cleaned.");
    }
    println!(
        "removed {} cancelled and {} duplicate events, {} cancelled and {} duplicate notifications ({} removals failed).",
        report.cancelled_events,
        report.duplicate_events,
        report.cancelled_notifications,
        report.duplicate_notifications,
        report.failed_removals
    );

    Ok(())
}
