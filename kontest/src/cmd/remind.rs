use crate::cmd::{build_feed, report_feed_problems};
use crate::modules::config::Config;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Debug, Args)]
pub struct RemindArgs {}

pub async fn run(_args: RemindArgs) -> Result<()> {
    let config = Config::from_env()?;
    let mut feed = build_feed(&config)?;

    feed.refresh().await;
    report_feed_problems(&feed);

    let scheduled = feed.schedule_reminders().await.with_context(|| {
        let message = "failed to schedule notifications.";
        tracing::error!(message);
        message
    })?;
    println!("{} notifications scheduled.", scheduled);

    Ok(())
}
