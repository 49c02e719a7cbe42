use crate::cmd::{build_feed, render_categories, report_feed_problems};
use crate::modules::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use kontest_libs::{Categories, FeedWarning, SourceFailure};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only show contests whose name, site or url contains this text.
    #[arg(long, short)]
    query: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    categories: &'a Categories,
    failures: &'a [SourceFailure],
    warnings: &'a [FeedWarning],
}

pub async fn run(args: ListArgs) -> Result<()> {
    let config = Config::from_env()?;
    let mut feed = build_feed(&config)?;

    feed.refresh().await;
    if let Some(query) = &args.query {
        feed.set_search(query);
    }

    if args.json {
        let output = ListOutput {
            categories: feed.categories(),
            failures: feed.failures(),
            warnings: feed.warnings(),
        };
        let json = serde_json::to_string_pretty(&output).with_context(|| {
            let message = "failed to serialize contests.";
            tracing::error!(message);
            message
        })?;
        println!("{}", json);
    } else {
        report_feed_problems(&feed);
        println!("{}", render_categories(feed.categories()));
    }

    Ok(())
}
