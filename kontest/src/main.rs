mod cmd;
mod modules;

use crate::cmd::{
    list::{self, ListArgs},
    prefs::{self, PrefsArgs},
    reconcile::{self, ReconcileArgs},
    remind::{self, RemindArgs},
    watch::{self, WatchArgs},
};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::{env, str::FromStr};
use tokio::runtime::Builder;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{self, time::OffsetTime},
};

#[derive(Debug, Parser)]
#[command(name = "kontest")]
#[command(about = "Upcoming programming contests from every site in one list")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch contests once and print them by time bucket.
    List(ListArgs),
    /// Keep the buckets current and refetch periodically.
    Watch(WatchArgs),
    /// Remove cancelled and duplicate calendar events and notifications.
    Reconcile(ReconcileArgs),
    /// Schedule notifications ahead of upcoming contests.
    Remind(RemindArgs),
    /// Show or edit preferences.
    Prefs(PrefsArgs),
}

fn main() {
    dotenv().ok();

    let log_level = env::var("RUST_LOG").unwrap_or(String::from("info"));
    let filter = EnvFilter::builder()
        .with_default_directive(
            LevelFilter::from_str(&log_level)
                .unwrap_or(LevelFilter::INFO)
                .into(),
        )
        .from_env_lossy();
    let format = fmt::format()
        .with_level(true)
        .with_target(true)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_timer(OffsetTime::local_rfc_3339().expect("couldn't determine local offset"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(format)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    let result = match Cli::parse().command {
        Commands::List(args) => runtime.block_on(list::run(args)),
        Commands::Watch(args) => runtime.block_on(watch::run(args)),
        Commands::Reconcile(args) => runtime.block_on(reconcile::run(args)),
        Commands::Remind(args) => runtime.block_on(remind::run(args)),
        Commands::Prefs(args) => runtime.block_on(prefs::run(args)),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
