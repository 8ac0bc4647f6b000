//! marketdash - crypto market data from the command line
//!
//! Prints prices, coin rankings, charts, trend summaries, gas prices and
//! global market statistics as JSON, falling back across providers and
//! caching responses.

use std::process;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use marketdash::app::App;
use marketdash::cli::{Cli, Command, Settings};
use marketdash::refresh::RefreshMessage;

/// Installs the stderr log subscriber, honouring `RUST_LOG`
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marketdash=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints refresh results until Ctrl-C
async fn watch(app: &App, id: &str, interval: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut handle = app.watch(id, Duration::from_secs(interval.max(1)));
    loop {
        tokio::select! {
            message = handle.recv() => match message {
                Some(RefreshMessage::Updated(data)) => print_json(&data)?,
                Some(RefreshMessage::RefreshError(e)) => eprintln!("refresh failed: {e}"),
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(2);
        }
    };

    let app = App::from_settings(&settings)?;

    if settings.explain {
        print_json(&app.explain(&cli.command))?;
        return Ok(());
    }

    match &cli.command {
        Command::Watch { id, interval } => watch(&app, id, *interval).await,
        command => match app.run(command).await {
            Ok(output) => Ok(print_json(&output)?),
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        },
    }
}
