mod brain;
mod cli;
mod config;
mod driver;
mod error;
mod filter;
mod queue;
mod report;
mod submission;
mod ui;

use std::path::{Path, PathBuf};

use clap::Parser;
use console::style;
use tokio::sync::watch;

use crate::brain::{BrainClient, Credentials};
use crate::cli::{Cli, Command};
use crate::config::AlphasubConfig;
use crate::driver::{BatchDriver, DriverError};
use crate::error::AlphasubError;
use crate::queue::PendingQueue;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{} {err}", style("error:").red().bold());
        let code = match &err {
            AlphasubError::Driver(DriverError::Interrupted { .. }) => 130,
            _ => 1,
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), AlphasubError> {
    let config = AlphasubConfig::load(cli.config.as_deref())?;
    let input = cli
        .input
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.input_file));
    let queue = PendingQueue::new(
        cli.queue
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.queue_file)),
    );

    match cli.command {
        Command::Filter => filter_step(&input, &queue),
        Command::Submit { count } => submit_step(&config, queue, count, cli.verbose).await,
        Command::Run { count } => {
            filter_step(&input, &queue)?;
            submit_step(&config, queue, count, cli.verbose).await
        }
    }
}

fn filter_step(input: &Path, queue: &PendingQueue) -> Result<(), AlphasubError> {
    let summary = filter::run_filter(input, queue)?;
    ui::print_filter_summary(&summary, queue.path());
    Ok(())
}

async fn submit_step(
    config: &AlphasubConfig,
    mut queue: PendingQueue,
    count: usize,
    verbose: bool,
) -> Result<(), AlphasubError> {
    // authenticate before touching any queue state
    let credentials = Credentials::from_file(Path::new(&config.credentials_file))?;
    let client = BrainClient::new(credentials, config.base_url.clone());
    client.authenticate().await?;
    ui::print_auth_ok();

    // ctrl-c flips the cancellation flag; the driver reports and propagates
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let mut driver = BatchDriver::new(
        client,
        config.protocol(),
        config.pacing(),
        cancel_rx,
        verbose,
    );
    let summary = driver.run(&mut queue, count).await?;
    ui::print_run_summary(&summary, verbose);
    Ok(())
}
