mod cli;
mod commands;
mod config;
mod dates;
mod dependency;
mod error;
mod marketplace;
mod output;
mod registry;

use clap::Parser;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = cli::Cli::parse();

    if let Err(err) = commands::dispatch(cli).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
