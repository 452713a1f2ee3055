mod agents;
mod cli;
mod config;
mod error;
mod log;
mod manifest;
mod pypi;
mod repository;
mod workflow;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use config::Settings;
use std::process;

fn main() {
    let cli = Cli::parse();

    log::init(cli.verbose);

    let result = Settings::load(cli.config.as_deref()).and_then(|settings| {
        let settings = settings
            .with_strategy(cli.strategy)
            .with_registry_url(cli.registry_url);
        // Log lines and the progress bar share stderr
        let show_progress = !cli.verbose;

        match cli.command {
            Commands::Check => {
                workflow::execute_check(&cli.file, &settings, show_progress).map(|_| ())
            }
            Commands::Releases { cache } => {
                let settings = settings.with_cache_path(cache);
                workflow::execute_releases(&cli.file, &settings, show_progress).map(|_| ())
            }
            Commands::List => workflow::execute_list(&cli.file).map(|_| ()),
        }
    });

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
