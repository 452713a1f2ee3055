use crate::repository::Strategy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pypi-releases",
    about = "Check a Conda environment file for new releases on PyPI",
    version,
    author
)]
pub struct Cli {
    /// Path to the environment file
    #[arg(short, long, default_value = "environment.yml", global = true)]
    pub file: PathBuf,

    /// Optional TOML settings file
    #[arg(short, long, value_name = "TOML", global = true)]
    pub config: Option<PathBuf>,

    /// How to look up releases: the JSON API or the release history page
    #[arg(long, value_name = "api|scrape", global = true)]
    pub strategy: Option<Strategy>,

    /// Base URL of the package index
    #[arg(long, value_name = "URL", global = true)]
    pub registry_url: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report packages whose latest release differs from the pinned version
    Check,

    /// Report releases published since the last run and remember them
    Releases {
        /// Release cache file (defaults to latest_releases.json)
        #[arg(long, value_name = "PATH")]
        cache: Option<PathBuf>,
    },

    /// List the packages declared in the environment file
    List,
}
