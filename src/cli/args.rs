//! Command-line argument parsing

use crate::config::AppConfig;
use crate::error::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "release-images")]
#[command(about = "Resolve the container images that make up a platform release")]
#[command(version, author)]
pub struct Args {
    /// Configuration file path
    #[arg(long = "config", global = true, help = "Path to a JSON configuration file")]
    pub config: Option<PathBuf>,

    /// Registry base URL
    #[arg(long = "registry-url", global = true, help = "Registry base URL")]
    pub registry_url: Option<String>,

    /// Tracked repository
    #[arg(
        long = "repository",
        short = 'r',
        global = true,
        help = "Repository whose tags are indexed, e.g. rancher/server"
    )]
    pub repository: Option<String>,

    /// Include release candidates
    #[arg(long = "rc", global = true, help = "Include release candidates in the tag index")]
    pub rc: bool,

    /// Lookup batch width
    #[arg(
        long = "batch-width",
        short = 'j',
        global = true,
        help = "Number of concurrent digest lookups per batch"
    )]
    pub batch_width: Option<usize>,

    /// Mirrored catalog directory
    #[arg(long = "catalog", global = true, help = "Path to a checked-out catalog")]
    pub catalog: Option<PathBuf>,

    /// Timeout in seconds for network operations
    #[arg(long = "timeout", short = 't', global = true, help = "Timeout for network operations in seconds")]
    pub timeout: Option<u64>,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Quiet mode
    #[arg(long = "quiet", short = 'q', global = true, help = "Suppress everything but results and errors")]
    pub quiet: bool,

    /// Output format for results
    #[arg(
        long = "output",
        short = 'o',
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format"
    )]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Index the repository once and print every tag with its digest
    Tags,
    /// Print another tag sharing the given tag's digest
    Analog { tag: String },
    /// Select a directory per catalog component for a release version
    Resolve {
        version: String,
        /// Only resolve this component
        #[arg(long = "component")]
        component: Option<String>,
    },
    /// List the images required by the release a tag points to
    Images { tag: String },
    /// Keep the tag index fresh, re-indexing on a fixed interval
    Watch {
        /// Refresh interval in seconds
        #[arg(long = "interval")]
        interval: Option<u64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Layer defaults, the config file, the environment and these flags
    pub fn build_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        }
        .with_env();

        if let Some(url) = &self.registry_url {
            config.registry.url = url.clone();
        }
        if let Some(repository) = &self.repository {
            config.registry.repository = repository.clone();
        }
        if self.rc {
            config.sync.include_prerelease = true;
        }
        if let Some(width) = self.batch_width {
            config.sync.batch_width = width;
        }
        if let Some(catalog) = &self.catalog {
            config.catalog.root = catalog.clone();
        }
        if let Some(timeout) = self.timeout {
            config.registry.timeout_secs = timeout;
        }
        if let Command::Watch {
            interval: Some(secs),
        } = &self.command
        {
            config.sync.interval_secs = *secs;
        }
        if self.verbose {
            config.verbose = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Print usage examples
    pub fn print_examples() {
        println!("Examples:");
        println!("  # Which tag shares a digest with 'stable'");
        println!("  release-images analog stable");
        println!();
        println!("  # Images of the release 'latest' points to, using a local catalog");
        println!("  release-images --catalog ./catalog images latest");
        println!();
        println!("  # Directory selection per component, as JSON");
        println!("  release-images --catalog ./catalog -o json resolve v1.6.10");
        println!();
        println!("  # Re-index every hour, release candidates included");
        println!("  release-images --rc watch --interval 3600");
    }
}
