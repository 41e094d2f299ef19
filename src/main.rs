use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use goosniffer::config::Config;
use goosniffer::pipeline::{Outcome, ScanPipeline};
use goosniffer::watcher;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "goosniffer")]
#[command(about = "Watches the clipboard for moon scans, prints them as JSON and uploads them")]
struct Cli {
    /// API endpoint URL
    #[arg(long, env = "API_ENDPOINT", global = true)]
    api_endpoint: Option<String>,

    /// API Bearer token
    #[arg(long, env = "API_TOKEN", global = true, hide_env_values = true)]
    api_token: Option<String>,

    /// Config file [default: ~/.config/goosniffer/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the clipboard for moon scans (default)
    Watch,
    /// Parse a moon scan from a file (or stdin) and print it as JSON
    Parse {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
        /// Also upload the result to the configured endpoint
        #[arg(long)]
        upload: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let file_config = match &cli.config {
        Some(path) => {
            anyhow::ensure!(path.exists(), "Config file not found: {}", path.display());
            Config::load_from(path)?
        }
        None => Config::load()?,
    };
    let config = file_config.merged_with(Config {
        api_endpoint: cli.api_endpoint,
        api_token: cli.api_token,
    });

    match cli.command {
        None | Some(Commands::Watch) => run_watch(&config),
        Some(Commands::Parse { file, upload }) => run_parse(&config, file, upload),
    }
}

fn run_watch(config: &Config) -> Result<()> {
    let mut pipeline = ScanPipeline::new(config.upload_target(), io::stdout())?;
    if !pipeline.uploads_enabled() {
        log::info!("No API endpoint configured, scans will only be printed");
    }

    log::info!("Listening for clipboard text. Press Ctrl+C to exit.");
    watcher::watch(|text| {
        pipeline.handle_clipboard_text(text);
    })
    .context("Clipboard watcher failed")
}

fn run_parse(config: &Config, file: Option<PathBuf>, upload: bool) -> Result<()> {
    let text = match &file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read scan file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read scan from stdin")?;
            buf
        }
    };

    let target = if upload {
        Some(
            config
                .upload_target()
                .context("--upload needs an API endpoint (--api-endpoint or API_ENDPOINT)")?,
        )
    } else {
        None
    };

    let mut pipeline = ScanPipeline::new(target, io::stdout())?;
    match pipeline.process_scan(&text) {
        Outcome::UploadFailed => anyhow::bail!("Moon scan upload failed"),
        Outcome::SerializeFailed => anyhow::bail!("Moon scan could not be serialized"),
        _ => Ok(()),
    }
}
