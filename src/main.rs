// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use subburn::app_config::{self, Config};
use subburn::app_controller::{Controller, JobSpec};
use subburn::style_resolver::StyleResolver;
use subburn::subtitle_processor;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Burn captions into a local or remote video
    Burn(BurnArgs),

    /// Run one job event (`{"input": {...}}` or a bare job spec) and print the result
    Job {
        /// Event JSON file, or `-` to read stdin
        #[arg(value_name = "EVENT_JSON")]
        event: String,
    },

    /// Run a JSON array of job specs concurrently
    Batch {
        /// File containing the job array
        #[arg(value_name = "JOBS_JSON")]
        jobs: PathBuf,
    },

    /// Convert an SRT file to styled ASS for a given canvas, without encoding
    Transcode {
        /// SRT file to convert
        #[arg(value_name = "CAPTIONS")]
        captions: PathBuf,

        /// Canvas width in pixels
        #[arg(long)]
        width: u32,

        /// Canvas height in pixels
        #[arg(long)]
        height: u32,

        /// Output .ass file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions for subburn
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct BurnArgs {
    /// Source video path or URL
    #[arg(value_name = "VIDEO")]
    video: String,

    /// SRT captions path or URL
    #[arg(value_name = "CAPTIONS")]
    captions: String,

    /// Output path or upload URL (defaults to the configured output directory)
    #[arg(short, long)]
    output: Option<String>,

    /// Skip the accelerated encoder
    #[arg(long)]
    software_only: bool,

    /// Upscale sources shorter than this many lines
    #[arg(long)]
    min_height: Option<u32>,

    /// Job identifier used for workspace and output naming
    #[arg(long)]
    job_id: Option<String>,
}

/// subburn - burn SRT captions into video
///
/// Converts SRT captions to a styled ASS track sized for the video and renders
/// them into the picture, using a hardware encoder when one is available.
#[derive(Parser, Debug)]
#[command(name = "subburn")]
#[command(version)]
#[command(about = "Burn SRT captions into video")]
#[command(long_about = "subburn renders SRT captions permanently into video frames.

EXAMPLES:
    subburn burn movie.mp4 movie.srt                      # Render into the output directory
    subburn burn movie.mp4 movie.srt -o out.mp4           # Render to a specific file
    subburn burn https://host/v.mp4 https://host/s.srt \\
        -o 'https://bucket/out.mp4?X-Amz-Signature=...'   # Fetch and upload over HTTP
    subburn burn --software-only movie.mp4 movie.srt      # Never try the hardware encoder
    subburn job event.json                                # Run a queue event, print JSON result
    subburn batch jobs.json                               # Run several jobs concurrently
    subburn transcode movie.srt --width 1920 --height 1080
    subburn completions bash > subburn.bash               # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn colour_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::colour_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logger accepts everything; the max level is narrowed once config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "subburn", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Burn(args) => run_burn(config, args).await,
        Commands::Job { event } => run_event(config, &event).await,
        Commands::Batch { jobs } => run_batch(config, &jobs).await,
        Commands::Transcode {
            captions,
            width,
            height,
            output,
        } => run_transcode(&config, &captions, width, height, output.as_deref()),
        Commands::Completions { .. } => Ok(()),
    }
}

async fn run_burn(mut config: Config, args: BurnArgs) -> Result<()> {
    // CLI flags override file values
    if args.software_only {
        config.encoder.prefer_hardware = false;
    }
    if let Some(min_height) = args.min_height {
        config.render.min_height = min_height;
    }
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    let spec = JobSpec {
        job_id: args.job_id,
        video_url: Some(args.video),
        srt_url: Some(args.captions),
        output_url: args.output,
    };

    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message("Burning captions...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = controller.run_job(spec).await;
    spinner.finish_and_clear();

    if result.ok {
        info!(
            "Success: {} ({} path{}, {})",
            result.output_reference.as_deref().unwrap_or("-"),
            result.encode_path.map(|p| p.to_string()).unwrap_or_default(),
            if result.upscaled { ", upscaled" } else { "" },
            Controller::format_duration(result.duration_seconds)
        );
        Ok(())
    } else {
        Err(anyhow!(
            "Job {} failed: {}",
            result.job_id,
            result.error.unwrap_or_default()
        ))
    }
}

async fn run_event(config: Config, event: &str) -> Result<()> {
    config.validate().context("Configuration validation failed")?;

    let json = if event == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read job event from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(event).with_context(|| format!("Failed to read job event: {}", event))?
    };

    let spec = JobSpec::from_json(&json)?;
    let controller = Controller::with_config(config)?;
    let result = controller.run_job(spec).await;

    print_json(&result)?;
    if !result.ok {
        return Err(anyhow!("Job {} failed", result.job_id));
    }
    Ok(())
}

async fn run_batch(config: Config, jobs: &Path) -> Result<()> {
    config.validate().context("Configuration validation failed")?;

    let json = std::fs::read_to_string(jobs).with_context(|| format!("Failed to read job list: {}", jobs.display()))?;
    let entries: Vec<serde_json::Value> = serde_json::from_str(&json).context("Job list must be a JSON array")?;
    let specs = entries
        .iter()
        .map(|entry| JobSpec::from_json(&entry.to_string()))
        .collect::<Result<Vec<_>>>()?;

    let controller = Controller::with_config(config)?;
    let results = controller.run_batch(specs).await;

    print_json(&results)?;
    let failed = results.iter().filter(|r| !r.ok).count();
    info!("{} of {} job(s) succeeded", results.len() - failed, results.len());
    if failed > 0 {
        return Err(anyhow!("{} job(s) failed", failed));
    }
    Ok(())
}

fn run_transcode(config: &Config, captions: &Path, width: u32, height: u32, output: Option<&Path>) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(anyhow!("Canvas dimensions must be positive"));
    }

    let srt = std::fs::read(captions).with_context(|| format!("Failed to read captions: {}", captions.display()))?;
    let layout = StyleResolver::new(config.style.clone()).resolve(width, height);
    let document = subtitle_processor::transcode(&String::from_utf8_lossy(&srt), &layout, &config.style);

    info!(
        "{} cue(s) converted, {} block(s) skipped, font size {}",
        document.cue_count,
        document.skipped.len(),
        layout.font_size
    );

    match output {
        Some(path) => document.write_to_file(path),
        None => {
            print!("{}", document);
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}

