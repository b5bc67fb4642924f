//! bratgen - lyric video generator client
//!
//! Inspects synchronized lyrics, derives clip time ranges from line
//! selections, and submits generation jobs to the render server.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bratgen_client::{
    logging, terminal_outcome, GenerationError, GenerationJobClient, GenerationRequest, JobHandle,
};
use bratgen_common::config::ClientConfig;
use bratgen_common::events::JobEvent;
use bratgen_common::time_format::format_clock;
use bratgen_common::{JobUpdate, LineSelector, LyricsTimeline, StyleOptions, StylePreferences, TimeRange};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Command-line arguments for bratgen
#[derive(Parser, Debug)]
#[command(name = "bratgen")]
#[command(about = "Generate lyric videos from synchronized lyrics")]
#[command(version)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Render server base URL
    #[arg(long, global = true, value_name = "URL")]
    server_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the timed lines of an LRC file
    Lines {
        /// LRC file to parse
        lrc_file: PathBuf,
    },

    /// Show the time range covered by a line selection
    Range {
        /// LRC file to parse
        lrc_file: PathBuf,
        /// First clicked line
        first: usize,
        /// Second clicked line
        last: Option<usize>,
    },

    /// Submit a generation job and follow it to completion
    Generate(GenerateArgs),

    /// Follow an already-submitted job
    Watch {
        job_id: String,
        /// Emit one JSON event per line
        #[arg(long)]
        json: bool,
    },

    /// Read a job's current status once
    Status { job_id: String },
}

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("lyrics_source").required(true).args(["lyrics_id", "lrc_file"])))]
struct GenerateArgs {
    /// Audio source video id
    #[arg(long)]
    video_id: String,

    /// Lyrics id from the server's catalogue
    #[arg(long)]
    lyrics_id: Option<String>,

    /// Synchronized lyrics file sent as manual lyrics
    #[arg(long, value_name = "FILE")]
    lrc_file: Option<PathBuf>,

    #[arg(long)]
    song: Option<String>,

    #[arg(long)]
    artist: Option<String>,

    /// First selected line (needs --lrc-file)
    #[arg(long, requires = "lrc_file", conflicts_with_all = ["start", "end"])]
    first: Option<usize>,

    /// Last selected line
    #[arg(long, requires = "first")]
    last: Option<usize>,

    /// Clip start, M:SS
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Clip end, M:SS
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Blur strength (1-20)
    #[arg(long)]
    lofi: Option<u32>,

    #[arg(long)]
    fontsize: Option<u32>,

    /// Background color, e.g. #FFFFFF
    #[arg(long)]
    bgcolor: Option<String>,

    /// Text color, e.g. #000000
    #[arg(long)]
    text_color: Option<String>,

    /// Emit one JSON event per line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (filter, filter_handle) = logging::reloadable_filter();
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting bratgen v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = ClientConfig::resolve(args.config.as_deref(), args.server_url.as_deref())
        .context("Failed to load configuration")?;

    if let Err(e) = filter_handle.apply_config_level(&config.logging.level) {
        warn!(error = %e, "Keeping default log level");
    }
    info!(server_url = %config.server_url, "Configuration resolved");

    match args.command {
        Command::Lines { lrc_file } => print_lines(&lrc_file),
        Command::Range {
            lrc_file,
            first,
            last,
        } => print_range(&lrc_file, first, last),
        Command::Generate(generate) => run_generate(&config, generate).await,
        Command::Watch { job_id, json } => {
            let client = GenerationJobClient::from_config(&config)?;
            follow(client.track(job_id), json).await?;
            Ok(())
        }
        Command::Status { job_id } => {
            let client = GenerationJobClient::from_config(&config)?;
            let snapshot = client
                .fetch_status(&job_id)
                .await
                .with_context(|| format!("Failed to read status of job {}", job_id))?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
    }
}

fn load_timeline(path: &Path) -> Result<(String, LyricsTimeline)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read lyrics file {}", path.display()))?;
    let timeline = LyricsTimeline::parse(&raw);
    Ok((raw, timeline))
}

fn print_lines(path: &Path) -> Result<()> {
    let (_, timeline) = load_timeline(path)?;
    if timeline.is_empty() {
        bail!("No timed lines found in {}", path.display());
    }

    for (index, line) in timeline.lines().iter().enumerate() {
        println!("{:>4}  {:>6}  {}", index, format_clock(line.time), line.display_text());
    }
    Ok(())
}

/// Run clicks through a selector the way the line picker does
fn select_range(timeline: LyricsTimeline, first: usize, last: Option<usize>) -> Result<TimeRange> {
    let mut selector = LineSelector::new(timeline);
    let mut range = selector.select(first)?;
    if let Some(last) = last {
        range = selector.select(last)?;
    }
    Ok(range)
}

fn print_range(path: &Path, first: usize, last: Option<usize>) -> Result<()> {
    let (_, timeline) = load_timeline(path)?;
    let range = select_range(timeline, first, last)?;
    println!("{}", range);
    Ok(())
}

/// Flags override saved preferences; the result is saved back
fn resolve_style(args: &GenerateArgs, preferences: &StylePreferences) -> StyleOptions {
    let mut style = preferences.load();
    if let Some(lofi) = args.lofi {
        style.lofi = lofi;
    }
    if let Some(fontsize) = args.fontsize {
        style.fontsize = fontsize;
    }
    if let Some(bgcolor) = &args.bgcolor {
        style.bgcolor = bgcolor.clone();
    }
    if let Some(text_color) = &args.text_color {
        style.text_color = Some(text_color.clone());
    }
    let style = style.normalized();

    if let Err(e) = preferences.save(&style) {
        warn!(path = %preferences.path().display(), error = %e, "Failed to save style preferences");
    }
    style
}

async fn run_generate(config: &ClientConfig, args: GenerateArgs) -> Result<()> {
    let style = match StylePreferences::in_default_location() {
        Ok(preferences) => resolve_style(&args, &preferences),
        Err(e) => {
            warn!(error = %e, "Style preferences unavailable, using defaults");
            StyleOptions::default()
        }
    };

    let mut builder = GenerationRequest::builder().video_id(&args.video_id).style(style);
    if let Some(song) = &args.song {
        builder = builder.song(song);
    }
    if let Some(artist) = &args.artist {
        builder = builder.artist(artist);
    }

    let timeline = match (&args.lyrics_id, &args.lrc_file) {
        (Some(id), _) => {
            builder = builder.lyrics_id(id);
            None
        }
        (None, Some(path)) => {
            let (raw, timeline) = load_timeline(path)?;
            builder = builder.manual_lyrics(raw);
            Some(timeline)
        }
        (None, None) => bail!("Either --lyrics-id or --lrc-file is required"),
    };

    let time_range = match (args.first, timeline, &args.start, &args.end) {
        (Some(first), Some(timeline), _, _) => select_range(timeline, first, args.last)?,
        (_, _, Some(start), Some(end)) => TimeRange::new(start.as_str(), end.as_str()),
        _ => TimeRange::default(),
    };
    builder = builder.time_range(time_range);

    let request = builder.build()?;
    let client = GenerationJobClient::from_config(config)?;
    let handle = client.submit(&request).await?;
    follow(handle, args.json).await?;
    Ok(())
}

fn print_update(job_id: &str, update: &JobUpdate, json: bool) -> Result<()> {
    if json {
        let event = JobEvent::now(job_id, update.clone());
        println!("{}", serde_json::to_string(&event)?);
        return Ok(());
    }

    println!("{}", update.status_message());
    if let JobUpdate::Completed { result } = update {
        println!("{}", result);
    }
    Ok(())
}

/// Print updates until the job ends; Ctrl-C stops tracking
async fn follow(mut handle: JobHandle, json: bool) -> Result<String, GenerationError> {
    if !json {
        println!("Job {}", handle.job_id());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let next = tokio::select! {
            update = handle.next_update() => Some(update),
            _ = &mut ctrl_c => None,
        };

        let Some(next) = next else {
            info!(job_id = %handle.job_id(), "Interrupted");
            handle.cancel();
            return Err(handle.stopped_error());
        };

        let Some(update) = next else {
            return Err(handle.stopped_error());
        };

        if let Err(e) = print_update(handle.job_id(), &update, json) {
            warn!(error = %e, "Failed to print job update");
        }

        if let Some(outcome) = terminal_outcome(update) {
            return outcome;
        }
    }
}
