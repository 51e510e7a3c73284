use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidnote_core::{
    Config, NotionClient, Provider, Summary, SummaryPage, SummaryReport, Transcript, VideoInfo,
    extract_audio, fetch_video_info, find_audio_in_cache, format_report_readable,
    format_video_info, get_cache_dir, get_info_path, get_summary_path, get_transcript_path,
    load_json, persist_best_effort, save_json, summarize, summary_to_blocks, transcribe_audio,
};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "vidnote")]
#[command(about = "Transcribe videos, summarize them with AI, and save the summary to Notion")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract audio, transcribe, summarize and save to Notion
    Summarize(SummarizeArgs),

    /// Show video metadata without downloading
    Info {
        /// Video URL
        url: String,
    },

    /// List Notion databases shared with the integration
    Databases,

    /// Show the property schema of a Notion database
    Properties {
        /// Notion database ID
        database_id: String,
    },

    /// Convert summary text into page blocks and print them as JSON
    Blocks {
        /// Input file. Reads stdin when omitted.
        file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SummarizeArgs {
    /// Video URL
    url: String,

    /// AI provider for the summary
    #[arg(short, long, default_value = "openai")]
    provider: CliProvider,

    /// Notion database to save into. Defaults to NOTION_DATABASE_ID.
    #[arg(short, long)]
    database_id: Option<String>,

    /// Page title. Defaults to "Summary: <video title>".
    #[arg(short, long)]
    title: Option<String>,

    /// Value of the page's Category property
    #[arg(short, long)]
    category: Option<String>,

    /// Value of the page's Author property. Defaults to the uploader.
    #[arg(short, long)]
    author: Option<String>,

    /// Audio format passed to yt-dlp
    #[arg(long, default_value = "mp3")]
    audio_format: String,

    /// Audio quality ("best" or a yt-dlp bitrate such as 128K)
    #[arg(long, default_value = "best")]
    quality: String,

    /// Force re-processing even if cached files exist
    #[arg(short, long)]
    force: bool,

    /// Print the full report as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .expect("spinner template is valid"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn done(msg: impl std::fmt::Display, started: Instant) -> String {
    format!(
        "{} {} {}",
        style("✓").green().bold(),
        msg,
        style(format!("[{}]", format_duration(started.elapsed()))).dim()
    )
}

fn cached(msg: impl std::fmt::Display) {
    println!(
        "{} {} {}",
        style("✓").green().bold(),
        msg,
        style("(cached)").dim()
    );
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match cli.command {
        Command::Summarize(args) => run_summarize(args, &config).await,
        Command::Info { url } => run_info(&url).await,
        Command::Databases => run_databases(&config).await,
        Command::Properties { database_id } => run_properties(&config, &database_id).await,
        Command::Blocks { file } => run_blocks(file).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run_summarize(args: SummarizeArgs, config: &Config) -> Result<()> {
    let provider: Provider = args.provider.into();

    // Validate API keys early
    config.openai_key()?;
    config.provider_key(&provider)?;

    let http = reqwest::Client::new();
    let url = args.url;

    let cache_dir = get_cache_dir(&url);
    fs::create_dir_all(&cache_dir).await?;

    println!(
        "\n{}  {}\n",
        style("vidnote").cyan().bold(),
        style("Video Summarizer").dim()
    );

    let total_start = Instant::now();

    // Step 1: Extract audio (check cache)
    let step_start = Instant::now();
    let info_path = get_info_path(&cache_dir);
    let cached_audio = find_audio_in_cache(&cache_dir, &args.audio_format)
        .filter(|_| !args.force && info_path.exists());
    let (audio_file, info) = match cached_audio {
        Some(path) => {
            let info: VideoInfo = load_json(&info_path).await?;
            cached(format!("Audio extracted: {}", style(&info.title).dim()));
            (path, info)
        }
        None => {
            let spinner = create_spinner("Extracting audio...");
            let extracted =
                extract_audio(&url, &cache_dir, &args.audio_format, &args.quality).await?;
            save_json(&extracted.info, &info_path).await?;
            spinner.finish_with_message(done(
                format!("Audio extracted: {}", style(&extracted.info.title).dim()),
                step_start,
            ));
            (extracted.path, extracted.info)
        }
    };

    // Step 2: Transcribe (check cache)
    let step_start = Instant::now();
    let transcript_path = get_transcript_path(&cache_dir);
    let transcript: Transcript = if !args.force && transcript_path.exists() {
        let transcript: Transcript = load_json(&transcript_path).await?;
        cached(format!("Transcribed: {} words", transcript.word_count()));
        transcript
    } else {
        let spinner = create_spinner("Transcribing audio...");
        let transcript = transcribe_audio(&http, config, &audio_file).await?;
        save_json(&transcript, &transcript_path).await?;
        spinner.finish_with_message(done(
            format!("Transcribed: {} words", transcript.word_count()),
            step_start,
        ));
        transcript
    };

    // Step 3: Summarize (check cache with provider)
    let step_start = Instant::now();
    let summary_path = get_summary_path(&cache_dir, &provider);
    let summary: Summary = if !args.force && summary_path.exists() {
        let summary = load_json(&summary_path).await?;
        cached(format!("Summary generated ({})", provider.name()));
        summary
    } else {
        let spinner = create_spinner(&format!("Summarizing with {}...", provider.name()));
        let summary = summarize(&http, config, &provider, &transcript).await?;
        save_json(&summary, &summary_path).await?;
        spinner.finish_with_message(done(
            format!("Summary generated ({})", provider.name()),
            step_start,
        ));
        summary
    };
    if !summary.structured {
        tracing::warn!("summary was not returned as JSON; using the raw reply");
    }

    let blocks = summary_to_blocks(&summary.text);

    // Step 4: Save to Notion (best effort)
    let database_id = args
        .database_id
        .clone()
        .or_else(|| config.notion_database_id.clone());
    let notion_page = match database_id {
        None => {
            tracing::info!("no Notion database configured, skipping");
            None
        }
        Some(database_id) => match NotionClient::from_config(http.clone(), config) {
            Err(e) => {
                tracing::warn!(error = %e, "skipping Notion");
                None
            }
            Ok(client) => {
                let step_start = Instant::now();
                let spinner = create_spinner("Saving to Notion...");
                let page = SummaryPage {
                    url: &url,
                    info: &info,
                    transcript: &transcript.text,
                    summary_blocks: &blocks,
                    title: args.title.as_deref(),
                    category: args.category.as_deref(),
                    author: args.author.as_deref(),
                };
                let saved = persist_best_effort(&client, &database_id, &page).await;
                match &saved {
                    Some(_) => spinner.finish_with_message(done("Saved to Notion", step_start)),
                    None => spinner.finish_with_message(format!(
                        "{} Not saved to Notion",
                        style("✗").yellow().bold()
                    )),
                }
                saved
            }
        },
    };

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!("{}", style("─".repeat(60)).dim());

    let report = SummaryReport {
        url,
        info,
        transcript: transcript.text,
        summary: summary.text,
        blocks,
        notion_page,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_report_readable(&report));
        println!("{}", style("─".repeat(60)).dim());
        println!("\n{}\n\n{}", style("Full Transcript").bold(), report.transcript);
    }

    Ok(())
}

async fn run_info(url: &str) -> Result<()> {
    let spinner = create_spinner("Fetching video info...");
    let info = fetch_video_info(url).await?;
    spinner.finish_and_clear();
    println!("{}", format_video_info(&info));
    Ok(())
}

async fn run_databases(config: &Config) -> Result<()> {
    let client = NotionClient::from_config(reqwest::Client::new(), config)?;
    let databases = client.list_databases().await?;

    if databases.is_empty() {
        println!(
            "{}",
            style("No databases are shared with this integration.").dim()
        );
    }
    for db in databases {
        println!(
            "{}  {}  {}",
            style(&db.title).bold(),
            style(&db.id).yellow(),
            style(&db.url).dim()
        );
    }
    Ok(())
}

async fn run_properties(config: &Config, database_id: &str) -> Result<()> {
    let client = NotionClient::from_config(reqwest::Client::new(), config)?;
    let schema = client.database_properties(database_id).await?;

    println!("{}\n", style(&schema.title).cyan().bold());
    for prop in schema.properties {
        println!(
            "{}  {}  {}",
            style(&prop.name).bold(),
            style(&prop.kind).yellow(),
            style(&prop.id).dim()
        );
    }
    Ok(())
}

async fn run_blocks(file: Option<PathBuf>) -> Result<()> {
    let text = match file {
        Some(path) => fs::read_to_string(path).await?,
        None => std::io::read_to_string(std::io::stdin())?,
    };
    let blocks = summary_to_blocks(&text);
    println!("{}", serde_json::to_string_pretty(&blocks)?);
    Ok(())
}
