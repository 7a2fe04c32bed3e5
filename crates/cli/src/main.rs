use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use vitalis_core::{
    Article, Category, FetchConfig, fetch_article, fetch_url, parse_article, pick_random_article,
    render_pdf, render_text, safe_filename,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for a downloaded article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Pdf,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Pdf => "pdf",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plaintext" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: txt, pdf, json", s)),
        }
    }
}

/// Download Wikipedia vital articles as plain text or PDF
#[derive(Parser, Debug)]
#[command(name = "vitalis")]
#[command(author = "Vitalis Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Download a random vital Wikipedia article", long_about = None)]
struct Args {
    /// Category (physics, technology, economics), article URL, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: derived from the article title, or stdout for txt/json)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (txt, pdf, json)
    #[arg(short, long, default_value = "txt", value_name = "FORMAT")]
    format: OutputFormat,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable progress output
    #[arg(short, long)]
    verbose: bool,
}

/// Print a styled banner for verbose mode
fn print_banner() {
    eprintln!("\n{} {} {}", "Vitalis".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Download a random vital Wikipedia article".dimmed());
    eprintln!();
}

/// Print a styled step message
fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        print_banner();
    }

    let config = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
    };

    let article = resolve_article(&args, &config).await?;

    if args.verbose {
        eprintln!("  {} {}", "Title:".dimmed(), article.title.bright_white());
        eprintln!("  {} {}", "Blocks:".dimmed(), article.blocks.len().to_string().bright_white());
        eprintln!(
            "  {} {}",
            "References:".dimmed(),
            article.references.len().to_string().bright_white()
        );
        eprintln!();
        print_step(3, 3, "Rendering output");
    }

    match args.format {
        OutputFormat::Text => {
            write_output(&args, render_text(&article).into_bytes())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&article).context("Failed to serialize article")?;
            write_output(&args, json.into_bytes())?;
        }
        OutputFormat::Pdf => {
            let bytes = render_pdf(&article).context("Failed to render PDF")?;
            // PDF bytes never go to a terminal; pick a filename when none was given.
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("{}.pdf", safe_filename(&article.title))));
            fs::write(&path, bytes)
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
    }

    Ok(())
}

/// Turns the positional input into a parsed article.
///
/// A category name picks a random article from its pool first; a URL is
/// fetched directly; anything else is read as local HTML (or stdin for
/// `-`) and parsed without touching the network.
async fn resolve_article(args: &Args, config: &FetchConfig) -> anyhow::Result<Article> {
    if args.input == "-" {
        if args.verbose {
            print_step(1, 3, "Reading from stdin");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
        return Ok(parse_article(&buffer));
    }

    if let Ok(category) = args.input.parse::<Category>() {
        if args.verbose {
            print_step(1, 3, &format!("Picking a random {} article", category.as_str()));
        }
        let url = pick_random_article(category, config)
            .await
            .with_context(|| format!("Failed to pick an article for {}", category.as_str()))?;
        print_info(&format!("Picked {url}"));
        if args.verbose {
            print_step(2, 3, &format!("Fetching {}", url.bright_white().underline()));
        }
        return fetch_article(&url, config).await.context("Failed to fetch article content");
    }

    if args.input.starts_with("http://") || args.input.starts_with("https://") {
        if args.verbose {
            print_step(1, 3, &format!("Fetching {}", args.input.bright_white().underline()));
        }
        let html = fetch_url(&args.input, config).await.context("Failed to fetch URL")?;
        return Ok(parse_article(&html));
    }

    if !PathBuf::from(&args.input).exists() {
        bail!(
            "Unknown category: {}. Valid options: physics, technology, economics (or pass a URL or HTML file)",
            args.input
        );
    }
    if args.verbose {
        print_step(1, 3, &format!("Reading from file {}", args.input.bright_white()));
    }
    let html = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read file: {}", args.input))?;
    Ok(parse_article(&html))
}

fn write_output(args: &Args, bytes: Vec<u8>) -> anyhow::Result<()> {
    match &args.output {
        Some(path) => {
            fs::write(path, bytes)
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            io::stdout().write_all(&bytes).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
