mod app;
mod export;
mod gemini;
mod markdown;
mod search;
mod ui;

pub const USER_AGENT: &str = concat!("gleaner/", env!("CARGO_PKG_VERSION"));

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tracing::{info, warn};

use app::AppState;
use export::ExportFormat;
use gemini::client::GeminiClient;
use search::Strategy;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(90);

/// Web-grounded search with enriched references and a curated source library.
///
/// Configuration via environment variables:
/// - `GEMINI_API_KEY`: required
/// - `GEMINI_MODEL`: optional, only the allow-listed model is accepted
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Search query
    #[arg(required = true)]
    query: Vec<String>,

    /// How references, library items and the suggestion are judged relevant
    #[arg(short, long, value_enum, default_value_t)]
    strategy: Strategy,

    /// Export written once the search completes: text (copy), markdown (download) or html (print)
    #[arg(short, long, value_enum, default_value_t)]
    format: ExportFormat,

    /// Write the export into this directory (file named after the query) instead of stdout
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gleaner=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .build()?;
    let gemini = GeminiClient::from_env(http)
        .inspect_err(|e| warn!(error = %e, "search disabled"))
        .ok();
    if let Some(client) = &gemini {
        info!(model = client.model(), "gemini client ready");
    }

    let mut app = AppState::new(gemini.is_some(), cli.strategy);
    let outcome = app.handle_search(gemini.as_ref(), &cli.query.join(" ")).await;

    if let Some(message) = &app.display().error {
        eprintln!("{message}");
    }

    // A failed enrichment call still leaves the overview and references exportable.
    if app.display().actions.any_enabled() {
        let exported = export::export(&app, cli.format)?;
        match &cli.out_dir {
            Some(dir) => {
                let path = dir.join(&exported.file_name);
                tokio::fs::write(&path, &exported.content).await?;
                info!(path = %path.display(), "export written");
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(exported.content.as_bytes())?;
                if !exported.content.ends_with('\n') {
                    stdout.write_all(b"\n")?;
                }
            }
        }
    }

    outcome?;
    Ok(())
}
