//! RecMap report server
//!
//! Serves the infographic report over HTTP (`serve`) or renders the built-in
//! sample to a file (`sample`).
//!
//! Fonts are discovered by `recmap_report::fonts`; set `RECMAP_FONTS_DIR` to
//! point at a directory with a Roboto, Liberation Sans or DejaVu Sans set when
//! none is installed system-wide.

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use recmap_report::report::{DEFAULT_LOGO_PATH, REPORT_FILENAME};
use recmap_report::{ReportCompositor, ReportInput, ReportOptions};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
#[cfg(test)]
mod tests;

const DEFAULT_LOG_FILTER: &str = "recmap_report=info,recmap_report_server=info,tower_http=debug";

#[derive(Parser)]
#[command(name = "recmap-report-server")]
#[command(author, version, about = "RecMap infographic report server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve `POST /generate-pdf` over HTTP.
    Serve(ServeArgs),

    /// Render the built-in sample report to a file.
    Sample {
        /// Output path of the rendered PDF
        #[arg(short, long, default_value = REPORT_FILENAME)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Frontend origins allowed to call the API (comma separated)
    #[arg(
        long,
        env = "RECMAP_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values = ["http://localhost:5173", "http://127.0.0.1:5173"]
    )]
    allowed_origins: Vec<String>,

    /// Logo drawn in the page header; skipped when the file is missing
    #[arg(long, default_value = DEFAULT_LOGO_PATH)]
    logo: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Serve(args) => tokio::runtime::Runtime::new()
            .context("failed to start the async runtime")
            .and_then(|runtime| runtime.block_on(serve(args))),
        Commands::Sample { output } => render_sample(output),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let options = ReportOptions::default().with_logo_path(Some(args.logo));
    let state = api::AppState::new(ReportCompositor::new(options));
    let cors = api::cors_layer(&args.allowed_origins).context("invalid allowed origin")?;

    let app = api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Server listening on http://{}", addr);
    info!("Allowed origins: {}", args.allowed_origins.join(", "));

    axum::serve(listener, app).await?;
    Ok(())
}

fn render_sample(output: PathBuf) -> anyhow::Result<()> {
    let bytes = recmap_report::generate(&ReportInput::sample())?;
    std::fs::write(&output, bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!("Saved {}", output.display());
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
