use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use clap::{Parser, ValueEnum};

use strataforge_errors::config::{load_config, AppConfig};
use strataforge_errors::lifecycle::startup::build_responder;
use strataforge_errors::observability::MemorySink;
use strataforge_errors::pages::{Classification, FailureDetail};
use strataforge_errors::RequestContext;

#[derive(Parser)]
#[command(name = "errorpage-preview")]
#[command(about = "Render a StrataForge error page to stdout", long_about = None)]
struct Cli {
    /// Failure classification to render
    #[arg(value_enum)]
    kind: Kind,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Template directory, overriding the config
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Message shown on the page instead of the default
    #[arg(short, long)]
    message: Option<String>,

    /// Request path recorded in the log entry
    #[arg(long, default_value = "/preview")]
    path: String,

    /// Print the captured log records to stderr as JSON
    #[arg(long)]
    show_log: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Forbidden,
    Unauthorized,
    NotFound,
    InternalError,
}

impl From<Kind> for Classification {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Forbidden => Classification::Forbidden,
            Kind::Unauthorized => Classification::Unauthorized,
            Kind::NotFound => Classification::NotFound,
            Kind::InternalError => Classification::InternalError,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = cli.templates {
        config.templates.directory = Some(dir);
    }

    let sink = Arc::new(MemorySink::new());
    let responder = build_responder(&config, sink.clone())?;

    let ctx = RequestContext::new(Method::GET, cli.path).with_request_id("preview");
    let detail = FailureDetail {
        public_message: cli.message.as_deref(),
        ..FailureDetail::default()
    };
    let response = responder.respond(&ctx, cli.kind.into(), detail);

    eprintln!("Status: {}", response.status());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    println!("{}", String::from_utf8_lossy(&body));

    if cli.show_log {
        for record in sink.records() {
            eprintln!("{}", serde_json::to_string(&record)?);
        }
    }

    Ok(())
}
