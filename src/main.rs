use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

use sales_refund_matcher::processor::RandomValueGenerator;
use sales_refund_matcher::{report, server, SalesRefundApp};

#[derive(Parser, Debug)]
#[command(about = "Matches sales with their refunds and serves the results over HTTP")]
struct Args {
    /// Log directory (defaults to logs/)
    #[arg(long, default_value = "logs", global = true)]
    log_dir: PathBuf,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match a CSV file and print the pairs as CSV
    Report {
        /// Input CSV file with transactions
        #[arg(name = "FILE")]
        input_file: PathBuf,
    },
}

/// Options for the HTTP API, which runs when no subcommand is given
#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: std::net::IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// CSV file to load at startup instead of the sample data
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Create logs directory if it doesn't exist
    if !args.log_dir.exists() {
        fs::create_dir_all(&args.log_dir)?;
    }

    // Log to a per-run file and to stdout
    let datetime = Local::now().format("%Y%m%d_%H%M%S");
    let log_file = format!("sales_refund_matcher_{}.log", datetime);
    let file_appender = tracing_appender::rolling::never(&args.log_dir, log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    registry()
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    match args.command {
        Some(Command::Report { input_file }) => {
            report::report_file(&input_file, &RandomValueGenerator).await?;
        }
        None => serve(args.serve).await?,
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let app = Arc::new(SalesRefundApp::with_sample_data());
    if let Some(csv) = &args.csv {
        app.load_from_csv_file(csv).await?;
    }

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on http://{}", addr);
    info!("Matched pairs: http://{}/api/sales-refunds", addr);
    info!("Stats: http://{}/api/stats", addr);

    axum::serve(listener, server::router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
