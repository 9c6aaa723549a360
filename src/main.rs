use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, info};
use std::path::PathBuf;
use std::sync::Arc;
use wristcast::data::Graph;
use wristcast::data::repository::BundledSource;
use wristcast::ui;

#[derive(Parser, Debug)]
#[command(name = "wristcast", about = "A watch-sized podcast client for the terminal")]
struct Cli {
    /// Podcast library file to sync from
    #[arg(long, default_value = "library.json")]
    library: PathBuf,

    /// Log file path (the alternate screen owns stdout)
    #[arg(long, default_value = "wristcast.log")]
    log_file: PathBuf,

    /// Log level filter: off, error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn setup_logging(path: &PathBuf, level: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(fern::log_file(path)?)
        .apply()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_file, cli.log_level)?;
    info!("starting with library {}", cli.library.display());

    let source = Arc::new(BundledSource::new(cli.library));
    let graph = Graph::new(source);

    ui::start_ui(graph).await
}
