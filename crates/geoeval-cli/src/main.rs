//! geoeval - Build and score geolocation evaluation datasets.

use clap::Parser;
use geoeval_cli::commands;
use geoeval_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> geoeval_cli::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Collect(args) => commands::execute_collect(args, &formatter).await?,
        Command::Preview(args) => commands::execute_preview(args, &formatter).await?,
        Command::Predict(args) => commands::execute_predict(args, &config, &formatter).await?,
        Command::Locate(args) => commands::execute_locate(args, &config, &formatter).await?,
        Command::Geocode(args) => commands::execute_geocode(args, &config, &formatter).await?,
        Command::Judge(args) => commands::execute_judge(args, &config, &formatter).await?,
        Command::Distance(args) => commands::execute_distance(args, &formatter).await?,
        Command::Classify(args) => commands::execute_classify(args, &formatter).await?,
        Command::Similarity(args) => commands::execute_similarity(args, &config, &formatter).await?,
        Command::Describe(args) => commands::execute_describe(args, &formatter).await?,
        Command::Means(args) => commands::execute_means(args, &formatter).await?,
        Command::Count(args) => commands::execute_count(args, &formatter).await?,
    }

    Ok(())
}

/// Install the stderr log subscriber; `-v` overrides `RUST_LOG`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
