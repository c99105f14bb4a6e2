//! # Stage Export
//!
//! Command-line entry point: replay a script and write the exported image.

use clap::Parser;
use stage_cli::{run, CliArgs, ExportJob};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the output path
    let json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stage_cli=info,stage_renderer=info,stage_core=info".into()),
        )
        .with(fmt_layer)
        .init();

    let args = CliArgs::parse();
    let job = ExportJob::from(args);

    tracing::info!(
        "Exporting {} as {} ({}x{} canvas, scale {})",
        job.script.display(),
        job.options.format,
        job.width,
        job.height,
        job.options.pixel_ratio
    );

    let path = run(&job).await?;
    println!("{}", path.display());
    Ok(())
}
