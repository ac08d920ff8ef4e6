use std::path::PathBuf;

use clap::Parser;

use campus_core::logging::{LogDestination, init_logging};
use campus_core::pipeline::run_pipeline;
use campus_core::{GigaChatClient, ScheduleError, Settings};

/// CLI surface for running one table through the extraction pipeline.
#[derive(Debug, Parser, Clone)]
#[command(
    author,
    version,
    about = "Run a schedule table through the GigaChat extraction pipeline"
)]
pub struct CliArgs {
    /// Table file to process (CSV/TSV/TXT or any Excel-compatible workbook).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(cli: CliArgs) -> Result<(), ScheduleError> {
    init_logging(LogDestination::StderrOnly)
        .map_err(|err| ScheduleError::message(format!("logging init failed: {err}")))?;

    let settings = Settings::from_env()?;
    let client = GigaChatClient::new(settings)?;
    let result = run_pipeline(&cli.file, &client).await?;

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{rendered}");

    Ok(())
}
