mod bootstrap;

use anyhow::{Context, Result};
use clap::Parser;
use sensor_core::settings::Settings;
use sensor_data::analysis::{run, RunConfig, RunOutcome};

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("sensor-stats v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "Input: {}, Output: {}, Table: {}",
        settings.input.display(),
        settings.output.display(),
        settings.table
    );

    let config = RunConfig::from(&settings);
    let outcome = run(&config)
        .with_context(|| format!("processing {} failed", config.input.display()))?;

    match outcome {
        RunOutcome::NothingToDo(_) => {
            println!("No records found after March 2024.");
        }
        RunOutcome::Written(summary) => {
            if let Some(path) = &settings.summary {
                summary
                    .save_to(path)
                    .with_context(|| format!("writing run summary to {}", path.display()))?;
                tracing::info!("Run summary written to {}", path.display());
            }
            println!("Results written to {}", summary.output.display());
        }
    }

    Ok(())
}
