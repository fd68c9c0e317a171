//! Sync-once command implementation.

use std::path::PathBuf;
use tillsync_sync_engine::CycleReport;

/// Runs one cycle and prints its report.
///
/// Fails if any model failed, so scripts can check the exit status.
pub fn run(
    database: Option<PathBuf>,
    include_pull: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::edge_config(database)?;
    let sync = super::open_edge(&config)?;
    let report = sync.run_cycle(include_pull)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report),
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(format!("sync cycle finished with {} error(s)", report.errors.len()).into())
    }
}

fn print_text(report: &CycleReport) {
    println!(
        "Cycle at {} took {} ms",
        report.started_at.to_rfc3339(),
        report.duration.as_millis()
    );
    println!("Pushed: {}", report.total_pushed());
    for (model, count) in &report.pushed {
        println!("  {model}: {count}");
    }
    if report.pull_ran {
        println!("Pulled: {}", report.total_pulled());
        for (model, count) in &report.pulled {
            println!("  {model}: {count}");
        }
    } else {
        println!("Pulled: skipped");
    }
    for error in &report.errors {
        let retry = if error.retryable { "retryable" } else { "fatal" };
        println!("  ! {} [{}, {retry}]: {}", error.model, error.kind, error.message);
    }
}
