//! CLI for importing notebooks and inspecting the resulting event log.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "cellorder")]
#[command(about = "Import notebooks and inspect cellorder event logs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a Jupyter notebook and print the resulting event sequence
    Import {
        /// Path to the .ipynb file
        notebook: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum Format {
    Json,
    Table,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Import { notebook, format } => import::execute(&notebook, format)?,
    }

    Ok(())
}

mod import {
    use std::fs;
    use std::path::Path;

    use cellorder_core::materializer::reduce;
    use cellorder_core::tables::Tables;

    use super::Format;

    pub fn execute(path: &Path, format: Format) -> anyhow::Result<()> {
        let raw = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let notebook: cellorder_import::Notebook = serde_json::from_str(&raw)?;

        let imported_at = chrono_free_today();
        let events = cellorder_import::import(&notebook, &imported_at)?;

        let mut tables = Tables::new();
        for event in &events {
            tables.apply_all(reduce(event, &tables));
        }

        match format {
            Format::Json => {
                println!("{}", serde_json::to_string_pretty(&events)?);
            }
            Format::Table => {
                for (id, index) in cellorder_core::query::cell_ordering(&tables) {
                    println!("{index}  {id}");
                }
                for (id, _, _) in cellorder_core::query::cell_references(&tables) {
                    let outputs = cellorder_core::query::outputs_for_cell(&tables, &id);
                    if !outputs.is_empty() {
                        println!("  {id}: {} output(s)", outputs.len());
                    }
                }
            }
        }

        Ok(())
    }

    /// A locale-free `YYYY-MM-DD` stamp derived from `SystemTime`, since this
    /// crate doesn't otherwise depend on a calendar library.
    fn chrono_free_today() -> String {
        use std::time::{SystemTime, UNIX_EPOCH};

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let days = secs / 86_400;

        // Civil-from-days (Howard Hinnant's algorithm), good for the proleptic
        // Gregorian calendar without pulling in a date crate for one label.
        let z = days as i64 + 719_468;
        let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
        let doe = (z - era * 146_097) as u64;
        let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
        let y = yoe as i64 + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let d = doy - (153 * mp + 2) / 5 + 1;
        let m = if mp < 10 { mp + 3 } else { mp - 9 };
        let y = if m <= 2 { y + 1 } else { y };

        format!("{y:04}-{m:02}-{d:02}")
    }
}
