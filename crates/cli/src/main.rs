use clap::{Parser, Subcommand, ValueEnum};
use medstat_core::{
    load_dataset, EngineConfig, InMemorySource, NonEmptyText, ReportAssembler, ReportKind,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Parser)]
#[command(name = "medstat")]
#[command(about = "Hospital statistical reporting CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available report kinds
    Kinds,
    /// Generate a report from a dataset file
    Report {
        #[command(flatten)]
        target: Target,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Print the (label, value) series of one breakdown, with status colours where declared
    Chart {
        #[command(flatten)]
        target: Target,
        /// Breakdown name, e.g. monthly, status, hour_of_day
        #[arg(long, default_value = "monthly")]
        breakdown: String,
    },
}

#[derive(clap::Args)]
struct Target {
    /// Report kind (clinic, ward, appointment, dialysis, prescription, lab)
    kind: String,
    /// Calendar year
    #[arg(long)]
    year: i32,
    /// Month 1-12; omit for an annual report
    #[arg(long)]
    month: Option<u32>,
    /// JSON or YAML dataset file with records keyed by kind
    #[arg(long)]
    data: PathBuf,
    /// Organisation named in the narrative (overrides MEDSTAT_ORGANISATION)
    #[arg(long)]
    organisation: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medstat_core=warn".parse()?)
                .add_directive("medstat=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Kinds) => {
            for kind in ReportKind::ALL {
                let profile = kind.profile();
                let statuses: Vec<&str> = profile.statuses.iter().map(|s| s.key).collect();
                println!("{:<13} {} [{}]", kind.as_str(), profile.title, statuses.join(", "));
            }
        }
        Some(Commands::Report { target, format }) => {
            let report = generate(&target)?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                Format::Text => print!("{}", render::render_text(&report)),
            }
        }
        Some(Commands::Chart { target, breakdown }) => {
            let report = generate(&target)?;
            let Some(series) = report.chart_series(&breakdown) else {
                let known: Vec<&str> = report.breakdowns().iter().map(|b| b.name()).collect();
                anyhow::bail!(
                    "unknown breakdown '{breakdown}'; available: {}",
                    known.join(", ")
                );
            };
            for point in series {
                match point.colour {
                    Some(colour) => println!("{}\t{}\t{colour}", point.label, point.value),
                    None => println!("{}\t{}", point.label, point.value),
                }
            }
        }
        None => {
            println!("Use 'medstat --help' for commands");
        }
    }

    Ok(())
}

fn generate(target: &Target) -> anyhow::Result<medstat_core::Report> {
    let kind: ReportKind = target.kind.parse()?;
    let config = engine_config(target.organisation.as_deref())?;
    let dataset = load_dataset(&target.data)?;
    tracing::debug!(
        path = %target.data.display(),
        kinds = dataset.records.len(),
        "dataset loaded"
    );
    let assembler = ReportAssembler::new(config, InMemorySource::from_dataset(dataset));
    let report = assembler.generate(kind, target.year, target.month)?;
    tracing::info!(
        kind = %kind,
        period = %report.period(),
        total = report.summary().total,
        "report generated"
    );
    Ok(report)
}

/// Resolve the engine configuration from the environment, with an optional organisation
/// override from the command line.
fn engine_config(organisation: Option<&str>) -> anyhow::Result<EngineConfig> {
    let config = EngineConfig::from_env_values(
        std::env::var("MEDSTAT_MIN_YEAR").ok(),
        std::env::var("MEDSTAT_MAX_YEAR").ok(),
        std::env::var("MEDSTAT_ORGANISATION").ok(),
        std::env::var("MEDSTAT_LOG_UNKNOWN").ok(),
    )?;

    match organisation {
        None => Ok(config),
        Some(name) => Ok(EngineConfig::new(
            config.min_year(),
            config.max_year(),
            NonEmptyText::new(name)?,
            config.log_unknown_categories(),
        )?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn target(dir: &TempDir, organisation: Option<&str>) -> Target {
        let data = dir.path().join("dataset.json");
        fs::write(
            &data,
            r#"{"records": {"dialysis": [
                {"id": 1, "timestamp": "2024-02-03T08:00:00", "status": "COMPLETED", "category": "M-01", "value": 240},
                {"id": 2, "timestamp": "2024-02-04T08:00:00", "status": "INTERRUPTED", "category": "M-02", "value": 90}
            ]}}"#,
        )
        .unwrap();
        Target {
            kind: "dialysis".into(),
            year: 2024,
            month: Some(2),
            data,
            organisation: organisation.map(str::to_string),
        }
    }

    #[test]
    fn generates_report_from_dataset_file() {
        let dir = TempDir::new().unwrap();
        let report = generate(&target(&dir, Some("Northgate Renal Unit"))).unwrap();

        assert_eq!(report.summary().total, 2);
        assert_eq!(report.organisation(), "Northgate Renal Unit");
        let status = report.chart_series("status").unwrap();
        assert_eq!(status[0].label, "Completed");
        assert!(status[0].colour.is_some());
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut bad = target(&dir, None);
        bad.kind = "radiology".into();
        assert!(generate(&bad).is_err());
    }

    #[test]
    fn blank_organisation_override_is_rejected() {
        assert!(engine_config(Some("   ")).is_err());
    }
}
