use anyhow::{Context as _, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use ecodesc::Dataset;
use ecodesc::config::{self, Settings};
use ecodesc::descriptor::{GridShape, render_markdown};
use ecodesc::query::{SplitEdges, Splits, Subset};
use ecodesc::validation::data::{DataCheckOptions, DataReport, check_data_file};
use ecodesc::validation::{
    ValidateOptions, Violation, count_by_severity, is_failure, validate_with,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "ecodesc",
    version,
    about = "Parse, validate and check ecological dataset descriptors"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to rolling files in the data directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a descriptor and check its invariants
    Validate {
        /// Path to the descriptor file
        descriptor: PathBuf,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,

        /// Accept cols entries that have no column section
        #[arg(long)]
        allow_free_form: bool,

        /// Also check the referenced CSV file
        #[arg(long)]
        data: bool,

        /// Report format. Defaults to the configured format.
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
    },
    /// Print a parsed descriptor in another format
    Show {
        /// Path to the descriptor file
        descriptor: PathBuf,

        #[arg(long, value_enum, default_value_t = ShowFormat::Descriptor)]
        format: ShowFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check subset and split expressions, then the data they select
    Check {
        /// Path to the descriptor file
        descriptor: PathBuf,

        /// Row filter, e.g. "year==2010; row>=1"
        #[arg(long)]
        subset: Option<String>,

        /// Plot splits, e.g. "row:2; column:2"
        #[arg(long)]
        splits: Option<String>,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,

        /// Report format. Defaults to the configured format.
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
    },
    /// Inspect or create the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the settings file location
    Path,
    /// Print the effective settings as JSON
    Show,
    /// Write a settings file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    Descriptor,
    Json,
    Markdown,
}

/// Everything a `validate` or `check` run found.
#[derive(Debug, Serialize)]
struct Report {
    descriptor: PathBuf,
    dataset: String,
    columns: usize,
    grid: Option<GridShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<DataSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    split_edges: Vec<SplitEdges>,
    violations: Vec<Violation>,
    passed: bool,
}

#[derive(Debug, Serialize)]
struct DataSummary {
    path: Option<PathBuf>,
    rows: u64,
    rows_selected: u64,
}

impl From<&DataReport> for DataSummary {
    fn from(report: &DataReport) -> Self {
        Self {
            path: report.path.clone(),
            rows: report.rows,
            rows_selected: report.rows_selected,
        }
    }
}

/// Runs a command; `Ok(false)` means it ran but found problems.
pub fn run_command(command: Commands, settings: &Settings) -> Result<bool> {
    match command {
        Commands::Validate {
            descriptor,
            strict,
            allow_free_form,
            data,
            format,
        } => handle_validate(&descriptor, strict, allow_free_form, data, format, settings),
        Commands::Show {
            descriptor,
            format,
            output,
        } => handle_show(&descriptor, format, output.as_deref(), settings),
        Commands::Check {
            descriptor,
            subset,
            splits,
            strict,
            format,
        } => handle_check(
            &descriptor,
            subset.as_deref(),
            splits.as_deref(),
            strict,
            format,
            settings,
        ),
        Commands::Config { action } => handle_config(action, settings),
    }
}

fn load_descriptor(path: &Path) -> Result<Dataset> {
    Dataset::from_file(path)
        .with_context(|| format!("Failed to load descriptor {}", path.display()))
}

fn handle_validate(
    descriptor: &Path,
    strict: bool,
    allow_free_form: bool,
    data: bool,
    format: Option<ReportFormat>,
    settings: &Settings,
) -> Result<bool> {
    let dataset = load_descriptor(descriptor)?;

    let mut options = ValidateOptions::from(settings);
    options.allow_free_form_columns |= allow_free_form;
    let mut violations = validate_with(&dataset, &options);

    let data_summary = if data {
        let path = dataset.resolve_data_path(descriptor);
        let report = check_data_file(&dataset, &path, None, &DataCheckOptions::from(settings))
            .with_context(|| format!("Failed to check data file {}", path.display()))?;
        violations.extend(report.violations.iter().cloned());
        Some(DataSummary::from(&report))
    } else {
        None
    };

    let report = build_report(
        descriptor,
        &dataset,
        data_summary,
        Vec::new(),
        violations,
        strict || settings.strict,
        &options,
    );
    emit_report(&report, resolve_format(format, settings))?;
    Ok(report.passed)
}

fn handle_check(
    descriptor: &Path,
    subset: Option<&str>,
    splits: Option<&str>,
    strict: bool,
    format: Option<ReportFormat>,
    settings: &Settings,
) -> Result<bool> {
    let dataset = load_descriptor(descriptor)?;
    let options = ValidateOptions::from(settings);
    let mut violations = validate_with(&dataset, &options);

    let subset = Subset::parse(subset.unwrap_or_default()).context("Invalid --subset")?;
    let splits = Splits::parse(splits.unwrap_or_default()).context("Invalid --splits")?;

    let query_violations: Vec<Violation> = subset
        .validate(&dataset)
        .into_iter()
        .chain(splits.validate(&dataset, options.step_tolerance))
        .collect();
    let query_ok = !query_violations.iter().any(Violation::is_error);
    violations.extend(query_violations);

    let data_summary = if query_ok {
        let path = dataset.resolve_data_path(descriptor);
        let subset = (!subset.is_empty()).then_some(&subset);
        let report = check_data_file(&dataset, &path, subset, &DataCheckOptions::from(settings))
            .with_context(|| format!("Failed to check data file {}", path.display()))?;
        violations.extend(report.violations.iter().cloned());
        Some(DataSummary::from(&report))
    } else {
        tracing::warn!("Skipping data check: the query expressions have errors");
        None
    };

    let report = build_report(
        descriptor,
        &dataset,
        data_summary,
        splits.edges(&dataset),
        violations,
        strict || settings.strict,
        &options,
    );
    emit_report(&report, resolve_format(format, settings))?;
    Ok(report.passed)
}

fn handle_show(
    descriptor: &Path,
    format: ShowFormat,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<bool> {
    let dataset = load_descriptor(descriptor)?;

    let rendered = match format {
        ShowFormat::Descriptor => dataset.to_descriptor_string(),
        ShowFormat::Json => dataset.to_json()?,
        ShowFormat::Markdown => render_markdown(&dataset, settings.step_tolerance),
    };

    if let Some(output) = output {
        std::fs::write(output, rendered)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        tracing::info!("Wrote {}", output.display());
    } else {
        print!("{rendered}");
        if !rendered.ends_with('\n') {
            println!();
        }
    }
    Ok(true)
}

fn handle_config(action: ConfigAction, settings: &Settings) -> Result<bool> {
    match action {
        ConfigAction::Path => println!("{}", config::get_config_path().display()),
        ConfigAction::Show => println!("{}", serde_json::to_string_pretty(settings)?),
        ConfigAction::Init { force } => {
            let path = config::get_config_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "Settings file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            let path = config::save_settings(&Settings::default())?;
            println!("Wrote default settings to {}", path.display());
        }
    }
    Ok(true)
}

fn resolve_format(format: Option<ReportFormat>, settings: &Settings) -> ReportFormat {
    format.unwrap_or_else(|| {
        ReportFormat::from_str(&settings.default_format, true).unwrap_or(ReportFormat::Text)
    })
}

fn build_report(
    descriptor: &Path,
    dataset: &Dataset,
    data: Option<DataSummary>,
    split_edges: Vec<SplitEdges>,
    violations: Vec<Violation>,
    strict: bool,
    options: &ValidateOptions,
) -> Report {
    Report {
        descriptor: descriptor.to_path_buf(),
        dataset: dataset.name.clone(),
        columns: dataset.columns.len(),
        grid: dataset.grid(options.step_tolerance),
        data,
        split_edges,
        passed: !is_failure(&violations, strict),
        violations,
    }
}

fn emit_report(report: &Report, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        ReportFormat::Text => print!("{}", render_text_report(report)),
    }
    Ok(())
}

fn render_text_report(report: &Report) -> String {
    let mut out = format!(
        "{}: {} ({} columns",
        report.descriptor.display(),
        report.dataset,
        report.columns
    );
    if let Some(grid) = report.grid {
        out.push_str(&format!(", grid {grid}"));
    }
    out.push_str(")\n");

    if let Some(data) = &report.data {
        let path = data
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "data: {path}, {} rows ({} selected)\n",
            data.rows, data.rows_selected
        ));
    }

    for split in &report.split_edges {
        let edges: Vec<String> = split.edges.iter().map(ToString::to_string).collect();
        out.push_str(&format!("split {}: [{}]\n", split.column, edges.join(", ")));
    }

    for violation in &report.violations {
        out.push_str(&format!("  {violation}\n"));
    }

    let (errors, warnings) = count_by_severity(&report.violations);
    if report.passed {
        out.push_str(&format!("OK ({errors} error(s), {warnings} warning(s))\n"));
    } else {
        out.push_str(&format!("FAILED ({errors} error(s), {warnings} warning(s))\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_args() {
        let cli = Cli::try_parse_from([
            "ecodesc",
            "-vv",
            "check",
            "ANBO.txt",
            "--subset",
            "year==2010",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Check { subset, format, .. } = cli.command else {
            panic!("expected check command");
        };
        assert_eq!(subset.as_deref(), Some("year==2010"));
        assert_eq!(format, Some(ReportFormat::Json));
    }

    #[test]
    fn test_resolve_format_falls_back_to_settings() {
        let settings = Settings {
            default_format: "JSON".to_owned(),
            ..Settings::default()
        };
        assert_eq!(resolve_format(None, &settings), ReportFormat::Json);
        assert_eq!(
            resolve_format(Some(ReportFormat::Text), &settings),
            ReportFormat::Text
        );

        let unknown = Settings {
            default_format: "yaml".to_owned(),
            ..Settings::default()
        };
        assert_eq!(resolve_format(None, &unknown), ReportFormat::Text);
    }

    #[test]
    fn test_render_text_report() {
        let report = Report {
            descriptor: PathBuf::from("ANBO.txt"),
            dataset: "Anza-Borrego".to_owned(),
            columns: 6,
            grid: Some(GridShape {
                x_cells: 4,
                y_cells: 4,
            }),
            data: None,
            split_edges: vec![SplitEdges {
                column: "row".to_owned(),
                edges: vec![0.0, 2.0, 4.0],
            }],
            violations: Vec::new(),
            passed: true,
        };

        let text = render_text_report(&report);
        assert!(text.starts_with("ANBO.txt: Anza-Borrego (6 columns, grid 4 x 4 (16 cells))\n"));
        assert!(text.contains("split row: [0, 2, 4]\n"));
        assert!(text.ends_with("OK (0 error(s), 0 warning(s))\n"));
    }
}
