//! Kolosal CV command-line module
//!
//! Runs repeated cross-validation over one or more data files and prints
//! model search grids.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::{CvConfig, ModelKind};
use crate::data::{DataLoader, Dataset};
use crate::pipeline::CrossValidationOrchestrator;
use crate::report;
use crate::training::ModelFactory;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn step_fail(detail: &str) {
    println!("{} {}", "failed".red(), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "kolosal-cv")]
#[command(author = "KolosalAI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Repeated, parallel cross-validation for classifiers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cross-validate a classifier on one or more data files
    Run {
        /// Input data files (CSV, TSV/TXT, JSON, or Parquet)
        #[arg(short, long, num_args = 1.., required = true)]
        files: Vec<PathBuf>,

        /// Model kind (random-forest, linear-svm, rbf-svm, logistic-regression)
        #[arg(short, long)]
        model: Option<String>,

        /// Run the nested grid search in every fold
        #[arg(long)]
        grid_search: bool,

        /// Run recursive feature elimination in every fold
        #[arg(long)]
        feature_selection: bool,

        /// Grid density for C and gamma
        #[arg(long)]
        trials: Option<usize>,

        /// Number of outer cross-validation folds
        #[arg(short = 's', long)]
        splits: Option<usize>,

        /// Number of inner folds for the grid search
        #[arg(short = 'p', long)]
        param_search_splits: Option<usize>,

        /// First row of each file holds column names
        #[arg(short = 'H', long)]
        header: bool,

        /// Label column index (default: last column)
        #[arg(short = 'A', long)]
        answer: Option<usize>,

        /// Column indices to drop
        #[arg(short = 'I', long, num_args = 1..)]
        ignore: Vec<usize>,

        /// Seed for fold shuffling and model randomness
        #[arg(long)]
        seed: Option<u64>,

        /// JSON configuration file; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the full JSON report here
        #[arg(long)]
        output_json: Option<PathBuf>,

        /// Write the tab-separated summary here
        #[arg(long)]
        output_csv: Option<PathBuf>,
    },

    /// Print the hyperparameter grid of a model kind
    Grid {
        /// Model kind
        #[arg(short, long)]
        model: String,

        /// Grid density for C and gamma
        #[arg(long, default_value = "3")]
        trials: usize,
    },
}

/// Flags of the `run` subcommand that override the configuration
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub model: Option<String>,
    pub grid_search: bool,
    pub feature_selection: bool,
    pub trials: Option<usize>,
    pub splits: Option<usize>,
    pub param_search_splits: Option<usize>,
    pub seed: Option<u64>,
}

/// Start from the config file (or defaults) and apply command-line flags
pub fn build_config(config_path: Option<&PathBuf>, overrides: RunOverrides) -> anyhow::Result<CvConfig> {
    let mut config = match config_path {
        Some(path) => CvConfig::from_json_file(path)?,
        None => CvConfig::default(),
    };

    if let Some(model) = overrides.model {
        config.model = model.parse::<ModelKind>()?;
    }
    config.grid_search |= overrides.grid_search;
    config.feature_selection |= overrides.feature_selection;
    if let Some(trials) = overrides.trials {
        config.trials = trials;
    }
    if let Some(splits) = overrides.splits {
        config.n_splits = splits;
    }
    if let Some(splits) = overrides.param_search_splits {
        config.param_search_splits = splits;
    }
    if let Some(seed) = overrides.seed {
        config.random_seed = seed;
    }

    config.validate()?;
    Ok(config)
}

pub fn cmd_run(
    files: &[PathBuf],
    loader: &DataLoader,
    config: CvConfig,
    output_json: Option<&PathBuf>,
    output_csv: Option<&PathBuf>,
) -> anyhow::Result<()> {
    section("Cross-validation");
    println!("  {}", kv("Model       ", config.model.as_str()));
    println!("  {}", kv("Folds       ", &config.n_splits.to_string()));
    println!("  {}", kv("Grid search ", &config.grid_search.to_string()));
    println!("  {}", kv("Selection   ", &config.feature_selection.to_string()));
    println!("  {}", kv("Seed        ", &config.random_seed.to_string()));
    println!();

    let mut datasets: Vec<(String, Dataset)> = Vec::new();
    let mut load_failures: Vec<(String, String)> = Vec::new();
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        step_run(&format!("Loading {}", name));
        let start = Instant::now();
        match loader.load(path) {
            Ok(ds) => {
                step_done(&format!(
                    "{} rows × {} features ({:?})",
                    ds.n_samples(),
                    ds.n_features(),
                    start.elapsed()
                ));
                datasets.push((name, ds));
            }
            Err(e) => {
                step_fail(&e.to_string());
                load_failures.push((name, e.to_string()));
            }
        }
    }

    let orchestrator = CrossValidationOrchestrator::new(config)?;

    step_run("Cross-validating");
    let start = Instant::now();
    let mut run = orchestrator.run_many(&datasets);
    step_done(&format!("{:?}", start.elapsed()));
    run.failures.extend(load_failures);

    report::print_summary(&run);

    if let Some(path) = output_json {
        report::write_json(&run.results, path)?;
        println!("  {} {}", ok("✓"), kv("JSON report", &path.display().to_string()));
    }
    if let Some(path) = output_csv {
        report::write_summary_tsv(&run.results, path)?;
        println!("  {} {}", ok("✓"), kv("Summary    ", &path.display().to_string()));
    }

    if run.results.is_empty() {
        anyhow::bail!("no dataset completed cross-validation");
    }
    Ok(())
}

pub fn cmd_grid(model: &str, trials: usize) -> anyhow::Result<()> {
    let (_, grid) = ModelFactory::build_named(model, trials)?;

    section(&format!("Search grid: {}", model));
    for name in grid.names() {
        let values: Vec<String> = grid
            .values(name)
            .unwrap_or_default()
            .iter()
            .map(|v| v.to_string())
            .collect();
        println!("  {:<20} {}", muted(name), values.join(", "));
    }
    println!("  {}", dim(&"─".repeat(56)));
    println!("  {}", kv("Candidates", &grid.n_candidates().to_string()));
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "kolosal-cv", "run", "-f", "a.csv", "b.tsv", "--model", "lr", "--grid-search",
            "--splits", "4", "--ignore", "0", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { files, model, grid_search, splits, ignore, .. } => {
                assert_eq!(files.len(), 2);
                assert_eq!(model.as_deref(), Some("lr"));
                assert!(grid_search);
                assert_eq!(splits, Some(4));
                assert_eq!(ignore, vec![0, 2]);
            }
            Commands::Grid { .. } => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn test_cli_parses_short_flags() {
        let cli = Cli::try_parse_from([
            "kolosal-cv", "run", "-f", "iris.tsv", "-s", "10", "-p", "4", "-H", "-A", "0", "-I", "1", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { splits, param_search_splits, header, answer, ignore, .. } => {
                assert_eq!(splits, Some(10));
                assert_eq!(param_search_splits, Some(4));
                assert!(header);
                assert_eq!(answer, Some(0));
                assert_eq!(ignore, vec![1, 3]);
            }
            Commands::Grid { .. } => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"model": "rbf-svm", "n_splits": 3, "trials": 2}"#).unwrap();

        let overrides = RunOverrides {
            splits: Some(4),
            grid_search: true,
            ..Default::default()
        };
        let config = build_config(Some(&path), overrides).unwrap();
        assert_eq!(config.model, ModelKind::RbfSvm);
        assert_eq!(config.n_splits, 4);
        assert_eq!(config.trials, 2);
        assert!(config.grid_search);
    }

    #[test]
    fn test_unknown_model_flag() {
        let overrides = RunOverrides {
            model: Some("naive-bayes".to_string()),
            ..Default::default()
        };
        assert!(build_config(None, overrides).is_err());
    }
}
