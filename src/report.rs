//! Result writers: JSON report, tab-separated summary, console table

use crate::error::Result;
use crate::pipeline::{AggregateResult, RunReport, SUMMARY_METRICS};
use colored::*;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Write `{ "<dataset>": AggregateResult }` as pretty-printed JSON
pub fn write_json(results: &BTreeMap<String, AggregateResult>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, results)?;
    info!(path = %path.display(), datasets = results.len(), "Wrote JSON report");
    Ok(())
}

/// One row per dataset: `filename` then `{metric}_mean` / `{metric}_std`
/// for each summarized metric, columns sorted by name
pub fn summary_frame(results: &BTreeMap<String, AggregateResult>) -> Result<DataFrame> {
    let mut metrics: Vec<&str> = SUMMARY_METRICS.to_vec();
    metrics.sort_unstable();

    let mut columns = vec![Column::new(
        "filename".into(),
        results.keys().cloned().collect::<Vec<String>>(),
    )];
    for metric in metrics {
        let (means, stds): (Vec<f64>, Vec<f64>) = results
            .values()
            .map(|r| r.summary(metric).unwrap_or((f64::NAN, f64::NAN)))
            .unzip();
        columns.push(Column::new(format!("{}_mean", metric).into(), means));
        columns.push(Column::new(format!("{}_std", metric).into(), stds));
    }

    Ok(DataFrame::new(columns)?)
}

/// Write the summary table as TSV with four decimals
pub fn write_summary_tsv(results: &BTreeMap<String, AggregateResult>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut df = summary_frame(results)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b'\t')
        .with_float_precision(Some(4))
        .finish(&mut df)?;
    info!(path = %path.display(), rows = df.height(), "Wrote summary table");
    Ok(())
}

fn fmt_stat(value: f64) -> String {
    if value.is_finite() {
        format!("{:.4}", value)
    } else {
        "-".to_string()
    }
}

/// Print accuracy and AUC per dataset, then any failures
pub fn print_summary(report: &RunReport) {
    println!();
    println!(
        "  {:<28} {:>10} {:>10} {:>10} {:>10}",
        "Dataset".dimmed(),
        "acc mean".dimmed(),
        "acc std".dimmed(),
        "auc mean".dimmed(),
        "auc std".dimmed()
    );
    println!("  {}", "─".repeat(72).dimmed());

    for (name, result) in &report.results {
        println!(
            "  {:<28} {:>10} {:>10} {:>10} {:>10}",
            name,
            fmt_stat(result.accuracy_mean).green(),
            fmt_stat(result.accuracy_std),
            fmt_stat(result.auc_mean).green(),
            fmt_stat(result.auc_std)
        );
    }
    for (name, err) in &report.failures {
        println!("  {:<28} {}", name, format!("err: {}", err).red());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CvConfig, ModelKind};
    use crate::data::Dataset;
    use crate::pipeline::CrossValidationOrchestrator;
    use ndarray::{Array1, Array2};

    fn results() -> BTreeMap<String, AggregateResult> {
        let x = Array2::from_shape_fn((12, 2), |(i, j)| {
            (if i < 6 { 0.0 } else { 2.0 }) + ((i + j) % 3) as f64 * 0.1
        });
        let y = Array1::from_shape_fn(12, |i| if i < 6 { 0.0 } else { 1.0 });
        let ds = Dataset::new(x, y, None).unwrap();
        let config = CvConfig::new(ModelKind::LogisticRegression).with_n_splits(3);
        let result = CrossValidationOrchestrator::new(config).unwrap().run(&ds).unwrap();

        let mut map = BTreeMap::new();
        map.insert("blobs.csv".to_string(), result);
        map
    }

    #[test]
    fn test_summary_frame_columns() {
        let df = summary_frame(&results()).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names[0], "filename");
        assert_eq!(names[1], "accuracy_mean");
        assert_eq!(names[3], "auc_mean");
        assert_eq!(names.len(), 11);
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let results = results();

        let json_path = dir.path().join("out.json");
        write_json(&results, &json_path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert!(json["blobs.csv"]["accuracy_mean"].is_number());
        assert_eq!(json["blobs.csv"]["cv"].as_array().unwrap().len(), 3);

        let tsv_path = dir.path().join("summary.tsv");
        write_summary_tsv(&results, &tsv_path).unwrap();
        let text = std::fs::read_to_string(&tsv_path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("filename\taccuracy_mean"));
        assert!(lines.next().unwrap().starts_with("blobs.csv\t"));
    }
}
