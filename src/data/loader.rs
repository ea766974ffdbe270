//! Dataset loading from delimited, Parquet and JSON files

use super::dataset::Dataset;
use crate::error::{CvError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Loads a file into a [`Dataset`]
///
/// One column holds the class label (the last one unless `answer_column`
/// is set); ignored columns are dropped and every other column becomes a
/// numeric feature.
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    has_header: bool,
    answer_column: Option<usize>,
    ignore_columns: Vec<usize>,
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self::default()
    }

    /// First row holds column names
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Column index of the class label
    pub fn with_answer_column(mut self, column: usize) -> Self {
        self.answer_column = Some(column);
        self
    }

    /// Column indices excluded from the features
    pub fn with_ignore_columns(mut self, columns: Vec<usize>) -> Self {
        self.ignore_columns = columns;
        self
    }

    /// Detect file format from extension and load
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let start = Instant::now();
        let df = self.read_frame(path)?;
        debug!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed = ?start.elapsed(),
            "read data frame"
        );
        let dataset = self.frame_to_dataset(&df)?;
        info!(
            path = %path.display(),
            samples = dataset.n_samples(),
            features = dataset.n_features(),
            classes = dataset.classes().len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    fn read_frame(&self, path: &Path) -> Result<DataFrame> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let df = match ext.as_str() {
            "parquet" | "pq" => ParquetReader::new(File::open(path)?).finish()?,
            "json" => JsonReader::new(File::open(path)?).finish()?,
            "jsonl" | "ndjson" => JsonReader::new(File::open(path)?)
                .with_json_format(JsonFormat::JsonLines)
                .finish()?,
            "tsv" | "txt" => self.read_delimited(path, b'\t')?,
            _ => self.read_delimited(path, b',')?,
        };
        Ok(df)
    }

    fn read_delimited(&self, path: &Path, separator: u8) -> Result<DataFrame> {
        let parse_opts = CsvParseOptions::default().with_separator(separator);
        let df = CsvReadOptions::default()
            .with_has_header(self.has_header)
            .with_infer_schema_length(Some(1000))
            .with_parse_options(parse_opts)
            .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
            .finish()?;
        Ok(df)
    }

    /// Split a frame into features, labels and header
    pub fn frame_to_dataset(&self, df: &DataFrame) -> Result<Dataset> {
        let columns = df.get_columns();
        if columns.len() < 2 {
            return Err(CvError::DataError(format!(
                "need at least one feature column and one label column, got {} columns",
                columns.len()
            )));
        }

        let answer = self.answer_column.unwrap_or(columns.len() - 1);
        if answer >= columns.len() {
            return Err(CvError::DataError(format!(
                "answer column {} out of range for {} columns",
                answer,
                columns.len()
            )));
        }

        let feature_idx: Vec<usize> = (0..columns.len())
            .filter(|&i| i != answer && !self.ignore_columns.contains(&i))
            .collect();
        if feature_idx.is_empty() {
            return Err(CvError::DataError("no feature columns left".to_string()));
        }

        let col_data: Vec<Vec<f64>> = feature_idx
            .iter()
            .map(|&i| column_to_f64(&columns[i]))
            .collect::<Result<Vec<_>>>()?;
        let n_rows = df.height();
        let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
        let x = Array2::from_shape_fn((n_rows, feature_idx.len()), |(r, c)| col_refs[c][r]);

        let (y, class_names) = encode_labels(&columns[answer])?;

        let header = if self.has_header {
            Some(
                feature_idx
                    .iter()
                    .map(|&i| columns[i].name().to_string())
                    .collect(),
            )
        } else {
            None
        };

        let dataset = Dataset::new(x, y, header)?;
        Ok(match class_names {
            Some(names) => dataset.with_class_names(names),
            None => dataset,
        })
    }
}

fn column_to_f64(column: &Column) -> Result<Vec<f64>> {
    let name = column.name().to_string();
    let casted = column.cast(&DataType::Float64)?;
    casted
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                CvError::DataError(format!("missing or non-numeric value in column {} row {}", name, row))
            })
        })
        .collect()
}

/// String labels become sorted integer codes; numeric labels pass through
fn encode_labels(column: &Column) -> Result<(Array1<f64>, Option<Vec<String>>)> {
    if !matches!(column.dtype(), DataType::String) {
        return Ok((Array1::from_vec(column_to_f64(column)?), None));
    }

    let values: Vec<String> = column
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(str::to_string)
                .ok_or_else(|| CvError::DataError(format!("missing label in row {}", row)))
        })
        .collect::<Result<Vec<_>>>()?;

    let names: Vec<String> = values.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
    let codes: Vec<f64> = values
        .iter()
        .map(|v| names.iter().position(|n| n == v).unwrap_or(0) as f64)
        .collect();
    debug!(classes = ?names, "encoded string labels");
    Ok((Array1::from_vec(codes), Some(names)))
}
