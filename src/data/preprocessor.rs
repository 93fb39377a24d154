// ============================================================
// Layer 4 - Feature Preprocessor
// ============================================================
// Turns table columns into a dense numeric feature matrix.
//
// Per column kind:
//   Numeric     → impute missing with the mean, then standardise
//   Boolean     → 1.0 / 0.0, missing filled with the mean
//   Categorical → impute with the mode, one-hot encode the most
//                 frequent levels (unseen levels → all zeros)
//   Text, Empty → dropped
//
// The pipeline is fitted on training rows only and then
// applied unchanged to validation / hold-out rows, so no
// statistics leak from rows the model is scored on. The
// fitted state is serialisable and stored with the model.
//
// Reference: Rust Book §8 (Collections)

use std::collections::HashMap;

use anyhow::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::table::{is_missing, parse_bool, parse_number, ColumnKind, Table};

/// Categorical columns keep at most this many one-hot levels.
pub const MAX_ONE_HOT_LEVELS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureTransform {
    Numeric { column: String, index: usize, mean: f64, std: f64 },
    Boolean { column: String, index: usize, fill: f64 },
    OneHot  { column: String, index: usize, fill: String, levels: Vec<String> },
}

impl FeatureTransform {
    fn width(&self) -> usize {
        match self {
            FeatureTransform::OneHot { levels, .. } => levels.len(),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipeline {
    pub transforms: Vec<FeatureTransform>,
    /// Columns that produced no features (text, empty, target)
    pub dropped:    Vec<String>,
}

impl FeaturePipeline {
    /// Fit the pipeline on `rows` of `table`, never using `exclude`
    /// (the target column) as a feature.
    pub fn fit(table: &Table, rows: &[usize], exclude: Option<usize>) -> Result<Self> {
        let subset = table.select_rows(rows);
        let mut transforms = Vec::new();
        let mut dropped = Vec::new();

        for (index, column) in table.headers.iter().enumerate() {
            if Some(index) == exclude {
                dropped.push(column.clone());
                continue;
            }
            match subset.column_kind(index) {
                ColumnKind::Numeric => {
                    let values: Vec<f64> = subset
                        .numeric_column(index)
                        .into_iter()
                        .flatten()
                        .collect();
                    let (mean, std) = mean_std(&values);
                    transforms.push(FeatureTransform::Numeric {
                        column: column.clone(),
                        index,
                        mean,
                        std: if std > 1e-12 { std } else { 1.0 },
                    });
                }
                ColumnKind::Boolean => {
                    let values: Vec<f64> = subset
                        .column(index)
                        .filter_map(parse_bool)
                        .map(|b| if b { 1.0 } else { 0.0 })
                        .collect();
                    let (fill, _) = mean_std(&values);
                    transforms.push(FeatureTransform::Boolean { column: column.clone(), index, fill });
                }
                ColumnKind::Categorical => {
                    let levels = top_levels(subset.present_values(index), MAX_ONE_HOT_LEVELS);
                    let fill = levels.first().cloned().unwrap_or_default();
                    transforms.push(FeatureTransform::OneHot {
                        column: column.clone(),
                        index,
                        fill,
                        levels,
                    });
                }
                ColumnKind::Text | ColumnKind::Empty => {
                    tracing::debug!("Dropping column '{}' from features", column);
                    dropped.push(column.clone());
                }
            }
        }

        let pipeline = Self { transforms, dropped };
        if pipeline.width() == 0 {
            anyhow::bail!("No usable feature columns (only text, empty or target columns found)");
        }
        Ok(pipeline)
    }

    /// Number of output features.
    pub fn width(&self) -> usize {
        self.transforms.iter().map(FeatureTransform::width).sum()
    }

    /// Output feature names, in matrix column order.
    pub fn feature_names(&self) -> Vec<String> {
        self.transforms
            .iter()
            .flat_map(|t| match t {
                FeatureTransform::Numeric { column, .. }
                | FeatureTransform::Boolean { column, .. } => vec![column.clone()],
                FeatureTransform::OneHot { column, levels, .. } => levels
                    .iter()
                    .map(|l| format!("{column}_{l}"))
                    .collect(),
            })
            .collect()
    }

    /// Apply the fitted pipeline to `rows` of `table`.
    pub fn transform(&self, table: &Table, rows: &[usize]) -> Array2<f32> {
        let mut x = Array2::<f32>::zeros((rows.len(), self.width()));

        for (r, &row) in rows.iter().enumerate() {
            let cells = &table.rows[row];
            let mut c = 0;
            for t in &self.transforms {
                match t {
                    FeatureTransform::Numeric { index, mean, std, .. } => {
                        let v = parse_number(&cells[*index]).unwrap_or(*mean);
                        x[[r, c]] = ((v - mean) / std) as f32;
                    }
                    FeatureTransform::Boolean { index, fill, .. } => {
                        let v = parse_bool(&cells[*index])
                            .map(|b| if b { 1.0 } else { 0.0 })
                            .unwrap_or(*fill);
                        x[[r, c]] = v as f32;
                    }
                    FeatureTransform::OneHot { index, fill, levels, .. } => {
                        let raw = &cells[*index];
                        let value = if is_missing(raw) { fill.as_str() } else { raw.trim() };
                        if let Some(pos) = levels.iter().position(|l| l == value) {
                            x[[r, c + pos]] = 1.0;
                        }
                    }
                }
                c += t.width();
            }
        }
        x
    }
}

/// Maps class labels to contiguous indices, sorted for stable output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = labels
            .into_iter()
            .filter(|l| !is_missing(l))
            .map(|l| l.trim().to_string())
            .collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label.trim())).ok()
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }
}

/// Mean and population standard deviation; (0, 0) for no values.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Most frequent values first; ties broken alphabetically.
fn top_levels(values: Vec<&str>, limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let mut levels: Vec<(&str, usize)> = counts.into_iter().collect();
    levels.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    levels.into_iter().take(limit).map(|(l, _)| l.to_string()).collect()
}
