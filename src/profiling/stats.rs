// ============================================================
// Layer 7 - Profile Statistics
// ============================================================
// Everything the report shows, computed from a Table:
//
//   Overview     - shape, missing cells, duplicate rows, kinds
//   ColumnProfile - per-column distinct/missing counts plus
//                   either a numeric summary or top values
//   Correlations - Pearson r over numeric columns, using only
//                  rows where both values are present
//   Alerts       - the things worth a human's attention
//
// Percentiles use linear interpolation between closest ranks,
// the same convention as most dataframe libraries.

use std::collections::{HashMap, HashSet};

use crate::data::table::{ColumnKind, Table};
use crate::domain::artifacts::{AlertKind, ProfileAlert};

pub const HISTOGRAM_BINS: usize = 10;
pub const TOP_VALUES: usize = 10;
pub const SAMPLE_ROWS: usize = 10;
pub const PERCENTILES: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];

const HIGH_MISSING_FRACTION: f64 = 0.5;
const HIGH_CARDINALITY: usize = 50;
const HIGH_CORRELATION: f64 = 0.9;

#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub rows:           usize,
    pub columns:        usize,
    pub missing_cells:  usize,
    pub missing_pct:    f64,
    pub duplicate_rows: usize,
    pub duplicate_pct:  f64,
    /// (kind label, number of columns), only kinds that occur
    pub kinds:          Vec<(&'static str, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges
    pub edges:  Vec<f64>,
    pub counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub mean:        f64,
    pub std:         f64,
    pub min:         f64,
    pub max:         f64,
    /// (percentile, value) for each of `PERCENTILES`
    pub percentiles: Vec<(f64, f64)>,
    pub zeros:       usize,
    pub negatives:   usize,
    pub histogram:   Histogram,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name:         String,
    pub kind:         ColumnKind,
    pub distinct:     usize,
    pub distinct_pct: f64,
    pub missing:      usize,
    pub missing_pct:  f64,
    pub numeric:      Option<NumericSummary>,
    pub top_values:   Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Correlations {
    pub columns: Vec<String>,
    /// Square matrix; `None` where r is undefined
    pub matrix:  Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone)]
pub struct DatasetProfile {
    pub overview:     Overview,
    pub columns:      Vec<ColumnProfile>,
    pub correlations: Correlations,
    pub alerts:       Vec<ProfileAlert>,
    pub head:         Vec<Vec<String>>,
    pub tail:         Vec<Vec<String>>,
}

/// Compute the full profile of a table.
pub fn profile_table(table: &Table) -> DatasetProfile {
    let n_rows = table.n_rows();
    let columns: Vec<ColumnProfile> = (0..table.n_cols()).map(|i| profile_column(table, i)).collect();

    let mut kinds: Vec<(&'static str, usize)> = Vec::new();
    for kind in [ColumnKind::Numeric, ColumnKind::Boolean, ColumnKind::Categorical, ColumnKind::Text, ColumnKind::Empty] {
        let count = columns.iter().filter(|c| c.kind == kind).count();
        if count > 0 {
            kinds.push((kind.label(), count));
        }
    }

    let missing_cells: usize = columns.iter().map(|c| c.missing).sum();
    let duplicate_rows = table.duplicate_rows();
    let overview = Overview {
        rows: n_rows,
        columns: table.n_cols(),
        missing_cells,
        missing_pct: pct(missing_cells, n_rows * table.n_cols()),
        duplicate_rows,
        duplicate_pct: pct(duplicate_rows, n_rows),
        kinds,
    };

    let correlations = correlation_matrix(table, &columns);
    let alerts = collect_alerts(n_rows, &columns, &correlations);

    let head = table.rows.iter().take(SAMPLE_ROWS).cloned().collect();
    let tail = if n_rows > SAMPLE_ROWS {
        table.rows[n_rows - SAMPLE_ROWS..].to_vec()
    } else {
        Vec::new()
    };

    DatasetProfile { overview, columns, correlations, alerts, head, tail }
}

fn profile_column(table: &Table, idx: usize) -> ColumnProfile {
    let n_rows = table.n_rows();
    let present = table.present_values(idx);
    let kind = table.column_kind(idx);
    let distinct = present.iter().collect::<HashSet<_>>().len();
    let missing = n_rows - present.len();

    let numeric = if kind == ColumnKind::Numeric {
        let values: Vec<f64> = table.numeric_column(idx).into_iter().flatten().collect();
        summarize(&values)
    } else {
        None
    };
    let top_values = if kind == ColumnKind::Numeric { Vec::new() } else { top_values(&present) };

    ColumnProfile {
        name: table.headers[idx].clone(),
        kind,
        distinct,
        distinct_pct: pct(distinct, present.len()),
        missing,
        missing_pct: pct(missing, n_rows),
        numeric,
        top_values,
    }
}

/// Numeric summary of a non-empty slice.
pub fn summarize(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    Some(NumericSummary {
        mean: values.iter().sum::<f64>() / values.len() as f64,
        std: sample_std(values),
        min,
        max,
        percentiles: PERCENTILES.iter().map(|&p| (p, percentile(&sorted, p))).collect(),
        zeros: values.iter().filter(|&&v| v == 0.0).count(),
        negatives: values.iter().filter(|&&v| v < 0.0).count(),
        histogram: histogram(values, min, max, HISTOGRAM_BINS),
    })
}

/// Percentile `p` (0..=100) of an ascending slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

/// Standard deviation with the n-1 denominator; 0 below two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

pub fn histogram(values: &[f64], min: f64, max: f64, bins: usize) -> Histogram {
    let width = (max - min) / bins as f64;
    let edges = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for &v in values {
        let bin = if width > 0.0 { ((v - min) / width).floor() as usize } else { 0 };
        counts[bin.min(bins - 1)] += 1;
    }
    Histogram { edges, counts }
}

/// Most frequent values, ties broken alphabetically.
fn top_values(present: &[&str]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &v in present {
        *counts.entry(v).or_default() += 1;
    }
    let mut sorted: Vec<(&str, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted.into_iter().take(TOP_VALUES).map(|(v, c)| (v.to_string(), c)).collect()
}

/// Pearson r over the rows where both values are present.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

fn correlation_matrix(table: &Table, columns: &[ColumnProfile]) -> Correlations {
    let numeric: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == ColumnKind::Numeric)
        .map(|(i, _)| i)
        .collect();
    let data: Vec<Vec<Option<f64>>> = numeric.iter().map(|&i| table.numeric_column(i)).collect();

    let matrix = (0..numeric.len())
        .map(|i| {
            (0..numeric.len())
                .map(|j| if i == j { Some(1.0) } else { pearson(&data[i], &data[j]) })
                .collect()
        })
        .collect();

    Correlations {
        columns: numeric.iter().map(|&i| columns[i].name.clone()).collect(),
        matrix,
    }
}

fn collect_alerts(n_rows: usize, columns: &[ColumnProfile], correlations: &Correlations) -> Vec<ProfileAlert> {
    let mut alerts = Vec::new();
    let mut push = |column: &str, kind: AlertKind, detail: String| {
        alerts.push(ProfileAlert { column: column.to_string(), kind, detail });
    };

    for c in columns {
        if c.kind == ColumnKind::Empty {
            push(&c.name, AlertKind::Empty, "All values are missing".to_string());
            continue;
        }
        let present = n_rows - c.missing;
        if c.distinct == 1 {
            push(&c.name, AlertKind::Constant, "Has a single distinct value".to_string());
        } else if present > 1 && c.distinct == present {
            push(&c.name, AlertKind::Unique, "Every value is distinct".to_string());
        }
        if n_rows > 0 && c.missing as f64 / n_rows as f64 >= HIGH_MISSING_FRACTION {
            push(&c.name, AlertKind::HighMissing, format!("{:.1}% missing", c.missing_pct));
        }
        if c.kind == ColumnKind::Categorical && c.distinct > HIGH_CARDINALITY {
            push(&c.name, AlertKind::HighCardinality, format!("{} distinct values", c.distinct));
        }
    }

    for (i, row) in correlations.matrix.iter().enumerate() {
        for (j, r) in row.iter().enumerate().skip(i + 1) {
            if let Some(r) = r.filter(|r| r.abs() >= HIGH_CORRELATION) {
                push(
                    &correlations.columns[i],
                    AlertKind::HighCorrelation,
                    format!("Highly correlated with {} (r = {:.3})", correlations.columns[j], r),
                );
            }
        }
    }
    alerts
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 * 100.0 / whole as f64 }
}
