// ============================================================
// Layer 5 - Scoring Metrics
// ============================================================
// Scores used to rank candidate models on the leaderboard.
//
//   Classification: accuracy, macro-averaged F1
//   Regression:     MAE, MSE, RMSE, R2
//   Clustering:     silhouette, inertia
//
// Class labels arrive as f32 class indices (the same encoding
// the burn targets use) and are compared after rounding.

use ndarray::{Array2, ArrayView1};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Silhouette is quadratic in the number of points; larger inputs
/// are scored on a seeded sample of this size.
const SILHOUETTE_SAMPLE: usize = 1000;

pub fn accuracy(y_true: &[f32], y_pred: &[f32]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(t, p)| t.round() == p.round())
        .count();
    correct as f64 / y_true.len() as f64
}

/// Unweighted mean of per-class F1. Classes absent from both the
/// truth and the predictions are skipped.
pub fn f1_macro(y_true: &[f32], y_pred: &[f32], n_classes: usize) -> f64 {
    let mut scores = Vec::with_capacity(n_classes);
    for class in 0..n_classes {
        let c = class as f32;
        let (mut tp, mut fp, mut fneg) = (0usize, 0usize, 0usize);
        for (t, p) in y_true.iter().zip(y_pred) {
            let (is_t, is_p) = (t.round() == c, p.round() == c);
            match (is_t, is_p) {
                (true, true)  => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fneg += 1,
                _ => {}
            }
        }
        if tp + fp + fneg == 0 {
            continue;
        }
        scores.push(2.0 * tp as f64 / (2 * tp + fp + fneg) as f64);
    }
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

pub fn mae(y_true: &[f32], y_pred: &[f32]) -> f64 {
    mean(y_true.iter().zip(y_pred).map(|(t, p)| (*t as f64 - *p as f64).abs()))
}

pub fn mse(y_true: &[f32], y_pred: &[f32]) -> f64 {
    mean(y_true.iter().zip(y_pred).map(|(t, p)| (*t as f64 - *p as f64).powi(2)))
}

pub fn rmse(y_true: &[f32], y_pred: &[f32]) -> f64 {
    mse(y_true, y_pred).sqrt()
}

/// Coefficient of determination. A constant truth scores 1.0 when
/// matched exactly and 0.0 otherwise.
pub fn r2(y_true: &[f32], y_pred: &[f32]) -> f64 {
    let mean_t = mean(y_true.iter().map(|v| *v as f64));
    let ss_tot: f64 = y_true.iter().map(|t| (*t as f64 - mean_t).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (*t as f64 - *p as f64).powi(2))
        .sum();
    if ss_tot <= f64::EPSILON {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Sum of squared distances from each point to its centroid.
pub fn inertia(x: &Array2<f32>, labels: &[usize], centroids: &Array2<f32>) -> f64 {
    x.outer_iter()
        .zip(labels)
        .map(|(row, &l)| squared_distance(row, centroids.row(l)))
        .sum()
}

/// Mean silhouette coefficient in [-1, 1]. Needs at least two
/// clusters; otherwise 0.0.
pub fn silhouette(x: &Array2<f32>, labels: &[usize], seed: u64) -> f64 {
    let n_clusters = labels.iter().copied().max().map_or(0, |m| m + 1);
    if n_clusters < 2 || x.nrows() < 3 {
        return 0.0;
    }

    let mut points: Vec<usize> = (0..x.nrows()).collect();
    if points.len() > SILHOUETTE_SAMPLE {
        let mut rng = StdRng::seed_from_u64(seed);
        points.shuffle(&mut rng);
        points.truncate(SILHOUETTE_SAMPLE);
    }

    let mut total = 0.0;
    for &i in &points {
        let mut sums = vec![0.0f64; n_clusters];
        let mut counts = vec![0usize; n_clusters];
        for &j in &points {
            if i == j {
                continue;
            }
            sums[labels[j]] += squared_distance(x.row(i), x.row(j)).sqrt();
            counts[labels[j]] += 1;
        }
        let own = labels[i];
        if counts[own] == 0 {
            // singleton clusters contribute 0
            continue;
        }
        let a = sums[own] / counts[own] as f64;
        let b = (0..n_clusters)
            .filter(|&c| c != own && counts[c] > 0)
            .map(|c| sums[c] / counts[c] as f64)
            .fold(f64::INFINITY, f64::min);
        if b.is_finite() {
            total += (b - a) / a.max(b).max(f64::EPSILON);
        }
    }
    total / points.len() as f64
}

pub fn squared_distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64 - *y as f64).powi(2))
        .sum()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy_and_f1() {
        let t = [0.0, 0.0, 1.0, 1.0];
        let p = [0.0, 1.0, 1.0, 1.0];
        assert!((accuracy(&t, &p) - 0.75).abs() < 1e-9);
        // class 0: tp=1 fn=1 → 2/3, class 1: tp=2 fp=1 → 4/5
        let expected = (2.0 / 3.0 + 0.8) / 2.0;
        assert!((f1_macro(&t, &p, 2) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_regression_errors() {
        let t = [1.0, 2.0, 3.0];
        let p = [1.0, 2.0, 5.0];
        assert!((mae(&t, &p) - 2.0 / 3.0).abs() < 1e-9);
        assert!((mse(&t, &p) - 4.0 / 3.0).abs() < 1e-9);
        assert!((rmse(&t, &p) - (4.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert!((r2(&t, &t) - 1.0).abs() < 1e-9);
        // predicting the mean gives R2 = 0
        assert!(r2(&t, &[2.0, 2.0, 2.0]).abs() < 1e-9);
    }

    #[test]
    fn test_r2_constant_truth() {
        assert_eq!(r2(&[4.0, 4.0], &[4.0, 4.0]), 1.0);
        assert_eq!(r2(&[4.0, 4.0], &[3.0, 4.0]), 0.0);
    }

    #[test]
    fn test_silhouette_well_separated() {
        let x = array![[0.0f32, 0.0], [0.1, 0.0], [10.0, 10.0], [10.1, 10.0]];
        let good = silhouette(&x, &[0, 0, 1, 1], 0);
        let bad  = silhouette(&x, &[0, 1, 0, 1], 0);
        assert!(good > 0.9);
        assert!(bad < 0.0);
    }

    #[test]
    fn test_inertia() {
        let x = array![[0.0f32], [2.0]];
        let c = array![[1.0f32]];
        assert!((inertia(&x, &[0, 0], &c) - 2.0).abs() < 1e-9);
    }
}
