// ============================================================
// Layer 5 - K-Means Clustering
// ============================================================
// Lloyd's algorithm with k-means++ seeding.
//
// Several seeded restarts are run and the one with the lowest
// inertia is kept. Empty clusters are re-seeded with the point
// farthest from its current centroid.

use anyhow::Result;
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::ml::metrics::{inertia, squared_distance};

const MAX_ITER: usize = 300;
const TOLERANCE: f64 = 1e-6;
const RESTARTS: u64 = 5;

#[derive(Debug, Clone)]
pub struct KMeans {
    pub k:         usize,
    pub centroids: Array2<f32>,
    pub labels:    Vec<usize>,
    pub inertia:   f64,
}

impl KMeans {
    /// Cluster the rows of `x` into `k` groups.
    pub fn fit(x: &Array2<f32>, k: usize, seed: u64) -> Result<Self> {
        if k == 0 || k > x.nrows() {
            anyhow::bail!("Cannot form {k} clusters from {} rows", x.nrows());
        }

        let mut best: Option<KMeans> = None;
        for restart in 0..RESTARTS {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(restart));
            let run = lloyd(x, k, &mut rng);
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }
        best.ok_or_else(|| anyhow::anyhow!("K-Means produced no runs"))
    }
}

fn lloyd(x: &Array2<f32>, k: usize, rng: &mut StdRng) -> KMeans {
    let mut centroids = plus_plus_init(x, k, rng);
    let mut labels = assign(x, &centroids);

    for _ in 0..MAX_ITER {
        let updated = recompute(x, &labels, k, &centroids);
        let shift: f64 = updated
            .outer_iter()
            .zip(centroids.outer_iter())
            .map(|(a, b)| squared_distance(a, b))
            .sum();
        centroids = updated;
        labels = assign(x, &centroids);
        if shift < TOLERANCE {
            break;
        }
    }

    let inertia = inertia(x, &labels, &centroids);
    KMeans { k, centroids, labels, inertia }
}

/// k-means++: each next centre is drawn with probability
/// proportional to its squared distance from the nearest centre.
fn plus_plus_init(x: &Array2<f32>, k: usize, rng: &mut StdRng) -> Array2<f32> {
    let n = x.nrows();
    let mut centroids = Array2::<f32>::zeros((k, x.ncols()));
    centroids.row_mut(0).assign(&x.row(rng.gen_range(0..n)));

    let mut nearest: Vec<f64> = x
        .outer_iter()
        .map(|r| squared_distance(r, centroids.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = nearest.iter().sum();
        let pick = if total <= 0.0 {
            rng.gen_range(0..n)
        } else {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, d) in nearest.iter().enumerate() {
                if target < *d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        };
        centroids.row_mut(c).assign(&x.row(pick));
        for (i, row) in x.outer_iter().enumerate() {
            nearest[i] = nearest[i].min(squared_distance(row, centroids.row(c)));
        }
    }
    centroids
}

fn assign(x: &Array2<f32>, centroids: &Array2<f32>) -> Vec<usize> {
    x.outer_iter()
        .map(|row| {
            centroids
                .outer_iter()
                .enumerate()
                .map(|(c, centre)| (squared_distance(row, centre), c))
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map_or(0, |(_, c)| c)
        })
        .collect()
}

fn recompute(x: &Array2<f32>, labels: &[usize], k: usize, previous: &Array2<f32>) -> Array2<f32> {
    let mut sums = Array2::<f64>::zeros((k, x.ncols()));
    let mut counts = vec![0usize; k];
    for (row, &l) in x.outer_iter().zip(labels) {
        for (j, v) in row.iter().enumerate() {
            sums[[l, j]] += *v as f64;
        }
        counts[l] += 1;
    }

    let mut centroids = Array2::<f32>::zeros((k, x.ncols()));
    for c in 0..k {
        if counts[c] == 0 {
            // re-seed with the worst-served point
            let far = x
                .outer_iter()
                .zip(labels)
                .enumerate()
                .map(|(i, (row, &l))| (squared_distance(row, previous.row(l)), i))
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .map_or(0, |(_, i)| i);
            centroids.row_mut(c).assign(&x.row(far));
            continue;
        }
        for j in 0..x.ncols() {
            centroids[[c, j]] = (sums[[c, j]] / counts[c] as f64) as f32;
        }
    }
    centroids
}
