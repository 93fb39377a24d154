// ============================================================
// Layer 4 - Train/Hold-out Splitter and K-Fold
// ============================================================
// Shuffles row indices and partitions them for model
// comparison:
//   - split_train_holdout: one shuffled cut, e.g. 70% / 30%
//   - k_fold:              k disjoint validation folds over
//                          the training rows
//
// Every shuffle is driven by an explicit seed (the session id)
// so two runs over the same file compare the same folds.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `0..n` with `seed` and split it into (train, holdout).
///
/// `train_fraction` is clamped to [0, 1]. The split index is
/// rounded, so 10 rows at 0.7 gives 7 training rows.
pub fn split_train_holdout(n: usize, train_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let split_at = ((n as f64) * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = split_at.min(n);

    // split_off(n) keeps [0..split_at] in place and returns the rest
    let holdout = indices.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} hold-out",
        indices.len(),
        holdout.len()
    );
    (indices, holdout)
}

/// One cross-validation fold, as positions into the slice given
/// to `k_fold`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    pub train:      Vec<usize>,
    pub validation: Vec<usize>,
}

/// Partition `0..n` into `k` shuffled folds.
///
/// `k` is clamped to `2..=n`; fewer than two rows cannot be
/// cross-validated and yields no folds. Fold sizes differ by at
/// most one.
pub fn k_fold(n: usize, k: usize, seed: u64) -> Vec<Fold> {
    if n < 2 {
        return Vec::new();
    }
    let k = k.clamp(2, n);

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;

    for f in 0..k {
        let size = base + usize::from(f < extra);
        let validation = order[start..start + size].to_vec();
        let train = order[..start]
            .iter()
            .chain(order[start + size..].iter())
            .copied()
            .collect();
        folds.push(Fold { train, validation });
        start += size;
    }
    folds
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_correct_split_sizes() {
        let (train, holdout) = split_train_holdout(100, 0.7, 123);
        assert_eq!(train.len(), 70);
        assert_eq!(holdout.len(), 30);
    }

    #[test]
    fn test_all_items_preserved() {
        let (train, holdout) = split_train_holdout(50, 0.7, 1);
        let all: HashSet<usize> = train.iter().chain(holdout.iter()).copied().collect();
        assert_eq!(all.len(), 50);
    }

    #[test]
    fn test_same_seed_same_split() {
        assert_eq!(split_train_holdout(30, 0.5, 9), split_train_holdout(30, 0.5, 9));
    }

    #[test]
    fn test_empty_dataset() {
        let (train, holdout) = split_train_holdout(0, 0.8, 0);
        assert!(train.is_empty());
        assert!(holdout.is_empty());
    }

    #[test]
    fn test_k_fold_covers_every_row_once() {
        let folds = k_fold(23, 5, 7);
        assert_eq!(folds.len(), 5);

        let mut seen = vec![0usize; 23];
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.validation.len(), 23);
            for &i in &fold.validation {
                seen[i] += 1;
            }
            let sizes = fold.validation.len();
            assert!(sizes == 4 || sizes == 5);
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_k_fold_clamps_k() {
        assert_eq!(k_fold(3, 10, 0).len(), 3);
        assert_eq!(k_fold(10, 1, 0).len(), 2);
        assert!(k_fold(1, 5, 0).is_empty());
    }
}
