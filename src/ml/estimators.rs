// ============================================================
// Layer 5 - Estimators
// ============================================================
// The candidate models the AutoML comparison can pick from.
//
// Every candidate implements `Estimator`: fit on a dense
// feature matrix, predict, and describe itself as a
// serialisable `ModelState` so the winner can be stored.
//
//   Candidate              Implementation
//   ─────────────────────  ──────────────────────────────
//   Dummy Classifier       most frequent class
//   Logistic Regression    burn linear layer, cross-entropy
//   MLP Classifier         burn, one hidden layer
//   K Neighbors Classifier brute-force k-NN, majority vote
//   Gaussian Naive Bayes   per-class normal likelihoods
//   Dummy Regressor        training mean
//   Linear Regression      burn linear layer, MSE
//   MLP Regressor          burn, one hidden layer
//   K Neighbors Regressor  brute-force k-NN, mean
//
// Classification targets are class indices stored as f32.

use std::{collections::HashMap, path::Path};

use anyhow::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::domain::task::TaskType;
use crate::ml::{
    metrics::squared_distance,
    model::Head,
    trainer::{NeuralEstimator, NetSettings},
};

/// Neighbours consulted by the k-NN candidates.
const K_NEIGHBORS: usize = 5;

/// Width of the MLP candidates' hidden layer.
const MLP_HIDDEN: usize = 64;

pub trait Estimator {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()>;

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>>;

    /// Describe the fitted model; models with binary weights write
    /// them into `dir` as well.
    fn save(&self, dir: &Path) -> Result<ModelState>;
}

/// Serialisable description of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelState {
    Constant {
        value: f32,
    },
    KNeighbors {
        k:              usize,
        classification: bool,
        x:              Vec<Vec<f32>>,
        y:              Vec<f32>,
    },
    GaussianNb {
        priors: Vec<f64>,
        means:  Vec<Vec<f64>>,
        vars:   Vec<Vec<f64>>,
    },
    Neural {
        inputs:    usize,
        hidden:    usize,
        /// Number of classes, or `None` for a regression head
        n_classes: Option<usize>,
        y_mean:    f32,
        y_std:     f32,
        /// Record file name inside the model directory, without extension
        record:    String,
    },
    KMeans {
        centroids: Vec<Vec<f32>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Candidate {
    DummyClassifier,
    LogisticRegression,
    MlpClassifier,
    KNeighborsClassifier,
    GaussianNaiveBayes,
    DummyRegressor,
    LinearRegression,
    MlpRegressor,
    KNeighborsRegressor,
}

impl Candidate {
    /// Candidates compared for a supervised task.
    pub fn for_task(task: TaskType) -> Vec<Candidate> {
        match task {
            TaskType::Classification => vec![
                Candidate::LogisticRegression,
                Candidate::MlpClassifier,
                Candidate::KNeighborsClassifier,
                Candidate::GaussianNaiveBayes,
                Candidate::DummyClassifier,
            ],
            TaskType::Regression => vec![
                Candidate::LinearRegression,
                Candidate::MlpRegressor,
                Candidate::KNeighborsRegressor,
                Candidate::DummyRegressor,
            ],
            TaskType::Clustering => Vec::new(),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Candidate::DummyClassifier      => "Dummy Classifier",
            Candidate::LogisticRegression   => "Logistic Regression",
            Candidate::MlpClassifier        => "MLP Classifier",
            Candidate::KNeighborsClassifier => "K Neighbors Classifier",
            Candidate::GaussianNaiveBayes   => "Gaussian Naive Bayes",
            Candidate::DummyRegressor       => "Dummy Regressor",
            Candidate::LinearRegression     => "Linear Regression",
            Candidate::MlpRegressor         => "MLP Regressor",
            Candidate::KNeighborsRegressor  => "K Neighbors Regressor",
        }
    }

    /// A fresh, unfitted estimator. `n_classes` is ignored for
    /// regression candidates.
    pub fn build(&self, n_classes: usize, net: &NetSettings) -> Box<dyn Estimator> {
        let classify = Head::Classification(n_classes);
        match self {
            Candidate::DummyClassifier      => Box::new(ConstantEstimator::most_frequent()),
            Candidate::DummyRegressor       => Box::new(ConstantEstimator::mean()),
            Candidate::LogisticRegression   => Box::new(NeuralEstimator::new(classify, 0, net.clone())),
            Candidate::MlpClassifier        => Box::new(NeuralEstimator::new(classify, MLP_HIDDEN, net.clone())),
            Candidate::LinearRegression     => Box::new(NeuralEstimator::new(Head::Regression, 0, net.clone())),
            Candidate::MlpRegressor         => Box::new(NeuralEstimator::new(Head::Regression, MLP_HIDDEN, net.clone())),
            Candidate::KNeighborsClassifier => Box::new(KNeighbors::new(K_NEIGHBORS, true)),
            Candidate::KNeighborsRegressor  => Box::new(KNeighbors::new(K_NEIGHBORS, false)),
            Candidate::GaussianNaiveBayes   => Box::new(GaussianNb::default()),
        }
    }
}

/// Rebuild a fitted supervised estimator from its saved state.
pub fn restore(state: &ModelState, dir: &Path) -> Result<Box<dyn Estimator>> {
    match state {
        ModelState::Constant { value } => Ok(Box::new(ConstantEstimator {
            strategy: ConstantStrategy::Fixed,
            value:    Some(*value),
        })),
        ModelState::KNeighbors { k, classification, x, y } => {
            let width = x.first().map_or(0, Vec::len);
            let flat: Vec<f32> = x.iter().flatten().copied().collect();
            Ok(Box::new(KNeighbors {
                k:              *k,
                classification: *classification,
                x:              Some(Array2::from_shape_vec((x.len(), width), flat)?),
                y:              y.clone(),
            }))
        }
        ModelState::GaussianNb { priors, means, vars } => Ok(Box::new(GaussianNb {
            priors: priors.clone(),
            means:  means.clone(),
            vars:   vars.clone(),
        })),
        ModelState::Neural { .. } => Ok(Box::new(NeuralEstimator::load(state, dir)?)),
        ModelState::KMeans { .. } => {
            anyhow::bail!("K-Means models assign clusters and cannot be restored as a supervised estimator")
        }
    }
}

// ─── Constant baselines ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstantStrategy {
    MostFrequent,
    Mean,
    /// Restored from disk; `fit` keeps the stored value
    Fixed,
}

pub struct ConstantEstimator {
    strategy: ConstantStrategy,
    value:    Option<f32>,
}

impl ConstantEstimator {
    pub fn most_frequent() -> Self {
        Self { strategy: ConstantStrategy::MostFrequent, value: None }
    }

    pub fn mean() -> Self {
        Self { strategy: ConstantStrategy::Mean, value: None }
    }
}

impl Estimator for ConstantEstimator {
    fn fit(&mut self, _x: &Array2<f32>, y: &[f32]) -> Result<()> {
        if y.is_empty() {
            anyhow::bail!("Cannot fit a baseline on zero rows");
        }
        self.value = match self.strategy {
            ConstantStrategy::MostFrequent => Some(majority(y.iter().map(|v| v.round() as i64))),
            ConstantStrategy::Mean => {
                Some((y.iter().map(|v| *v as f64).sum::<f64>() / y.len() as f64) as f32)
            }
            ConstantStrategy::Fixed => self.value,
        };
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        let value = self.value.ok_or_else(|| anyhow::anyhow!("Baseline used before fit"))?;
        Ok(vec![value; x.nrows()])
    }

    fn save(&self, _dir: &Path) -> Result<ModelState> {
        let value = self.value.ok_or_else(|| anyhow::anyhow!("Baseline saved before fit"))?;
        Ok(ModelState::Constant { value })
    }
}

/// Most common value; ties go to the smallest.
fn majority(values: impl Iterator<Item = i64>) -> f32 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map_or(0.0, |(v, _)| v as f32)
}

// ─── k-nearest neighbours ─────────────────────────────────────────────────────

pub struct KNeighbors {
    k:              usize,
    classification: bool,
    x:              Option<Array2<f32>>,
    y:              Vec<f32>,
}

impl KNeighbors {
    pub fn new(k: usize, classification: bool) -> Self {
        Self { k, classification, x: None, y: Vec::new() }
    }
}

impl Estimator for KNeighbors {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()> {
        if x.nrows() == 0 {
            anyhow::bail!("Cannot fit K Neighbors on zero rows");
        }
        self.x = Some(x.clone());
        self.y = y.to_vec();
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        let train = self.x.as_ref().ok_or_else(|| anyhow::anyhow!("K Neighbors used before fit"))?;
        let k = self.k.min(train.nrows()).max(1);

        let predictions = x
            .outer_iter()
            .map(|row| {
                let mut dists: Vec<(f64, usize)> = train
                    .outer_iter()
                    .enumerate()
                    .map(|(i, t)| (squared_distance(row, t), i))
                    .collect();
                dists.sort_by(|a, b| a.0.total_cmp(&b.0));
                let nearest = &dists[..k];

                if self.classification {
                    majority(nearest.iter().map(|(_, i)| self.y[*i].round() as i64))
                } else {
                    nearest.iter().map(|(_, i)| self.y[*i]).sum::<f32>() / k as f32
                }
            })
            .collect();
        Ok(predictions)
    }

    fn save(&self, _dir: &Path) -> Result<ModelState> {
        let train = self.x.as_ref().ok_or_else(|| anyhow::anyhow!("K Neighbors saved before fit"))?;
        Ok(ModelState::KNeighbors {
            k:              self.k,
            classification: self.classification,
            x:              train.outer_iter().map(|r| r.to_vec()).collect(),
            y:              self.y.clone(),
        })
    }
}

// ─── Gaussian naive Bayes ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct GaussianNb {
    priors: Vec<f64>,
    means:  Vec<Vec<f64>>,
    vars:   Vec<Vec<f64>>,
}

impl Estimator for GaussianNb {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()> {
        if x.nrows() == 0 {
            anyhow::bail!("Cannot fit Gaussian Naive Bayes on zero rows");
        }
        let n_classes = y.iter().map(|v| v.round() as usize).max().map_or(0, |m| m + 1);
        let width = x.ncols();

        // Variance floor relative to the widest feature, so constant
        // features inside one class do not produce infinite likelihoods.
        let global_max_var = (0..width)
            .map(|c| {
                let col: Vec<f64> = x.column(c).iter().map(|v| *v as f64).collect();
                crate::data::preprocessor::mean_std(&col).1.powi(2)
            })
            .fold(0.0, f64::max);
        let epsilon = 1e-9 * global_max_var.max(1.0);

        self.priors = vec![0.0; n_classes];
        self.means  = vec![vec![0.0; width]; n_classes];
        self.vars   = vec![vec![0.0; width]; n_classes];

        for class in 0..n_classes {
            let rows: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, v)| v.round() as usize == class)
                .map(|(i, _)| i)
                .collect();
            self.priors[class] = rows.len() as f64 / y.len() as f64;
            if rows.is_empty() {
                continue;
            }
            for c in 0..width {
                let col: Vec<f64> = rows.iter().map(|&r| x[[r, c]] as f64).collect();
                let (m, s) = crate::data::preprocessor::mean_std(&col);
                self.means[class][c] = m;
                self.vars[class][c] = s * s + epsilon;
            }
        }
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        if self.priors.is_empty() {
            anyhow::bail!("Gaussian Naive Bayes used before fit");
        }
        let predictions = x
            .outer_iter()
            .map(|row| {
                let mut best = (f64::NEG_INFINITY, 0usize);
                for class in 0..self.priors.len() {
                    if self.priors[class] == 0.0 {
                        continue;
                    }
                    let log_likelihood: f64 = row
                        .iter()
                        .enumerate()
                        .map(|(c, v)| {
                            let var = self.vars[class][c];
                            let diff = *v as f64 - self.means[class][c];
                            -0.5 * ((2.0 * std::f64::consts::PI * var).ln() + diff * diff / var)
                        })
                        .sum();
                    let score = self.priors[class].ln() + log_likelihood;
                    if score > best.0 {
                        best = (score, class);
                    }
                }
                best.1 as f32
            })
            .collect();
        Ok(predictions)
    }

    fn save(&self, _dir: &Path) -> Result<ModelState> {
        Ok(ModelState::GaussianNb {
            priors: self.priors.clone(),
            means:  self.means.clone(),
            vars:   self.vars.clone(),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> (Array2<f32>, Vec<f32>) {
        let x = array![
            [0.0f32, 0.1], [0.2, 0.0], [0.1, 0.2], [0.0, 0.0],
            [5.0, 5.1], [5.2, 5.0], [5.1, 4.9], [4.9, 5.0],
        ];
        (x, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0])
    }

    #[test]
    fn test_most_frequent_baseline() {
        let mut m = ConstantEstimator::most_frequent();
        let x = Array2::<f32>::zeros((4, 1));
        m.fit(&x, &[1.0, 2.0, 2.0, 1.0]).unwrap();
        // tie between 1 and 2 → smallest wins
        assert_eq!(m.predict(&x).unwrap(), vec![1.0; 4]);
    }

    #[test]
    fn test_mean_baseline() {
        let mut m = ConstantEstimator::mean();
        let x = Array2::<f32>::zeros((2, 1));
        m.fit(&x, &[1.0, 3.0]).unwrap();
        assert_eq!(m.predict(&x).unwrap(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_knn_classifies_blobs() {
        let (x, y) = two_blobs();
        let mut m = KNeighbors::new(3, true);
        m.fit(&x, &y).unwrap();
        let p = m.predict(&array![[0.1f32, 0.1], [5.0, 5.0]]).unwrap();
        assert_eq!(p, vec![0.0, 1.0]);
    }

    #[test]
    fn test_knn_regression_averages() {
        let mut m = KNeighbors::new(2, false);
        m.fit(&array![[0.0f32], [1.0], [10.0]], &[1.0, 3.0, 100.0]).unwrap();
        assert_eq!(m.predict(&array![[0.4f32]]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_naive_bayes_classifies_blobs() {
        let (x, y) = two_blobs();
        let mut m = GaussianNb::default();
        m.fit(&x, &y).unwrap();
        assert_eq!(m.predict(&array![[0.0f32, 0.3], [4.8, 5.2]]).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let x = Array2::<f32>::zeros((1, 1));
        assert!(ConstantEstimator::mean().predict(&x).is_err());
        assert!(KNeighbors::new(3, true).predict(&x).is_err());
        assert!(GaussianNb::default().predict(&x).is_err());
    }

    #[test]
    fn test_saved_state_restores_predictions() {
        let (x, y) = two_blobs();
        let dir = tempfile::tempdir().unwrap();
        let mut m = KNeighbors::new(3, true);
        m.fit(&x, &y).unwrap();
        let state = m.save(dir.path()).unwrap();

        let restored = restore(&state, dir.path()).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), m.predict(&x).unwrap());
    }

    #[test]
    fn test_candidates_per_task() {
        assert_eq!(Candidate::for_task(TaskType::Classification).len(), 5);
        assert_eq!(Candidate::for_task(TaskType::Regression).len(), 4);
        assert!(Candidate::for_task(TaskType::Clustering).is_empty());
    }
}
