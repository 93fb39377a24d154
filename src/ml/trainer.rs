// ============================================================
// Layer 5 - Neural Training Loop
// ============================================================
// Fits a TabularNet with Burn's DataLoader and Adam.
//
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on InferBackend (NdArray)
//     for prediction, without autodiff bookkeeping
//   - Regression targets are standardised for training and the
//     predictions mapped back to the original scale
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::path::Path;

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::TensorData,
};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::{batcher::TabularBatcher, dataset::TabularDataset};
use crate::ml::{
    estimators::{Estimator, ModelState},
    model::{Head, TabularNet, TabularNetConfig},
};

type TrainBackend = Autodiff<NdArray>;
type InferBackend = NdArray;

/// Record file name (CompactRecorder appends `.mpk.gz`).
const RECORD_NAME: &str = "model";

/// Optimisation settings shared by every neural candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetSettings {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub seed:          u64,
}

impl Default for NetSettings {
    fn default() -> Self {
        Self { epochs: 60, batch_size: 32, learning_rate: 1e-2, seed: 123 }
    }
}

pub struct NeuralEstimator {
    head:     Head,
    hidden:   usize,
    settings: NetSettings,
    model:    Option<TabularNet<InferBackend>>,
    /// Kept so the trained weights can be recorded
    trained:  Option<TabularNet<TrainBackend>>,
    inputs:   usize,
    y_mean:   f32,
    y_std:    f32,
}

impl NeuralEstimator {
    pub fn new(head: Head, hidden: usize, settings: NetSettings) -> Self {
        Self {
            head,
            hidden,
            settings,
            model: None,
            trained: None,
            inputs: 0,
            y_mean: 0.0,
            y_std: 1.0,
        }
    }

    /// Rebuild a fitted estimator from a saved `ModelState::Neural`.
    pub fn load(state: &ModelState, dir: &Path) -> Result<Self> {
        let ModelState::Neural { inputs, hidden, n_classes, y_mean, y_std, record } = state else {
            anyhow::bail!("Not a neural model state");
        };
        let head = match n_classes {
            Some(n) => Head::Classification(*n),
            None    => Head::Regression,
        };
        let device = NdArrayDevice::default();
        let model: TabularNet<InferBackend> = TabularNetConfig::new(*inputs, head.outputs())
            .with_hidden(*hidden)
            .init(&device);

        let path = dir.join(record);
        let saved = CompactRecorder::new()
            .load(path.clone(), &device)
            .map_err(|e| anyhow::anyhow!("Cannot load model weights '{}': {e:?}", path.display()))?;

        Ok(Self {
            head,
            hidden: *hidden,
            settings: NetSettings::default(),
            model: Some(model.load_record(saved)),
            trained: None,
            inputs: *inputs,
            y_mean: *y_mean,
            y_std: *y_std,
        })
    }
}

impl Estimator for NeuralEstimator {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()> {
        if x.nrows() == 0 {
            anyhow::bail!("Cannot train a network on zero rows");
        }
        TrainBackend::seed(self.settings.seed);
        let device = NdArrayDevice::default();

        self.inputs = x.ncols();
        let targets: Vec<f32> = match self.head {
            Head::Classification(_) => y.to_vec(),
            Head::Regression => {
                let values: Vec<f64> = y.iter().map(|v| *v as f64).collect();
                let (mean, std) = crate::data::preprocessor::mean_std(&values);
                self.y_mean = mean as f32;
                self.y_std  = if std > 1e-12 { std as f32 } else { 1.0 };
                y.iter().map(|v| (v - self.y_mean) / self.y_std).collect()
            }
        };

        let mut model: TabularNet<TrainBackend> = TabularNetConfig::new(self.inputs, self.head.outputs())
            .with_hidden(self.hidden)
            .init(&device);
        let mut optim = AdamConfig::new()
            .with_epsilon(1e-8)
            .init::<TrainBackend, TabularNet<TrainBackend>>();

        let loader = DataLoaderBuilder::new(TabularBatcher::<TrainBackend>::new(device))
            .batch_size(self.settings.batch_size.max(1))
            .shuffle(self.settings.seed)
            .build(TabularDataset::from_matrix(x.view(), &targets));

        for epoch in 1..=self.settings.epochs {
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;

            for batch in loader.iter() {
                let loss = model.forward_loss(batch.features, batch.targets, self.head);
                loss_sum += loss.clone().into_scalar().elem::<f64>();
                batches  += 1;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(self.settings.learning_rate, model, grads);
            }

            if epoch == 1 || epoch == self.settings.epochs {
                tracing::debug!(
                    "epoch {}/{} loss={:.4}",
                    epoch,
                    self.settings.epochs,
                    loss_sum / batches.max(1) as f64
                );
            }
        }

        self.model = Some(model.valid());
        self.trained = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        let model = self.model.as_ref().ok_or_else(|| anyhow::anyhow!("Network used before fit"))?;
        let device = NdArrayDevice::default();

        let (rows, width) = x.dim();
        let input = Tensor::<InferBackend, 2>::from_data(
            TensorData::new(x.iter().copied().collect::<Vec<f32>>(), [rows, width]),
            &device,
        );
        let output = model
            .forward(input)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read network output: {e:?}"))?;

        let predictions = match self.head {
            Head::Classification(n) => output
                .chunks(n.max(1))
                .map(|logits| {
                    logits
                        .iter()
                        .enumerate()
                        .max_by(|a, b| a.1.total_cmp(b.1))
                        .map_or(0.0, |(i, _)| i as f32)
                })
                .collect(),
            Head::Regression => output
                .into_iter()
                .map(|v| v * self.y_std + self.y_mean)
                .collect(),
        };
        Ok(predictions)
    }

    fn save(&self, dir: &Path) -> Result<ModelState> {
        let path = dir.join(RECORD_NAME);
        match (&self.trained, &self.model) {
            (Some(trained), _) => CompactRecorder::new()
                .record(trained.clone().into_record(), path.clone())
                .map_err(|e| anyhow::anyhow!("Cannot save model weights '{}': {e:?}", path.display()))?,
            (None, Some(model)) => CompactRecorder::new()
                .record(model.clone().into_record(), path.clone())
                .map_err(|e| anyhow::anyhow!("Cannot save model weights '{}': {e:?}", path.display()))?,
            (None, None) => anyhow::bail!("Network saved before fit"),
        }
        tracing::debug!("Saved network weights to '{}'", path.display());

        Ok(ModelState::Neural {
            inputs:    self.inputs,
            hidden:    self.hidden,
            n_classes: match self.head {
                Head::Classification(n) => Some(n),
                Head::Regression        => None,
            },
            y_mean:    self.y_mean,
            y_std:     self.y_std,
            record:    RECORD_NAME.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn quick() -> NetSettings {
        NetSettings { epochs: 200, batch_size: 8, learning_rate: 5e-2, seed: 7 }
    }

    #[test]
    fn test_linear_regression_fits_a_line() {
        let x = array![[-2.0f32], [-1.0], [0.0], [1.0], [2.0], [3.0]];
        let y: Vec<f32> = x.iter().map(|v| 3.0 * v + 1.0).collect();

        let mut net = NeuralEstimator::new(Head::Regression, 0, quick());
        net.fit(&x, &y).unwrap();
        let p = net.predict(&array![[4.0f32]]).unwrap();
        assert!((p[0] - 13.0).abs() < 1.0, "predicted {}", p[0]);
    }

    #[test]
    fn test_logistic_regression_separates_classes() {
        let x = array![[-2.0f32], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut net = NeuralEstimator::new(Head::Classification(2), 0, quick());
        net.fit(&x, &y).unwrap();
        assert_eq!(net.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_saved_weights_reload() {
        let x = array![[-1.0f32], [0.0], [1.0], [2.0]];
        let y = vec![-1.0, 1.0, 3.0, 5.0];
        let dir = tempfile::tempdir().unwrap();

        let mut net = NeuralEstimator::new(Head::Regression, 0, quick());
        net.fit(&x, &y).unwrap();
        let state = net.save(dir.path()).unwrap();

        let reloaded = NeuralEstimator::load(&state, dir.path()).unwrap();
        let (a, b) = (net.predict(&x).unwrap(), reloaded.predict(&x).unwrap());
        for (p, q) in a.iter().zip(&b) {
            // CompactRecorder stores half precision
            assert!((p - q).abs() < 0.05);
        }
    }
}
