// ============================================================
// Layer 4 - Tabular Batcher
// ============================================================
// Implements Burn's Batcher trait to stack TabularSamples into
// tensors for one forward pass.
//
//   Input:  Vec of N samples, each with F features
//   Output: features [N, F] and targets [N]
//
// All samples from one feature pipeline share the same width,
// so rows are flattened and reshaped without padding.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::TabularSample;

#[derive(Debug, Clone)]
pub struct TabularBatch<B: Backend> {
    /// Shape: [batch_size, n_features]
    pub features: Tensor<B, 2>,
    /// Shape: [batch_size]; class indices stored as floats for
    /// classification, raw values for regression
    pub targets:  Tensor<B, 1>,
}

#[derive(Clone, Debug)]
pub struct TabularBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TabularBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TabularSample, TabularBatch<B>> for TabularBatcher<B> {
    fn batch(&self, items: Vec<TabularSample>) -> TabularBatch<B> {
        let batch_size = items.len();
        let width      = items.first().map(|s| s.features.len()).unwrap_or(0);

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();
        let targets: Vec<f32> = items.iter().map(|s| s.target).collect();

        let features = Tensor::<B, 2>::from_data(
            TensorData::new(flat, [batch_size, width]),
            &self.device,
        );
        let targets = Tensor::<B, 1>::from_data(
            TensorData::new(targets, [batch_size]),
            &self.device,
        );

        TabularBatch { features, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes() {
        let batcher = TabularBatcher::<NdArray>::new(Default::default());
        let batch = batcher.batch(vec![
            TabularSample { features: vec![1.0, 2.0, 3.0], target: 0.0 },
            TabularSample { features: vec![4.0, 5.0, 6.0], target: 1.0 },
        ]);
        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2]);
    }
}
