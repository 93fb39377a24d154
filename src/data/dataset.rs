use burn::data::dataset::Dataset;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// One preprocessed row: dense features plus its target.
/// For classification the target is the class index as f32.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularSample {
    pub features: Vec<f32>,
    pub target:   f32,
}

pub struct TabularDataset {
    samples: Vec<TabularSample>,
}

impl TabularDataset {
    /// Pair each matrix row with its target.
    pub fn from_matrix(x: ArrayView2<'_, f32>, y: &[f32]) -> Self {
        let samples = x
            .outer_iter()
            .zip(y.iter())
            .map(|(row, &target)| TabularSample { features: row.to_vec(), target })
            .collect();
        Self { samples }
    }
}

impl Dataset<TabularSample> for TabularDataset {
    fn get(&self, index: usize) -> Option<TabularSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Copy the given rows of a matrix into a new matrix.
pub fn take_rows(x: &Array2<f32>, rows: &[usize]) -> Array2<f32> {
    x.select(ndarray::Axis(0), rows)
}

/// Copy the given entries of a target vector.
pub fn take<T: Copy>(y: &[T], rows: &[usize]) -> Vec<T> {
    rows.iter().map(|&i| y[i]).collect()
}
