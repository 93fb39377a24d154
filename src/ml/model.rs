use burn::{
    nn::{
        loss::{CrossEntropyLossConfig, MseLoss, Reduction},
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct TabularNetConfig {
    pub inputs:  usize,
    pub outputs: usize,
    /// Width of the single hidden layer; 0 builds a plain linear model
    #[config(default = 0)]
    pub hidden:  usize,
}

impl TabularNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TabularNet<B> {
        if self.hidden == 0 {
            TabularNet {
                hidden: None,
                output: LinearConfig::new(self.inputs, self.outputs).init(device),
            }
        } else {
            TabularNet {
                hidden: Some(LinearConfig::new(self.inputs, self.hidden).init(device)),
                output: LinearConfig::new(self.hidden, self.outputs).init(device),
            }
        }
    }
}

/// A linear model or a one-hidden-layer MLP over dense features.
#[derive(Module, Debug)]
pub struct TabularNet<B: Backend> {
    pub hidden: Option<Linear<B>>,
    pub output: Linear<B>,
}

/// Which loss the network trains against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Head {
    /// Cross-entropy over `n` class logits
    Classification(usize),
    /// Mean squared error on a single output
    Regression,
}

impl Head {
    pub fn outputs(&self) -> usize {
        match self {
            Head::Classification(n) => *n,
            Head::Regression        => 1,
        }
    }
}

impl<B: Backend> TabularNet<B> {
    /// features: [batch, inputs] → [batch, outputs]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = match &self.hidden {
            Some(layer) => relu(layer.forward(features)),
            None        => features,
        };
        self.output.forward(x)
    }

    pub fn forward_loss(&self, features: Tensor<B, 2>, targets: Tensor<B, 1>, head: Head) -> Tensor<B, 1>
    where
        B: AutodiffBackend,
    {
        let output = self.forward(features);
        match head {
            Head::Classification(_) => CrossEntropyLossConfig::new()
                .init(&output.device())
                .forward(output, targets.int()),
            Head::Regression => MseLoss::new().forward(
                output.flatten::<1>(0, 1),
                targets,
                Reduction::Mean,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_output_shape_linear_and_mlp() {
        let device = Default::default();
        let x = Tensor::<NdArray, 2>::zeros([4, 3], &device);

        let linear: TabularNet<NdArray> = TabularNetConfig::new(3, 2).init(&device);
        assert!(linear.hidden.is_none());
        assert_eq!(linear.forward(x.clone()).dims(), [4, 2]);

        let mlp: TabularNet<NdArray> = TabularNetConfig::new(3, 1).with_hidden(8).init(&device);
        assert_eq!(mlp.forward(x).dims(), [4, 1]);
    }
}
