//! Optimizers.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tch::{
    nn::{Adam, AdamW, Optimizer as Optimizer_, OptimizerConfig as OptimizerConfig_, VarStore},
    Tensor,
};

/// Configures an optimizer for training the parameters of a model.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,

        /// Term added to the denominator for numerical stability.
        #[serde(default = "default_eps")]
        eps: f64,
    },

    /// Adam optimizer with decoupled weight decay.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decay rate of the first moment.
        beta1: f64,
        /// Decay rate of the second moment.
        beta2: f64,
        /// Weight decay.
        wd: f64,
        /// Term added to the denominator for numerical stability.
        eps: f64,
        /// Use the AMSGrad variant.
        amsgrad: bool,
    },
}

fn default_eps() -> f64 {
    1e-8
}

impl Default for OptimizerConfig {
    /// Adam with the hyperparameters of Rainbow agents on Atari.
    fn default() -> Self {
        Self::Adam {
            lr: 6.25e-5,
            eps: 1.5e-4,
        }
    }
}

impl OptimizerConfig {
    /// Returns the learning rate.
    pub fn learning_rate(&self) -> f64 {
        match self {
            Self::Adam { lr, .. } => *lr,
            Self::AdamW { lr, .. } => *lr,
        }
    }

    /// Sets the learning rate.
    pub fn set_learning_rate(mut self, v: f64) -> Self {
        match &mut self {
            Self::Adam { lr, .. } => *lr = v,
            Self::AdamW { lr, .. } => *lr = v,
        };
        self
    }

    /// Constructs an optimizer.
    pub fn build(&self, vs: &VarStore) -> Result<Optimizer> {
        let opt = match &self {
            OptimizerConfig::Adam { lr, eps } => {
                let mut adam = Adam::default();
                adam.eps = *eps;
                adam.build(vs, *lr)?
            }
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                wd,
                eps,
                amsgrad,
            } => AdamW {
                beta1: *beta1,
                beta2: *beta2,
                wd: *wd,
                eps: *eps,
                amsgrad: *amsgrad,
            }
            .build(vs, *lr)?,
        };
        Ok(Optimizer { opt })
    }
}

/// Thin wrapper of [tch::nn::Optimizer].
///
/// [tch::nn::Optimizer]: https://docs.rs/tch/0.16.0/tch/nn/struct.Optimizer.html
pub struct Optimizer {
    opt: Optimizer_,
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) {
        self.opt.backward_step(loss);
    }

    /// Applies a backward step pass with gradients clipped by their norm.
    pub fn backward_step_clip_norm(&mut self, loss: &Tensor, max_norm: f64) {
        self.opt.backward_step_clip_norm(loss, max_norm);
    }

    /// Changes the learning rate.
    pub fn set_lr(&mut self, lr: f64) {
        self.opt.set_lr(lr);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tch::{nn, nn::Module, Device, Kind};

    fn linear() -> (nn::VarStore, nn::Linear) {
        let vs = nn::VarStore::new(Device::Cpu);
        let l = nn::linear(vs.root() / "l", 3, 2, Default::default());
        (vs, l)
    }

    fn weight(vs: &nn::VarStore) -> Tensor {
        vs.variables()["l.weight"].copy()
    }

    #[test]
    fn test_adam_step() -> Result<()> {
        let (vs, l) = linear();
        let mut opt = OptimizerConfig::default().set_learning_rate(1e-2).build(&vs)?;
        let before = weight(&vs);
        let loss = l.forward(&Tensor::ones(&[4, 3], (Kind::Float, Device::Cpu))).sum(Kind::Float);
        opt.backward_step(&loss);
        assert!(!before.allclose(&weight(&vs), 1e-7, 1e-7, false));
        Ok(())
    }

    #[test]
    fn test_adamw_clip_norm_and_lr() -> Result<()> {
        let (vs, l) = linear();
        let config = OptimizerConfig::AdamW {
            lr: 1e-2,
            beta1: 0.9,
            beta2: 0.999,
            wd: 0.01,
            eps: 1e-8,
            amsgrad: false,
        };
        let mut opt = config.build(&vs)?;
        let xs = Tensor::ones(&[4, 3], (Kind::Float, Device::Cpu));

        let before = weight(&vs);
        opt.backward_step_clip_norm(&l.forward(&xs).sum(Kind::Float), 1.0);
        let after = weight(&vs);
        assert!(!before.allclose(&after, 1e-7, 1e-7, false));

        // No update with zero learning rate
        opt.set_lr(0.0);
        opt.backward_step_clip_norm(&l.forward(&xs).sum(Kind::Float), 1.0);
        assert!(after.allclose(&weight(&vs), 0.0, 0.0, false));
        Ok(())
    }

    #[test]
    fn test_learning_rate() {
        let config = OptimizerConfig::default();
        assert_eq!(config.learning_rate(), 6.25e-5);

        let config = config.set_learning_rate(1e-3);
        assert_eq!(
            config,
            OptimizerConfig::Adam {
                lr: 1e-3,
                eps: 1.5e-4
            }
        );
    }

    #[test]
    fn test_default_eps() {
        let config: OptimizerConfig = serde_yaml::from_str("Adam:\n  lr: 0.001\n").unwrap();
        assert_eq!(
            config,
            OptimizerConfig::Adam {
                lr: 0.001,
                eps: 1e-8
            }
        );
    }
}
