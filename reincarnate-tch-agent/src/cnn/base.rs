use super::NatureCnnConfig;
use crate::{
    layers::{conv2d_same, xavier_uniform, Conv2dSame},
    model::SubModel,
};
use tch::{nn, nn::Module, Device, Tensor};

/// Convolutional encoder of the DQN Nature paper.
///
/// Takes preprocessed frames `[batch, n_stack, height, width]` and returns
/// flattened features `[batch, feature_dim]`.
pub struct NatureCnn {
    config: NatureCnnConfig,
    device: Device,
    seq: nn::Sequential,
}

impl NatureCnn {
    fn conv(p: &nn::Path, name: &str, in_ch: i64, out_ch: i64, k: i64, s: i64) -> Conv2dSame {
        let init = xavier_uniform(in_ch * k * k, out_ch * k * k);
        conv2d_same(p / name, in_ch, out_ch, k, s, init)
    }

    fn create_net(var_store: &nn::VarStore, config: &NatureCnnConfig) -> nn::Sequential {
        let p = &(var_store.root() / "encoder");
        nn::seq()
            .add(Self::conv(p, "c1", config.n_stack, 32, 8, 4))
            .add_fn(|xs| xs.relu())
            .add(Self::conv(p, "c2", 32, 64, 4, 2))
            .add_fn(|xs| xs.relu())
            .add(Self::conv(p, "c3", 64, 64, 3, 1))
            .add_fn(|xs| xs.relu().flatten(1, -1))
    }
}

impl SubModel for NatureCnn {
    type Config = NatureCnnConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Tensor {
        self.seq.forward(&x.to(self.device))
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let device = var_store.device();
        let seq = Self::create_net(var_store, &config);

        Self {
            config,
            device,
            seq,
        }
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::build(var_store, self.config.clone())
    }
}
