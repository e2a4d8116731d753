use super::{NatureCnn, NatureResidualQNetConfig};
use crate::{
    layers::xavier_uniform,
    model::SubModel,
    preprocess::maybe_preprocess,
    util::FeatureDim,
};
use tch::{nn, nn::Init, nn::Module, Tensor};

fn dense(p: nn::Path, in_dim: i64, out_dim: i64) -> nn::Linear {
    let config = nn::LinearConfig {
        ws_init: xavier_uniform(in_dim, out_dim),
        bs_init: Some(Init::Const(0.0)),
        bias: true,
    };
    nn::linear(p, in_dim, out_dim, config)
}

/// DQN network computing Q-values scaled by learned residual weights.
///
/// `q = dense(relu(dense(encoder(x)))) * alpha`, where `alpha` has one entry
/// per action and is initialized to zeros. A freshly built network therefore
/// outputs zero Q-values and does not corrupt the values it is added to.
pub struct NatureResidualQNet {
    config: NatureResidualQNetConfig,
    encoder: NatureCnn,
    l1: nn::Linear,
    l2: nn::Linear,
    alpha: Tensor,
}

impl SubModel for NatureResidualQNet {
    type Config = NatureResidualQNetConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Tensor {
        let x = maybe_preprocess(x, self.config.inputs_preprocessed);
        let x = self.encoder.forward(&x);
        let x = self.l1.forward(&x).relu();
        self.l2.forward(&x) * &self.alpha
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let p = &var_store.root();
        let feature_dim = config.encoder.feature_dim();
        let encoder = NatureCnn::build(var_store, config.encoder.clone());
        let l1 = dense(p / "l1", feature_dim, config.hidden_dim);
        let l2 = dense(p / "l2", config.hidden_dim, config.out_dim);
        let alpha = p.zeros("alpha", &[config.out_dim]);

        Self {
            config,
            encoder,
            l1,
            l2,
            alpha,
        }
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::build(var_store, self.config.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn test_zero_residual_at_init() {
        let vs = nn::VarStore::new(Device::Cpu);
        let config = NatureResidualQNetConfig {
            out_dim: 6,
            ..Default::default()
        };
        let net = NatureResidualQNet::build(&vs, config);
        let x = Tensor::randint(256, &[3, 4, 84, 84], (Kind::Uint8, Device::Cpu));
        let q = net.forward(&x);
        assert_eq!(q.size(), vec![3, 6]);
        assert_eq!(q.abs().sum(Kind::Float).double_value(&[]), 0.0);
    }

    #[test]
    fn test_alpha_scales_q_values() {
        let vs = nn::VarStore::new(Device::Cpu);
        let config = NatureResidualQNetConfig {
            out_dim: 2,
            ..Default::default()
        };
        let net = NatureResidualQNet::build(&vs, config);
        tch::no_grad(|| {
            let mut alpha = vs.variables()["alpha"].shallow_clone();
            let _ = alpha.fill_(1.0);
        });
        let x = Tensor::ones(&[1, 4, 84, 84], (Kind::Float, Device::Cpu));
        let q = net.forward(&x);
        let unscaled = net.l2.forward(&net.l1.forward(&net.encoder.forward(&(x / 255.0))).relu());
        assert!(q.allclose(&unscaled, 1e-5, 1e-5, false));
    }
}
