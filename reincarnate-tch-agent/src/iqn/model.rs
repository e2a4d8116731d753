//! IQN model.
use super::{IqnModelConfig, IqnSample};
use crate::{
    impala::ImpalaEncoder,
    layers::variance_scaling_uniform,
    model::{ModelBase, SubModel},
    opt::Optimizer,
    preprocess::maybe_preprocess,
    util::{seeded_rng, uniform, vec_to_tensor, FeatureDim},
};
use anyhow::{Context, Result};
use log::{debug, info, trace};
use reincarnate_core::error::ReincarnateError;
use serde::{de::DeserializeOwned, Serialize};
use std::{f64::consts::PI, path::Path};
use tch::{
    nn,
    nn::{Init, Module, VarStore},
    Device,
    Kind::Float,
    Tensor,
};

/// Output of [`IqnModel`].
#[derive(Debug)]
pub struct IqnOutput {
    /// Action-value quantiles, `[batch, num_quantiles, num_actions]`.
    pub quantile_values: Tensor,

    /// Quantiles at which the values are evaluated, `[batch, num_quantiles]`.
    pub quantiles: Tensor,
}

fn dense(p: nn::Path, in_dim: i64, out_dim: i64) -> nn::Linear {
    let config = nn::LinearConfig {
        ws_init: variance_scaling_uniform(1.0 / 3f64.sqrt(), in_dim),
        bs_init: Some(Init::Const(0.0)),
        bias: true,
    };
    nn::linear(p, in_dim, out_dim, config)
}

/// Implicit quantile network on top of an encoder `F`.
pub struct IqnModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + FeatureDim + Clone,
{
    device: Device,
    var_store: nn::VarStore,
    config: IqnModelConfig<F::Config>,

    // Dimension of the input (feature) vector.
    // The `size()[-1]` of F::Output (Tensor) is feature_dim.
    feature_dim: i64,

    // Encoder
    psi: F,

    // Cos embedding
    phi: nn::Sequential,

    // Output layers
    f: nn::Sequential,

    // Optimizer
    opt: Optimizer,
}

/// IQN with the Impala encoder.
pub type ImpalaIqnModel = IqnModel<ImpalaEncoder>;

impl<F> IqnModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + FeatureDim + Clone,
{
    /// Constructs [`IqnModel`].
    pub fn build(config: IqnModelConfig<F::Config>, device: Device) -> Result<Self> {
        let f_config = config.f_config.clone().context("f_config is not set.")?;
        ReincarnateError::check_positive("num_actions", config.num_actions)?;
        ReincarnateError::check_positive("embed_dim", config.embed_dim)?;
        ReincarnateError::check_positive("hidden_dim", config.hidden_dim)?;
        ReincarnateError::check_positive("feature_dim", f_config.feature_dim())?;

        let model = Self::_build(config, f_config, device, None)?;
        info!(
            "Build IQN model with {} actions, {} parameters",
            model.config.num_actions,
            model.num_params()
        );
        Ok(model)
    }

    fn _build(
        config: IqnModelConfig<F::Config>,
        f_config: F::Config,
        device: Device,
        var_store_src: Option<&nn::VarStore>,
    ) -> Result<Self> {
        let mut var_store = nn::VarStore::new(device);
        let feature_dim = f_config.feature_dim();
        debug!("Feature dimension of the encoder: {}", feature_dim);

        // Encoder
        let psi = F::build(&var_store, f_config);

        // Cosine embedding
        let phi = Self::cos_embed_nn(&var_store, feature_dim, config.embed_dim);

        // Output layers
        let f = Self::output_nn(&var_store, feature_dim, config.hidden_dim, config.num_actions);

        // Optimizer
        let opt = config.opt_config.build(&var_store)?;

        if let Some(var_store_src) = var_store_src {
            var_store.copy(var_store_src)?;
        }

        Ok(Self {
            device,
            var_store,
            config,
            feature_dim,
            psi,
            phi,
            f,
            opt,
        })
    }

    // Cosine embedding.
    fn cos_embed_nn(var_store: &VarStore, feature_dim: i64, embed_dim: i64) -> nn::Sequential {
        let p = &var_store.root();
        let device = p.device();
        nn::seq()
            .add_fn(move |tau| {
                let batch_size = tau.size().as_slice()[0];
                let n_percent_points = tau.size().as_slice()[1];
                let tau = tau.unsqueeze(-1);
                let i = Tensor::range(1, embed_dim, (Float, device))
                    .unsqueeze(0)
                    .unsqueeze(0);
                debug_assert_eq!(tau.size().as_slice(), &[batch_size, n_percent_points, 1]);
                debug_assert_eq!(i.size().as_slice(), &[1, 1, embed_dim]);

                let cos = Tensor::cos(&(tau * (PI * i)));
                debug_assert_eq!(
                    cos.size().as_slice(),
                    &[batch_size, n_percent_points, embed_dim]
                );

                cos.reshape(&[-1, embed_dim])
            })
            .add(dense(p / "iqn_cos_to_feature", embed_dim, feature_dim))
            .add_fn(|x| x.relu())
    }

    fn output_nn(var_store: &VarStore, feature_dim: i64, hidden_dim: i64, out_dim: i64) -> nn::Sequential {
        let p = &var_store.root();
        nn::seq()
            .add(dense(p / "l1", feature_dim, hidden_dim))
            .add_fn(|x| x.relu())
            .add(dense(p / "l2", hidden_dim, out_dim))
    }

    /// Returns the tensor of action-value quantiles at the given quantiles.
    ///
    /// * The shape of `psi(x)` (feature vector) is `[batch_size, feature_dim]`.
    /// * The shape of `tau` is `[batch_size, n_percent_points]`.
    /// * The shape of the output is `[batch_size, n_percent_points, num_actions]`.
    pub fn forward_with_tau(&self, x: &Tensor, tau: &Tensor) -> Tensor {
        // Used to check tensor size
        let feature_dim = self.feature_dim;
        let n_percent_points = tau.size().as_slice()[1];

        // Feature extraction
        let x = maybe_preprocess(x, self.config.inputs_preprocessed);
        let psi = self.psi.forward(&x);
        let batch_size = psi.size().as_slice()[0];
        debug_assert_eq!(psi.size().as_slice(), &[batch_size, feature_dim]);

        // Cosine embedding of quantiles
        debug_assert_eq!(tau.size().as_slice(), &[batch_size, n_percent_points]);
        let phi = self.phi.forward(&tau.to(self.device));
        debug_assert_eq!(
            phi.size().as_slice(),
            &[batch_size * n_percent_points, feature_dim]
        );
        let phi = phi.reshape(&[batch_size, n_percent_points, feature_dim]);

        // Merge features and embedded quantiles by elem-wise multiplication
        let m = psi.unsqueeze(1) * phi;

        // Action-value
        let a = self.f.forward(&m);
        debug_assert_eq!(
            a.size().as_slice(),
            &[batch_size, n_percent_points, self.config.num_actions]
        );

        a
    }

    /// Evaluates action-value quantiles at `num_quantiles` quantiles drawn with `seed`.
    ///
    /// The quantiles are sampled from the uniform distribution over `[0, 1)`
    /// once and shared by all observations of the batch.
    ///
    /// Panics if `num_quantiles` is not positive.
    pub fn forward(&self, x: &Tensor, num_quantiles: i64, seed: u64) -> IqnOutput {
        assert!(
            num_quantiles > 0,
            "num_quantiles must be positive, got {}",
            num_quantiles
        );
        let batch_size = x.size()[0];
        let mut rng = seeded_rng(Some(seed));
        let quantiles = vec_to_tensor(uniform(&mut rng, num_quantiles as usize), &[1, num_quantiles])
            .repeat(&[batch_size, 1])
            .to(self.device);
        let quantile_values = self.forward_with_tau(x, &quantiles);

        IqnOutput {
            quantile_values,
            quantiles,
        }
    }

    /// Averages action-value quantiles over quantiles taken by `mode`.
    ///
    /// Returns a tensor of shape `[batch_size, num_actions]`.
    pub fn average(&self, x: &Tensor, mode: &IqnSample, key: Option<u64>) -> Tensor {
        let batch_size = x.size()[0];
        let tau = mode.sample(batch_size, &mut seeded_rng(key)).to(self.device);
        let averaged_action_value = self.forward_with_tau(x, &tau).mean_dim(&[1i64][..], false, Float);
        debug_assert_eq!(
            averaged_action_value.size().as_slice(),
            &[batch_size, self.config.num_actions]
        );
        averaged_action_value
    }
}

impl<F> Clone for IqnModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + FeatureDim + Clone,
{
    fn clone(&self) -> Self {
        let config = self.config.clone();
        let f_config = config
            .f_config
            .clone()
            .expect("IqnModel is built with f_config");
        Self::_build(config, f_config, self.device, Some(&self.var_store))
            .expect("Failed to clone IqnModel")
    }
}

impl<F> ModelBase for IqnModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + FeatureDim + Clone,
{
    fn backward_step(&mut self, loss: &Tensor) {
        self.opt.backward_step(loss);
    }

    fn get_var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }

    fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.var_store.save(&path)?;
        info!("Save IQN model to {:?}", path.as_ref());
        let vs = self.var_store.variables();
        for (name, _) in vs.iter() {
            trace!("Save variable {}", name);
        }
        Ok(())
    }

    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.var_store.load(&path)?;
        info!("Load IQN model from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        cnn::{NatureCnn, NatureCnnConfig},
        impala::ImpalaEncoderConfig,
    };
    use tch::{kind::FLOAT_CPU, Kind};

    const NUM_ACTIONS: i64 = 6;

    fn config() -> IqnModelConfig<ImpalaEncoderConfig> {
        let f_config = ImpalaEncoderConfig::default()
            .frame_size(32, 32)
            .stack_sizes(vec![4, 8])
            .num_blocks(1);
        IqnModelConfig::default()
            .f_config(f_config)
            .num_actions(NUM_ACTIONS)
            .embed_dim(16)
    }

    fn obs() -> Tensor {
        Tensor::randint(256, &[2, 4, 32, 32], (Kind::Uint8, Device::Cpu))
    }

    #[test]
    /// Check shape of tensors in IqnModel.
    fn test_iqn_model() -> Result<()> {
        let model = ImpalaIqnModel::build(config(), Device::Cpu)?;
        let out = model.forward(&obs(), 8, 0);
        assert_eq!(out.quantile_values.size(), vec![2, 8, NUM_ACTIONS]);
        assert_eq!(out.quantiles.size(), vec![2, 8]);
        assert!(out.quantiles.min().double_value(&[]) >= 0.0);
        assert!(out.quantiles.max().double_value(&[]) < 1.0);
        Ok(())
    }

    #[test]
    fn test_seed() -> Result<()> {
        let model = ImpalaIqnModel::build(config(), Device::Cpu)?;
        let x = obs();
        let o1 = model.forward(&x, 4, 7);
        let o2 = model.forward(&x, 4, 7);
        let o3 = model.forward(&x, 4, 8);
        assert!(o1.quantiles.equal(&o2.quantiles));
        assert!(o1.quantile_values.allclose(&o2.quantile_values, 1e-6, 1e-6, false));
        assert!(!o1.quantiles.equal(&o3.quantiles));

        // Quantiles are shared over the batch
        assert!(o1.quantiles.get(0).equal(&o1.quantiles.get(1)));
        Ok(())
    }

    #[test]
    #[should_panic(expected = "num_quantiles must be positive")]
    fn test_zero_quantiles() {
        let model = ImpalaIqnModel::build(config(), Device::Cpu).unwrap();
        let _ = model.forward(&obs(), 0, 0);
    }

    #[test]
    fn test_average() -> Result<()> {
        let model = ImpalaIqnModel::build(config(), Device::Cpu)?;
        let x = obs();
        let q = model.average(&x, &IqnSample::Const10, None);
        assert_eq!(q.size(), vec![2, NUM_ACTIONS]);

        let tau = IqnSample::Const10.sample(2, &mut seeded_rng(None));
        let expected = model.forward_with_tau(&x, &tau).mean_dim(&[1i64][..], false, Float);
        assert!(q.allclose(&expected, 1e-5, 1e-5, false));
        Ok(())
    }

    #[test]
    fn test_nature_encoder() -> Result<()> {
        let config = IqnModelConfig::default()
            .f_config(NatureCnnConfig::default())
            .num_actions(3);
        let model = IqnModel::<NatureCnn>::build(config, Device::Cpu)?;
        let x = Tensor::rand(&[1, 4, 84, 84], FLOAT_CPU);
        let out = model.forward(&x, 32, 0);
        assert_eq!(out.quantile_values.size(), vec![1, 32, 3]);
        Ok(())
    }

    #[test]
    fn test_clone() -> Result<()> {
        let model = ImpalaIqnModel::build(config(), Device::Cpu)?;
        let target = model.clone();
        let x = obs();
        let q1 = model.forward(&x, 8, 3).quantile_values;
        let q2 = target.forward(&x, 8, 3).quantile_values;
        assert!(q1.allclose(&q2, 1e-6, 1e-6, false));
        Ok(())
    }

    #[test]
    fn test_missing_encoder_config() {
        let config = IqnModelConfig::<ImpalaEncoderConfig>::default().num_actions(2);
        assert!(ImpalaIqnModel::build(config, Device::Cpu).is_err());
    }
}
