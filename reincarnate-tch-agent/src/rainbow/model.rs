use super::RainbowModelConfig;
use crate::{
    impala::ImpalaEncoder,
    layers::FeatureLayer,
    model::{ModelBase, SubModel},
    opt::{Optimizer, OptimizerConfig},
    preprocess::maybe_preprocess,
    util::{seeded_rng, FeatureDim},
};
use anyhow::{Context, Result};
use log::{debug, info, trace};
use reincarnate_core::error::ReincarnateError;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tch::{nn, Device, Kind, Tensor};

/// Output of [`RainbowModel`].
#[derive(Debug)]
pub enum RainbowOutput {
    /// Output of a distributional head.
    Distributional {
        /// Expected returns, `[batch, num_actions]`.
        q_values: Tensor,
        /// Unnormalized log-probabilities, `[batch, num_actions, num_atoms]`.
        logits: Tensor,
        /// Probabilities over atoms, `[batch, num_actions, num_atoms]`.
        probabilities: Tensor,
    },

    /// Output of a non-distributional head.
    Scalar {
        /// Q-values, `[batch, num_actions]`.
        q_values: Tensor,
    },
}

impl RainbowOutput {
    /// Returns the Q-values.
    pub fn q_values(&self) -> &Tensor {
        match self {
            Self::Distributional { q_values, .. } => q_values,
            Self::Scalar { q_values } => q_values,
        }
    }
}

/// Combines per-action advantages `[batch, num_actions, num_atoms]` and the
/// state value `[batch, 1, num_atoms]`.
pub(crate) fn dueling_logits(adv: &Tensor, value: &Tensor) -> Tensor {
    value + (adv - adv.mean_dim(&[1i64][..], true, Kind::Float))
}

/// Rainbow network on top of an encoder `F`.
pub struct RainbowModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + FeatureDim + Clone,
{
    device: Device,
    var_store: nn::VarStore,
    config: RainbowModelConfig<F::Config>,

    // Encoder
    psi: F,

    // Hidden layer
    hidden: FeatureLayer,

    // Advantages, or logits without the dueling architecture
    head: FeatureLayer,

    // State value of the dueling architecture
    value: Option<FeatureLayer>,

    // Optimizer
    opt: Optimizer,
}

/// Rainbow network with the Impala encoder.
pub type ImpalaRainbowModel = RainbowModel<ImpalaEncoder>;

impl<F> RainbowModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + FeatureDim + Clone,
{
    /// Constructs [`RainbowModel`].
    pub fn build(config: RainbowModelConfig<F::Config>, device: Device) -> Result<Self> {
        let f_config = config.f_config.clone().context("f_config is not set.")?;
        ReincarnateError::check_positive("num_actions", config.num_actions)?;
        ReincarnateError::check_positive("num_atoms", config.num_atoms)?;
        ReincarnateError::check_positive("hidden_dim", config.hidden_dim)?;
        ReincarnateError::check_positive("feature_dim", f_config.feature_dim())?;

        let model = Self::_build(config, f_config, device, None)?;
        info!(
            "Build Rainbow model with {} actions, {} atoms, {} parameters",
            model.config.num_actions,
            model.config.num_atoms,
            model.num_params()
        );
        Ok(model)
    }

    fn _build(
        config: RainbowModelConfig<F::Config>,
        f_config: F::Config,
        device: Device,
        var_store_src: Option<&nn::VarStore>,
    ) -> Result<Self> {
        let mut var_store = nn::VarStore::new(device);
        let p = &var_store.root();
        let feature_dim = f_config.feature_dim();
        let num_actions = config.num_actions;
        let num_atoms = config.num_atoms;
        let hidden_dim = config.hidden_dim;
        let noisy = config.noisy;
        debug!("Feature dimension of the encoder: {}", feature_dim);

        let psi = F::build(&var_store, f_config);
        let hidden = FeatureLayer::new(p / "hidden", feature_dim, hidden_dim, noisy);
        let head = FeatureLayer::new(p / "head", hidden_dim, num_actions * num_atoms, noisy);
        let value = match config.dueling {
            true => Some(FeatureLayer::new(p / "value", hidden_dim, num_atoms, noisy)),
            false => None,
        };
        let opt = config.opt_config.build(&var_store)?;

        if let Some(var_store_src) = var_store_src {
            var_store.copy(var_store_src)?;
        }

        Ok(Self {
            device,
            var_store,
            config,
            psi,
            hidden,
            head,
            value,
            opt,
        })
    }

    /// Returns the evenly spaced support `[v_min, v_max]` with `num_atoms` elements.
    pub fn support(&self, v_min: f64, v_max: f64) -> Tensor {
        Tensor::linspace(
            v_min,
            v_max,
            self.config.num_atoms,
            (Kind::Float, self.device),
        )
    }

    /// Checks that the support has one element per atom.
    pub fn check_support(&self, support: &Tensor) -> Result<(), ReincarnateError> {
        let size = support.size();
        match size.as_slice() {
            [n] if *n == self.config.num_atoms => Ok(()),
            _ => Err(ReincarnateError::SupportMismatch {
                support_len: size.iter().product(),
                num_atoms: self.config.num_atoms,
            }),
        }
    }

    /// Computes the Q-values and, for the distributional head, the distribution over returns.
    ///
    /// * `x` - Observations, `[batch, n_stack, height, width]`.
    /// * `support` - Atoms of the return distribution, `[num_atoms]`.
    /// * `eval_mode` - Turns off the noise of noisy layers.
    /// * `key` - Seed of the noise. If `None`, a seed is taken from entropy.
    pub fn forward(
        &self,
        x: &Tensor,
        support: &Tensor,
        eval_mode: bool,
        key: Option<u64>,
    ) -> RainbowOutput {
        let num_actions = self.config.num_actions;
        let num_atoms = self.config.num_atoms;
        let mut rng = seeded_rng(key);

        let x = maybe_preprocess(x, self.config.inputs_preprocessed);
        let x = self.psi.forward(&x);
        let batch_size = x.size()[0];
        let x = self.hidden.forward_t(&x, &mut rng, eval_mode).relu();

        let logits = match &self.value {
            Some(value) => {
                let adv = self
                    .head
                    .forward_t(&x, &mut rng, eval_mode)
                    .reshape(&[batch_size, num_actions, num_atoms]);
                let value = value
                    .forward_t(&x, &mut rng, eval_mode)
                    .reshape(&[batch_size, 1, num_atoms]);
                dueling_logits(&adv, &value)
            }
            None => self
                .head
                .forward_t(&x, &mut rng, eval_mode)
                .reshape(&[batch_size, num_actions, num_atoms]),
        };

        if self.config.distributional {
            debug_assert_eq!(support.size().as_slice(), &[num_atoms]);
            let probabilities = logits.softmax(-1, Kind::Float);
            let q_values =
                (support.to(self.device) * &probabilities).sum_dim_intlist(&[-1i64][..], false, Kind::Float);
            RainbowOutput::Distributional {
                q_values,
                logits,
                probabilities,
            }
        } else {
            let q_values = logits.sum_dim_intlist(&[-1i64][..], false, Kind::Float);
            RainbowOutput::Scalar { q_values }
        }
    }
}

impl<F> Clone for RainbowModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + FeatureDim + Clone,
{
    fn clone(&self) -> Self {
        let config = self.config.clone();
        let f_config = config
            .f_config
            .clone()
            .expect("RainbowModel is built with f_config");
        Self::_build(config, f_config, self.device, Some(&self.var_store))
            .expect("Failed to clone RainbowModel")
    }
}

impl<F> ModelBase for RainbowModel<F>
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
        info!("Save Rainbow model to {:?}", path.as_ref());
        for (name, _) in self.var_store.variables().iter() {
            trace!("Save variable {}", name);
        }
        Ok(())
    }

    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.var_store.load(&path)?;
        info!("Load Rainbow model from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::impala::ImpalaEncoderConfig;
    use tch::kind::FLOAT_CPU;
    use tempdir::TempDir;

    const NUM_ACTIONS: i64 = 4;
    const NUM_ATOMS: i64 = 11;

    fn config() -> RainbowModelConfig<ImpalaEncoderConfig> {
        // A small encoder keeps the tests fast
        let f_config = ImpalaEncoderConfig::default()
            .frame_size(32, 32)
            .stack_sizes(vec![4, 8])
            .num_blocks(1);
        RainbowModelConfig::default()
            .f_config(f_config)
            .num_actions(NUM_ACTIONS)
            .num_atoms(NUM_ATOMS)
    }

    fn obs() -> Tensor {
        Tensor::randint(256, &[3, 4, 32, 32], (Kind::Uint8, Device::Cpu))
    }

    fn allclose(a: &Tensor, b: &Tensor) -> bool {
        a.allclose(b, 1e-5, 1e-5, false)
    }

    #[test]
    fn test_distributional_output() -> Result<()> {
        let model = ImpalaRainbowModel::build(config(), Device::Cpu)?;
        let support = model.support(-10.0, 10.0);
        let out = model.forward(&obs(), &support, false, Some(0));

        match &out {
            RainbowOutput::Distributional {
                q_values,
                logits,
                probabilities,
            } => {
                assert_eq!(q_values.size(), vec![3, NUM_ACTIONS]);
                assert_eq!(logits.size(), vec![3, NUM_ACTIONS, NUM_ATOMS]);

                let sum = probabilities.sum_dim_intlist(&[-1i64][..], false, Kind::Float);
                assert!(allclose(&sum, &Tensor::ones(&[3, NUM_ACTIONS], FLOAT_CPU)));

                let expected = (&support * probabilities).sum_dim_intlist(&[-1i64][..], false, Kind::Float);
                assert!(allclose(q_values, &expected));
            }
            RainbowOutput::Scalar { .. } => panic!("expected a distributional output"),
        }
        assert_eq!(out.q_values().size(), vec![3, NUM_ACTIONS]);
        Ok(())
    }

    #[test]
    fn test_noise() -> Result<()> {
        let model = ImpalaRainbowModel::build(config(), Device::Cpu)?;
        let support = model.support(-10.0, 10.0);
        let x = obs();

        let q1 = model.forward(&x, &support, false, Some(1));
        let q2 = model.forward(&x, &support, false, Some(1));
        let q3 = model.forward(&x, &support, false, Some(2));
        assert!(allclose(q1.q_values(), q2.q_values()));
        assert!(!allclose(q1.q_values(), q3.q_values()));

        let e1 = model.forward(&x, &support, true, Some(1));
        let e2 = model.forward(&x, &support, true, None);
        assert!(allclose(e1.q_values(), e2.q_values()));
        Ok(())
    }

    #[test]
    fn test_scalar_output() -> Result<()> {
        let config = config().distributional(false).dueling(false).noisy(false);
        let model = ImpalaRainbowModel::build(config, Device::Cpu)?;
        let support = model.support(-10.0, 10.0);
        match model.forward(&obs(), &support, false, None) {
            RainbowOutput::Scalar { q_values } => assert_eq!(q_values.size(), vec![3, NUM_ACTIONS]),
            RainbowOutput::Distributional { .. } => panic!("expected a scalar output"),
        }
        assert!(!model.get_var_store().variables().contains_key("value.weight"));
        assert!(model.get_var_store().variables().contains_key("head.weight"));
        Ok(())
    }

    #[test]
    fn test_dueling_logits_ignore_advantage_offset() {
        let adv = Tensor::randn(&[2, NUM_ACTIONS, NUM_ATOMS], FLOAT_CPU);
        let value = Tensor::randn(&[2, 1, NUM_ATOMS], FLOAT_CPU);
        let l1 = dueling_logits(&adv, &value);
        let l2 = dueling_logits(&(&adv + 3.0), &value);
        assert!(allclose(&l1, &l2));
        assert_eq!(l1.size(), vec![2, NUM_ACTIONS, NUM_ATOMS]);
    }

    #[test]
    fn test_check_support() -> Result<()> {
        let model = ImpalaRainbowModel::build(config(), Device::Cpu)?;
        assert!(model.check_support(&model.support(-1.0, 1.0)).is_ok());
        assert_eq!(
            model.check_support(&Tensor::zeros(&[5], FLOAT_CPU)),
            Err(ReincarnateError::SupportMismatch {
                support_len: 5,
                num_atoms: NUM_ATOMS
            })
        );
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        assert!(ImpalaRainbowModel::build(config().num_atoms(0), Device::Cpu).is_err());
        let config = RainbowModelConfig::<ImpalaEncoderConfig>::default().num_actions(2);
        assert!(ImpalaRainbowModel::build(config, Device::Cpu).is_err());
    }

    #[test]
    fn test_clone_and_save_load() -> Result<()> {
        let dir = TempDir::new("rainbow_model")?;
        let path = dir.path().join("rainbow.pt");
        let model = ImpalaRainbowModel::build(config(), Device::Cpu)?;
        let support = model.support(-10.0, 10.0);
        let x = obs();

        let target = model.clone();
        let q1 = model.forward(&x, &support, true, None);
        let q2 = target.forward(&x, &support, true, None);
        assert!(allclose(q1.q_values(), q2.q_values()));

        model.save(&path)?;
        let mut other = ImpalaRainbowModel::build(config(), Device::Cpu)?;
        other.load(&path)?;
        let q3 = other.forward(&x, &support, true, None);
        assert!(allclose(q1.q_values(), q3.q_values()));

        // A head without dueling reuses the pretrained encoder and hidden layer
        let mut student = ImpalaRainbowModel::build(config().dueling(false), Device::Cpu)?;
        let missing = student.load_pretrained(&path)?;
        assert!(missing.is_empty());
        Ok(())
    }
}
