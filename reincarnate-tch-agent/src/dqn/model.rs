use super::DqnModelConfig;
use crate::{
    model::{ModelBase, SubModel},
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::{Context, Result};
use log::{info, trace};
use reincarnate_core::error::ReincarnateError;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tch::{nn, Device, Tensor};

/// Output of a Q-network.
#[derive(Debug)]
pub struct DqnOutput {
    /// Q-values, `[batch, num_actions]`.
    pub q_values: Tensor,
}

/// Owns the parameters of a Q-network and its optimizer.
pub struct DqnModel<Q>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    device: Device,
    var_store: nn::VarStore,

    // Dimension of the output vector (equal to the number of actions).
    out_dim: i64,

    // Action-value function
    q: Q,

    // Optimizer
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`DqnModel`].
    pub fn build(config: DqnModelConfig<Q::Config>, device: Device) -> Result<Self> {
        let q_config = config.q_config.context("q_config is not set.")?;
        let out_dim = q_config.get_out_dim();
        ReincarnateError::check_positive("out_dim", out_dim)?;

        let var_store = nn::VarStore::new(device);
        let q = Q::build(&var_store, q_config);
        let model = Self::_build(device, out_dim, config.opt_config, q, var_store, None)?;
        info!(
            "Build DQN model with {} actions, {} parameters",
            out_dim,
            model.num_params()
        );
        Ok(model)
    }

    fn _build(
        device: Device,
        out_dim: i64,
        opt_config: OptimizerConfig,
        q: Q,
        mut var_store: nn::VarStore,
        var_store_src: Option<&nn::VarStore>,
    ) -> Result<Self> {
        // Optimizer
        let opt = opt_config.build(&var_store)?;

        // Copy var_store
        if let Some(var_store_src) = var_store_src {
            var_store.copy(var_store_src)?;
        }

        Ok(Self {
            device,
            out_dim,
            opt_config,
            var_store,
            opt,
            q,
        })
    }

    /// Outputs the action-value given an observation.
    pub fn forward(&self, x: &Q::Input) -> DqnOutput {
        let q_values = self.q.forward(x);
        debug_assert_eq!(q_values.size().as_slice()[1], self.out_dim);
        DqnOutput { q_values }
    }

    /// Returns the number of actions.
    pub fn out_dim(&self) -> i64 {
        self.out_dim
    }
}

impl<Q> Clone for DqnModel<Q>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    fn clone(&self) -> Self {
        let device = self.device;
        let out_dim = self.out_dim;
        let opt_config = self.opt_config.clone();
        let var_store = nn::VarStore::new(device);
        let q = self.q.clone_with_var_store(&var_store);

        Self::_build(
            device,
            out_dim,
            opt_config,
            q,
            var_store,
            Some(&self.var_store),
        )
        .expect("Failed to clone DqnModel")
    }
}

impl<Q> ModelBase for DqnModel<Q>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
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
        info!("Save DQN model to {:?}", path.as_ref());
        let vs = self.var_store.variables();
        for (name, _) in vs.iter() {
            trace!("Save variable {}", name);
        }
        Ok(())
    }

    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.var_store.load(&path)?;
        info!("Load DQN model from {:?}", path.as_ref());
        Ok(())
    }
}
