//! Definition of interfaces of neural networks.
use crate::util::{num_params, param_stats, NamedTensors};
use anyhow::Result;
use log::{info, warn};
use reincarnate_core::record::Record;
use std::path::Path;
use tch::{nn, nn::VarStore, Tensor};

/// Base interface of models owning parameters and an optimizer.
pub trait ModelBase {
    /// Trains the network given a loss.
    fn backward_step(&mut self, loss: &Tensor);

    /// Returns `var_store` as mutable reference.
    fn get_var_store_mut(&mut self) -> &mut nn::VarStore;

    /// Returns `var_store`.
    fn get_var_store(&self) -> &nn::VarStore;

    /// Save parameters of the neural network.
    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()>;

    /// Load parameters of the neural network.
    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()>;

    /// Loads the parameters found in a checkpoint of a prior training run.
    ///
    /// A variable is loaded when the checkpoint has a tensor of the same name
    /// and shape. The other variables keep their current values and their
    /// sorted names are returned. This is the way to start a new head on top
    /// of a pretrained encoder, or to reuse a network trained with a different
    /// number of actions.
    fn load_pretrained<T: AsRef<Path>>(&mut self, path: T) -> Result<Vec<String>> {
        let src = NamedTensors::load(&path)?;
        let vs = self.get_var_store_mut();
        let kept = src.unmatched(vs);
        let n = src.copy_matching_to(vs);
        info!(
            "Load {} pretrained parameters from {:?}",
            n,
            path.as_ref()
        );
        for name in kept.iter() {
            warn!("Variable {} not found in the checkpoint or has another shape", name);
        }
        Ok(kept)
    }

    /// Returns the mean and standard deviation of each variable.
    fn param_stats(&self) -> Record {
        param_stats(self.get_var_store())
    }

    /// Returns the number of scalar parameters.
    fn num_params(&self) -> usize {
        num_params(self.get_var_store())
    }
}

/// Neural network model that can be initialized with [`VarStore`] and configuration.
///
/// The purpose of this trait is for modularity of neural network models.
/// Modules, which consists a neural network, should share [`VarStore`].
/// To do this, structs implementing this trait can be initialized with a given [`VarStore`].
/// This trait also provide the ability to clone with a given [`VarStore`].
/// The ability is useful when creating a target network.
///
/// [`VarStore`]: https://docs.rs/tch/0.16.0/tch/nn/struct.VarStore.html
pub trait SubModel {
    /// Configuration from which [`SubModel`] is constructed.
    type Config;

    /// Input of the [`SubModel`].
    type Input;

    /// Output of the [`SubModel`].
    type Output;

    /// Builds [`SubModel`] with [`VarStore`] and [`SubModel::Config`].
    fn build(var_store: &VarStore, config: Self::Config) -> Self;

    /// Clones [`SubModel`] with [`VarStore`].
    fn clone_with_var_store(&self, var_store: &VarStore) -> Self;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> Self::Output;
}
