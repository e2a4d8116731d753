use crate::opt::OptimizerConfig;
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`RainbowModel`](super::RainbowModel).
///
/// The type parameter `F` is the configuration of the encoder.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RainbowModelConfig<F> {
    /// Configuration of the encoder.
    pub f_config: Option<F>,

    /// Number of actions.
    pub num_actions: i64,

    /// Number of atoms of the return distribution.
    pub num_atoms: i64,

    /// Number of units of the hidden layer.
    pub hidden_dim: i64,

    /// Use noisy linear layers.
    pub noisy: bool,

    /// Use the dueling architecture.
    pub dueling: bool,

    /// Output a categorical distribution over the support.
    pub distributional: bool,

    /// If `true`, observations are expected in `[0, 1]` already.
    #[serde(default)]
    pub inputs_preprocessed: bool,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<F> Default for RainbowModelConfig<F> {
    fn default() -> Self {
        Self {
            f_config: None,
            num_actions: 0,
            num_atoms: 51,
            hidden_dim: 512,
            noisy: true,
            dueling: true,
            distributional: true,
            inputs_preprocessed: false,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<F> RainbowModelConfig<F>
where
    F: DeserializeOwned + Serialize,
{
    /// Sets the configuration of the encoder.
    pub fn f_config(mut self, v: F) -> Self {
        self.f_config = Some(v);
        self
    }

    /// Sets the number of actions.
    pub fn num_actions(mut self, v: i64) -> Self {
        self.num_actions = v;
        self
    }

    /// Sets the number of atoms.
    pub fn num_atoms(mut self, v: i64) -> Self {
        self.num_atoms = v;
        self
    }

    /// Sets whether to use noisy layers.
    pub fn noisy(mut self, v: bool) -> Self {
        self.noisy = v;
        self
    }

    /// Sets whether to use the dueling architecture.
    pub fn dueling(mut self, v: bool) -> Self {
        self.dueling = v;
        self
    }

    /// Sets whether to output a distribution.
    pub fn distributional(mut self, v: bool) -> Self {
        self.distributional = v;
        self
    }

    /// Sets whether observations are already preprocessed.
    pub fn inputs_preprocessed(mut self, v: bool) -> Self {
        self.inputs_preprocessed = v;
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`RainbowModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RainbowModelConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
