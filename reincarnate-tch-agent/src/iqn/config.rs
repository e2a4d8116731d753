//! Configuration of IQN model.
use crate::opt::OptimizerConfig;
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`IqnModel`](super::IqnModel).
///
/// The type parameter `F` represents a configuration struct of the encoder.
pub struct IqnModelConfig<F> {
    /// Configuration of the encoder.
    pub f_config: Option<F>,

    /// Number of actions.
    pub num_actions: i64,

    /// Dimension of the cosine embedding of quantiles.
    pub embed_dim: i64,

    /// Number of units of the hidden layer.
    pub hidden_dim: i64,

    /// If `true`, observations are expected in `[0, 1]` already.
    #[serde(default)]
    pub inputs_preprocessed: bool,

    /// Configuration of optimizer.
    pub opt_config: OptimizerConfig,
}

impl<F> Default for IqnModelConfig<F> {
    fn default() -> Self {
        Self {
            f_config: None,
            num_actions: 0,
            embed_dim: 64,
            hidden_dim: 512,
            inputs_preprocessed: false,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<F> IqnModelConfig<F>
where
    F: DeserializeOwned + Serialize,
{
    /// Sets configurations for the encoder.
    pub fn f_config(mut self, v: F) -> Self {
        self.f_config = Some(v);
        self
    }

    /// Sets the number of actions.
    pub fn num_actions(mut self, v: i64) -> Self {
        self.num_actions = v;
        self
    }

    /// Sets the dimension of cos-embedding of quantiles.
    pub fn embed_dim(mut self, v: i64) -> Self {
        self.embed_dim = v;
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

    /// Constructs [`IqnModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`IqnModelConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
