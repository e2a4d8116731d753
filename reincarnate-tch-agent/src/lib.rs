//! Atari Q-networks implemented with [tch](https://crates.io/crates/tch).
//!
//! * [`cnn`] - Nature DQN encoder and the DQN network with a learned residual scale.
//! * [`impala`] - Impala residual-block encoder.
//! * [`dqn`] - Model owning the parameters of a Q-network.
//! * [`rainbow`] - Rainbow head: noisy layers, dueling and categorical outputs.
//! * [`iqn`] - Implicit quantile network head.
//!
//! Models own a [`VarStore`](tch::nn::VarStore) and an optimizer, and implement
//! [`ModelBase`], through which parameters of a prior training run are loaded.
pub mod cnn;
pub mod dqn;
pub mod impala;
pub mod iqn;
pub mod layers;
mod model;
mod opt;
pub mod preprocess;
pub mod rainbow;
pub mod util;
pub use model::{ModelBase, SubModel};
pub use opt::{Optimizer, OptimizerConfig};
pub use preprocess::preprocess_atari_inputs;
pub use tch::Device;
