//! Q-networks for reinforcement learning agents that start from the weights
//! of a prior training run.
//!
//! The workspace consists of the following crates:
//!
//! * [reincarnate-core](reincarnate_core) has the error type, key-value
//!   records for parameter statistics and the configuration record of
//!   ViT-style encoders. It does not depend on any deep learning backend.
//! * [reincarnate-tch-agent](reincarnate_tch_agent) defines the networks on
//!   [tch](https://crates.io/crates/tch): Nature and Impala encoders, the DQN
//!   network with a learned residual scale, the Rainbow head and the implicit
//!   quantile network head.
//! * This crate re-exports both and has runnable examples:
//!   `forward_atari` builds a network, optionally loads pretrained
//!   parameters and runs a forward pass on random frames;
//!   `make_cfg_atari` writes default configuration files.
//!
//! Training loops, replay buffers and environments are out of scope; a
//! network is a function from observations and parameters to an output
//! record, called by the training loop of the user.
pub use reincarnate_core as core;
pub use reincarnate_tch_agent as tch_agent;
pub mod util;
