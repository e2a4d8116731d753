//! Rainbow head.
//!
//! Encoder features go through a hidden layer of 512 units and an output
//! layer, each of which is a noisy linear layer or a dense layer. With the
//! dueling architecture, the output is split into per-action advantages and
//! a state value,
//!
//! `logits = value + (adv - mean_actions(adv))`.
//!
//! With the distributional output, `logits` are normalized over atoms and the
//! Q-values are the expectation over the given support. Otherwise the Q-values
//! are the sum of `logits` over atoms.
mod config;
mod model;
pub use config::RainbowModelConfig;
pub use model::{ImpalaRainbowModel, RainbowModel, RainbowOutput};
