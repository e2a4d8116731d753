//! Convolutional neural networks of the DQN Nature paper.
//!
//! [`NatureCnn`] is the encoder: three convolutions with `SAME` padding,
//! producing a flattened feature vector. [`NatureResidualQNet`] puts a dense
//! head on it and scales the Q-values by a learned vector `alpha`, which is
//! initialized to zeros so that the head starts out as a zero residual.
//!
//! Raw observations are cast from `u8` to `f32` and scaled by 1 / 255 by
//! [`NatureResidualQNet`] unless `inputs_preprocessed` is set.
mod base;
mod config;
mod residual;
pub use base::NatureCnn;
pub use config::{NatureCnnConfig, NatureResidualQNetConfig};
pub use residual::NatureResidualQNet;
