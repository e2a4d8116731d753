//! Building blocks shared by the networks.
//!
//! Convolutions and max pooling follow the `SAME` padding convention of
//! TensorFlow/Flax, so that parameter shapes and feature sizes agree with
//! networks trained in those frameworks.
mod init;
mod noisy;
mod same;
pub use init::{variance_scaling_uniform, xavier_uniform};
pub use noisy::{FeatureLayer, NoisyLinear};
pub use same::{conv2d_same, max_pool2d_same, same_out_size, Conv2dSame};
