//! Impala residual-block encoder.
mod base;
mod config;
pub use base::{ImpalaEncoder, ImpalaStack, ResidualBlock};
pub use config::ImpalaEncoderConfig;
