//! Implicit quantile network head.
//!
//! Quantiles `tau` are embedded with the cosine basis
//! `cos(pi * i * tau), i = 1..=embed_dim`, projected to the dimension of the
//! encoder features and merged with them by element-wise multiplication
//! before the output layers.
mod config;
mod model;
mod sample;
pub use config::IqnModelConfig;
pub use model::{ImpalaIqnModel, IqnModel, IqnOutput};
pub use sample::IqnSample;
