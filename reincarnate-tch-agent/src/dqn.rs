//! Q-network model.
mod config;
mod model;
pub use config::DqnModelConfig;
pub use model::{DqnModel, DqnOutput};
