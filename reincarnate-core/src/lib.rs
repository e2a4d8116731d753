#![warn(missing_docs)]
//! Backend independent pieces shared by the network crates.
//!
//! * [`error::ReincarnateError`] enumerates configuration errors.
//! * [`record`] holds key-value records, used to report parameter statistics.
//! * [`vit`] is the configuration record of ViT-style encoders.
pub mod error;
pub mod record;
pub mod vit;

pub use vit::{TransformerConfig, VitConfig};
