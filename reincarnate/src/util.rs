//! Utilities for the examples.
use anyhow::Result;
use log::info;
use reincarnate_tch_agent::ModelBase;
use std::path::Path;

/// Loads parameters of a prior training run into `model`, if `path` is given.
///
/// Variables without a tensor of the same name and shape in the checkpoint
/// keep their initial values. Returns the names of such variables.
pub fn reincarnate<M: ModelBase>(model: &mut M, path: Option<impl AsRef<Path>>) -> Result<Vec<String>> {
    match path {
        Some(path) => {
            let missing = model.load_pretrained(path)?;
            info!(
                "{} variables kept their initial values",
                missing.len()
            );
            Ok(missing)
        }
        None => Ok(vec![]),
    }
}
