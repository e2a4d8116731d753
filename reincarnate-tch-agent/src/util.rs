//! Utilities.
use crate::model::ModelBase;
use log::trace;
mod named_tensors;
pub use named_tensors::NamedTensors;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use reincarnate_core::record::{Record, RecordValue};
use std::convert::TryFrom;
use tch::{nn::VarStore, Tensor};

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track<M: ModelBase>(dest: &mut M, src: &M, tau: f64) {
    let src = src.get_var_store().variables();
    let mut dest = dest.get_var_store_mut().variables();
    debug_assert_eq!(src.len(), dest.len());

    tch::no_grad(|| {
        for (name, src) in src.iter() {
            if let Some(dest) = dest.get_mut(name) {
                dest.copy_(&(tau * src + (1.0 - tau) * &*dest));
            }
        }
    });
    trace!("soft update");
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: i64);
}

/// Length of the flattened feature vector produced by an encoder.
pub trait FeatureDim {
    /// Returns the length of the feature vector.
    fn feature_dim(&self) -> i64;
}

/// Returns the mean and standard deviation of the parameters.
pub fn param_stats(var_store: &VarStore) -> Record {
    let mut record = Record::empty();

    tch::no_grad(|| {
        for (k, v) in var_store.variables() {
            if let Ok(m) = f32::try_from(v.mean(tch::Kind::Float)) {
                record.insert(format!("{}_mean", &k), RecordValue::Scalar(m));
            }
            if let Ok(s) = f32::try_from(v.std(false)) {
                record.insert(format!("{}_std", &k), RecordValue::Scalar(s));
            }
        }
    });

    record
}

/// Returns the number of scalar parameters in the var store.
pub fn num_params(var_store: &VarStore) -> usize {
    var_store.variables().values().map(|v| v.numel()).sum()
}

/// Returns a random number generator seeded with `key`, or from entropy if `None`.
pub fn seeded_rng(key: Option<u64>) -> SmallRng {
    match key {
        Some(key) => SmallRng::seed_from_u64(key),
        None => SmallRng::from_entropy(),
    }
}

/// Samples `n` values from the uniform distribution over `[0, 1)`.
pub fn uniform<R: Rng>(rng: &mut R, n: usize) -> Vec<f32> {
    (0..n).map(|_| rng.gen::<f32>()).collect()
}

/// Converts a vector to a tensor of the given shape.
pub fn vec_to_tensor(v: Vec<f32>, shape: &[i64]) -> Tensor {
    Tensor::from_slice(&v).reshape(shape)
}

#[cfg(test)]
mod test {
    use super::*;
    use tch::{nn, Device};

    #[test]
    fn test_seeded_rng() {
        let v1 = uniform(&mut seeded_rng(Some(42)), 8);
        let v2 = uniform(&mut seeded_rng(Some(42)), 8);
        let v3 = uniform(&mut seeded_rng(Some(43)), 8);
        assert_eq!(v1, v2);
        assert_ne!(v1, v3);
        assert!(v1.iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_param_stats() {
        let vs = nn::VarStore::new(Device::Cpu);
        let _ = nn::linear(vs.root() / "l", 3, 2, Default::default());
        assert_eq!(num_params(&vs), 8);

        let record = param_stats(&vs);
        assert_eq!(record.len(), 4);
        assert!(record.get_scalar("l.weight_mean").is_ok());
        assert!(record.get_scalar("l.bias_std").is_ok());
    }
}
