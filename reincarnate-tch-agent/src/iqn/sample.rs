use crate::util::{uniform, vec_to_tensor};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tch::Tensor;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// The way of taking quantiles.
pub enum IqnSample {
    /// Quantiles `0.05:0.1:0.95`, constant.
    Const10,

    /// The given number of samples from the uniform distribution over `[0, 1)`.
    Uniform(i64),

    /// Single quantile, median.
    Median,
}

impl IqnSample {
    /// Returns quantiles of shape `[batch_size, n_percent_points]`.
    ///
    /// Uniform samples are drawn independently for each row. Panics if the
    /// number of uniform samples is not positive.
    pub fn sample<R: Rng>(&self, batch_size: i64, rng: &mut R) -> Tensor {
        match self {
            Self::Const10 => Tensor::from_slice(&[
                0.05_f32, 0.15, 0.25, 0.35, 0.45, 0.55, 0.65, 0.75, 0.85, 0.95,
            ])
            .unsqueeze(0)
            .repeat(&[batch_size, 1]),
            Self::Uniform(n) => {
                assert!(*n > 0, "number of quantiles must be positive, got {}", n);
                vec_to_tensor(uniform(rng, (batch_size * n) as usize), &[batch_size, *n])
            }
            Self::Median => Tensor::from_slice(&[0.5_f32])
                .unsqueeze(0)
                .repeat(&[batch_size, 1]),
        }
    }

    /// Returns the number of quantiles generated by this way.
    pub fn n_percent_points(&self) -> i64 {
        match self {
            Self::Const10 => 10,
            Self::Uniform(n) => *n,
            Self::Median => 1,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::seeded_rng;

    #[test]
    fn test_sample() {
        let mut rng = seeded_rng(Some(0));
        for mode in [IqnSample::Const10, IqnSample::Uniform(32), IqnSample::Median].iter() {
            let tau = mode.sample(5, &mut rng);
            assert_eq!(tau.size(), vec![5, mode.n_percent_points()]);
            assert!(tau.min().double_value(&[]) >= 0.0);
            assert!(tau.max().double_value(&[]) < 1.0);
        }
        let median = IqnSample::Median.sample(2, &mut rng);
        assert_eq!(median.double_value(&[1, 0]), 0.5);
    }

    #[test]
    #[should_panic(expected = "number of quantiles must be positive")]
    fn test_negative_uniform_samples() {
        let _ = IqnSample::Uniform(-1).sample(2, &mut seeded_rng(Some(0)));
    }
}
