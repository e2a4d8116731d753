//! Parameter initializers.
use tch::nn::Init;

/// Glorot/Xavier uniform initializer.
///
/// For convolution kernels, `fan_in` and `fan_out` include the receptive field.
pub fn xavier_uniform(fan_in: i64, fan_out: i64) -> Init {
    let bound = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Init::Uniform {
        lo: -bound,
        up: bound,
    }
}

/// Variance scaling initializer with `fan_in` mode and uniform distribution.
pub fn variance_scaling_uniform(scale: f64, fan_in: i64) -> Init {
    let bound = (3.0 * scale / fan_in as f64).sqrt();
    Init::Uniform {
        lo: -bound,
        up: bound,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bounds() {
        match xavier_uniform(2, 4) {
            Init::Uniform { lo, up } => {
                assert!((up - 1.0).abs() < 1e-12);
                assert!((lo + 1.0).abs() < 1e-12);
            }
            _ => panic!("unexpected initializer"),
        }

        // scale = 1/sqrt(3), as in the quantile head
        match variance_scaling_uniform(1.0 / 3f64.sqrt(), 3) {
            Init::Uniform { up, .. } => assert!((up - 3f64.powf(-0.25)).abs() < 1e-12),
            _ => panic!("unexpected initializer"),
        }
    }
}
