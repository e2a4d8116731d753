//! Input normalization for Atari 2600 frames.
use tch::{Kind, Tensor};

/// Casts raw pixel observations to `f32` and scales them to `[0, 1]`.
pub fn preprocess_atari_inputs(x: &Tensor) -> Tensor {
    x.to_kind(Kind::Float) / 255.0
}

/// Applies [`preprocess_atari_inputs`] unless inputs are already preprocessed.
pub(crate) fn maybe_preprocess(x: &Tensor, inputs_preprocessed: bool) -> Tensor {
    if inputs_preprocessed {
        x.to_kind(Kind::Float)
    } else {
        preprocess_atari_inputs(x)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn test_preprocess_atari_inputs() {
        let x = Tensor::from_slice(&[0u8, 51, 255]);
        let y = preprocess_atari_inputs(&x);
        assert_eq!(y.kind(), Kind::Float);
        let y = Vec::<f32>::try_from(&y).unwrap();
        assert_eq!(y, vec![0.0, 0.2, 1.0]);
    }

    #[test]
    fn test_preprocessed_inputs_pass_through() {
        let x = Tensor::from_slice(&[0.5f32, 1.0]);
        let y = maybe_preprocess(&x, true);
        assert!(y.allclose(&x, 1e-6, 1e-6, false));
    }
}
