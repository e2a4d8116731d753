//! Noisy linear layers.
use super::xavier_uniform;
use crate::util::vec_to_tensor;
use rand::Rng;
use rand_distr::StandardNormal;
use tch::{nn, nn::Init, nn::Module, Tensor};

/// Linear layer with factorized Gaussian noise on its weights and biases.
///
/// With noise vectors `p` (input side) and `q` (output side) sampled from the
/// standard normal distribution and `f(x) = sign(x) * sqrt(|x|)`,
///
/// * `w = kernel_mu + kernel_sigma * (f(p) f(q)^T)`
/// * `b = bias_mu + bias_sigma * f(q)`
///
/// The noise is turned off in evaluation mode.
#[derive(Debug)]
pub struct NoisyLinear {
    in_dim: i64,
    out_dim: i64,
    kernel_mu: Tensor,
    kernel_sigma: Tensor,
    bias_mu: Tensor,
    bias_sigma: Tensor,
}

impl NoisyLinear {
    /// Creates the parameters of the layer under `p`.
    pub fn new<'a, T: std::borrow::Borrow<nn::Path<'a>>>(p: T, in_dim: i64, out_dim: i64) -> Self {
        let p = p.borrow();
        let bound = 1.0 / (in_dim as f64).sqrt();
        let mu_init = Init::Uniform {
            lo: -bound,
            up: bound,
        };
        let sigma_init = Init::Const(0.1 * bound);

        Self {
            in_dim,
            out_dim,
            kernel_mu: p.var("kernel_mu", &[in_dim, out_dim], mu_init),
            kernel_sigma: p.var("kernel_sigma", &[in_dim, out_dim], sigma_init),
            bias_mu: p.var("bias_mu", &[out_dim], mu_init),
            bias_sigma: p.var("bias_sigma", &[out_dim], sigma_init),
        }
    }

    fn noise<R: Rng>(rng: &mut R, n: i64) -> Vec<f32> {
        (0..n).map(|_| rng.sample::<f32, _>(StandardNormal)).collect()
    }

    fn f(x: &Tensor) -> Tensor {
        x.sign() * x.abs().sqrt()
    }

    /// Applies the layer with noise drawn from `rng`, or without noise when `eval_mode`.
    pub fn forward_t<R: Rng>(&self, xs: &Tensor, rng: &mut R, eval_mode: bool) -> Tensor {
        if eval_mode {
            return xs.matmul(&self.kernel_mu) + &self.bias_mu;
        }

        let device = self.kernel_mu.device();
        let p = vec_to_tensor(Self::noise(rng, self.in_dim), &[self.in_dim, 1]);
        let q = vec_to_tensor(Self::noise(rng, self.out_dim), &[1, self.out_dim]);
        let f_p = Self::f(&p.to(device));
        let f_q = Self::f(&q.to(device));

        let w_epsilon = f_p.matmul(&f_q);
        let b_epsilon = f_q.squeeze_dim(0);
        let w = &self.kernel_mu + &self.kernel_sigma * w_epsilon;
        let b = &self.bias_mu + &self.bias_sigma * b_epsilon;
        xs.matmul(&w) + b
    }
}

/// A hidden or output layer of the Rainbow head, either noisy or dense.
#[derive(Debug)]
pub enum FeatureLayer {
    /// Dense layer with Xavier uniform weights and zero biases.
    Dense(nn::Linear),

    /// Noisy linear layer.
    Noisy(NoisyLinear),
}

impl FeatureLayer {
    /// Creates a layer under `p`.
    pub fn new<'a, T: std::borrow::Borrow<nn::Path<'a>>>(
        p: T,
        in_dim: i64,
        out_dim: i64,
        noisy: bool,
    ) -> Self {
        if noisy {
            Self::Noisy(NoisyLinear::new(p, in_dim, out_dim))
        } else {
            let config = nn::LinearConfig {
                ws_init: xavier_uniform(in_dim, out_dim),
                bs_init: Some(Init::Const(0.0)),
                bias: true,
            };
            Self::Dense(nn::linear(p, in_dim, out_dim, config))
        }
    }

    /// Applies the layer; `rng` and `eval_mode` only matter for noisy layers.
    pub fn forward_t<R: Rng>(&self, xs: &Tensor, rng: &mut R, eval_mode: bool) -> Tensor {
        match self {
            Self::Dense(linear) => linear.forward(xs),
            Self::Noisy(noisy) => noisy.forward_t(xs, rng, eval_mode),
        }
    }
}
