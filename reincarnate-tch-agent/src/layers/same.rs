//! Convolution and pooling with `SAME` padding.
use tch::{nn, nn::Init, nn::Module, Tensor};

/// Spatial output size of a `SAME`-padded convolution or pooling.
pub fn same_out_size(size: i64, stride: i64) -> i64 {
    (size + stride - 1) / stride
}

/// Padding before and after a spatial axis.
fn same_padding(size: i64, kernel: i64, stride: i64) -> (i64, i64) {
    let out = same_out_size(size, stride);
    let total = ((out - 1) * stride + kernel - size).max(0);
    (total / 2, total - total / 2)
}

fn pad_dim(xs: &Tensor, dim: usize, before: i64, after: i64, value: f64) -> Tensor {
    if before == 0 && after == 0 {
        return xs.shallow_clone();
    }

    let options = (xs.kind(), xs.device());
    let mut parts = Vec::with_capacity(3);
    let mut size = xs.size();
    if before > 0 {
        size[dim] = before;
        parts.push(Tensor::full(size.as_slice(), value, options));
    }
    parts.push(xs.shallow_clone());
    if after > 0 {
        size[dim] = after;
        parts.push(Tensor::full(size.as_slice(), value, options));
    }
    Tensor::cat(&parts, dim as i64)
}

/// Pads the last two axes of `[batch, channels, height, width]` with `value`.
fn pad_same(xs: &Tensor, kernel: i64, stride: i64, value: f64) -> Tensor {
    let size = xs.size();
    debug_assert_eq!(size.len(), 4);
    let (top, bottom) = same_padding(size[2], kernel, stride);
    let (left, right) = same_padding(size[3], kernel, stride);
    let xs = pad_dim(xs, 2, top, bottom, value);
    pad_dim(&xs, 3, left, right, value)
}

/// 2D convolution with `SAME` padding.
#[derive(Debug)]
pub struct Conv2dSame {
    conv: nn::Conv2D,
    kernel: i64,
    stride: i64,
}

impl Module for Conv2dSame {
    fn forward(&self, xs: &Tensor) -> Tensor {
        pad_same(xs, self.kernel, self.stride, 0.0).apply(&self.conv)
    }
}

/// Creates a `SAME`-padded convolution with kernel initializer `ws_init` and zero biases.
pub fn conv2d_same<'a, T: std::borrow::Borrow<nn::Path<'a>>>(
    p: T,
    in_channels: i64,
    out_channels: i64,
    kernel: i64,
    stride: i64,
    ws_init: Init,
) -> Conv2dSame {
    let config = nn::ConvConfig {
        stride,
        ws_init,
        bs_init: Init::Const(0.0),
        ..Default::default()
    };
    Conv2dSame {
        conv: nn::conv2d(p, in_channels, out_channels, kernel, config),
        kernel,
        stride,
    }
}

/// Max pooling with `SAME` padding, padded values never win the max.
pub fn max_pool2d_same(xs: &Tensor, kernel: i64, stride: i64) -> Tensor {
    pad_same(xs, kernel, stride, f64::NEG_INFINITY).max_pool2d(
        &[kernel, kernel],
        &[stride, stride],
        &[0, 0],
        &[1, 1],
        false,
    )
}
