use crate::{layers::same_out_size, util::FeatureDim};
use serde::{Deserialize, Serialize};

/// Configuration of [`ImpalaEncoder`](super::ImpalaEncoder).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ImpalaEncoderConfig {
    /// Number of stacked frames, the channels of the input.
    pub n_stack: i64,

    /// Height of a frame.
    pub height: i64,

    /// Width of a frame.
    pub width: i64,

    /// Multiplier of the number of channels of every stack.
    pub nn_scale: i64,

    /// Number of channels of each stack, before scaling.
    pub stack_sizes: Vec<i64>,

    /// Number of residual blocks per stack.
    pub num_blocks: i64,

    /// Downsample by max pooling at the beginning of each stack.
    #[serde(default = "default_use_max_pooling")]
    pub use_max_pooling: bool,
}

fn default_use_max_pooling() -> bool {
    true
}

impl Default for ImpalaEncoderConfig {
    fn default() -> Self {
        Self {
            n_stack: 4,
            height: 84,
            width: 84,
            nn_scale: 1,
            stack_sizes: vec![16, 32, 32],
            num_blocks: 2,
            use_max_pooling: true,
        }
    }
}

impl ImpalaEncoderConfig {
    /// Sets the number of stacked frames.
    pub fn n_stack(mut self, v: i64) -> Self {
        self.n_stack = v;
        self
    }

    /// Sets the frame size.
    pub fn frame_size(mut self, height: i64, width: i64) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    /// Sets the channel multiplier.
    pub fn nn_scale(mut self, v: i64) -> Self {
        self.nn_scale = v;
        self
    }

    /// Sets the number of channels of each stack.
    pub fn stack_sizes(mut self, v: Vec<i64>) -> Self {
        self.stack_sizes = v;
        self
    }

    /// Sets the number of residual blocks per stack.
    pub fn num_blocks(mut self, v: i64) -> Self {
        self.num_blocks = v;
        self
    }

    /// Returns the spatial size of the output feature map.
    pub fn out_size(&self) -> (i64, i64) {
        let n = match self.use_max_pooling {
            true => self.stack_sizes.len(),
            false => 0,
        };
        (0..n).fold((self.height, self.width), |(h, w), _| {
            (same_out_size(h, 2), same_out_size(w, 2))
        })
    }

    /// Returns the number of channels of the output feature map.
    pub fn out_channels(&self) -> i64 {
        self.stack_sizes.last().map_or(self.n_stack, |&s| s * self.nn_scale)
    }
}

impl FeatureDim for ImpalaEncoderConfig {
    fn feature_dim(&self) -> i64 {
        let (h, w) = self.out_size();
        self.out_channels() * h * w
    }
}
