use crate::{
    layers::same_out_size,
    util::{FeatureDim, OutDim},
};
use serde::{Deserialize, Serialize};

/// Configuration of [`NatureCnn`](super::NatureCnn).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct NatureCnnConfig {
    /// Number of stacked frames, the channels of the input.
    pub n_stack: i64,

    /// Height of a frame.
    pub height: i64,

    /// Width of a frame.
    pub width: i64,
}

impl Default for NatureCnnConfig {
    fn default() -> Self {
        Self {
            n_stack: 4,
            height: 84,
            width: 84,
        }
    }
}

impl NatureCnnConfig {
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
}

impl FeatureDim for NatureCnnConfig {
    fn feature_dim(&self) -> i64 {
        let out = |size| same_out_size(same_out_size(same_out_size(size, 4), 2), 1);
        64 * out(self.height) * out(self.width)
    }
}

/// Configuration of [`NatureResidualQNet`](super::NatureResidualQNet).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct NatureResidualQNetConfig {
    /// Encoder.
    pub encoder: NatureCnnConfig,

    /// Number of units of the hidden layer.
    pub hidden_dim: i64,

    /// Number of actions.
    pub out_dim: i64,

    /// If `true`, observations are expected in `[0, 1]` already.
    #[serde(default)]
    pub inputs_preprocessed: bool,
}

impl Default for NatureResidualQNetConfig {
    fn default() -> Self {
        Self {
            encoder: NatureCnnConfig::default(),
            hidden_dim: 512,
            out_dim: 0,
            inputs_preprocessed: false,
        }
    }
}

impl NatureResidualQNetConfig {
    /// Sets the configuration of the encoder.
    pub fn encoder(mut self, v: NatureCnnConfig) -> Self {
        self.encoder = v;
        self
    }

    /// Sets whether observations are already preprocessed.
    pub fn inputs_preprocessed(mut self, v: bool) -> Self {
        self.inputs_preprocessed = v;
        self
    }
}

impl OutDim for NatureResidualQNetConfig {
    fn get_out_dim(&self) -> i64 {
        self.out_dim
    }

    fn set_out_dim(&mut self, v: i64) {
        self.out_dim = v;
    }
}
