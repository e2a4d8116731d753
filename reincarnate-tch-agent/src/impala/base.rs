use super::ImpalaEncoderConfig;
use crate::{
    layers::{conv2d_same, max_pool2d_same, xavier_uniform, Conv2dSame},
    model::SubModel,
};
use tch::{nn, nn::Module, Device, Tensor};

fn conv3x3(p: nn::Path, in_ch: i64, out_ch: i64) -> Conv2dSame {
    conv2d_same(p, in_ch, out_ch, 3, 1, xavier_uniform(in_ch * 9, out_ch * 9))
}

/// Residual block: `x + conv(relu(conv(relu(x))))`.
#[derive(Debug)]
pub struct ResidualBlock {
    conv1: Conv2dSame,
    conv2: Conv2dSame,
}

impl ResidualBlock {
    fn new(p: &nn::Path, num_ch: i64) -> Self {
        Self {
            conv1: conv3x3(p / "conv1", num_ch, num_ch),
            conv2: conv3x3(p / "conv2", num_ch, num_ch),
        }
    }
}

impl Module for ResidualBlock {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let out = self.conv1.forward(&xs.relu());
        let out = self.conv2.forward(&out.relu());
        out + xs
    }
}

/// A convolution, optional max pooling and a sequence of residual blocks.
#[derive(Debug)]
pub struct ImpalaStack {
    conv: Conv2dSame,
    blocks: Vec<ResidualBlock>,
    use_max_pooling: bool,
}

impl ImpalaStack {
    fn new(p: &nn::Path, in_ch: i64, num_ch: i64, num_blocks: i64, use_max_pooling: bool) -> Self {
        let conv = conv3x3(p / "conv", in_ch, num_ch);
        let blocks = (0..num_blocks)
            .map(|i| ResidualBlock::new(&(p / format!("block{}", i)), num_ch))
            .collect();

        Self {
            conv,
            blocks,
            use_max_pooling,
        }
    }
}

impl Module for ImpalaStack {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let mut out = self.conv.forward(xs);
        if self.use_max_pooling {
            out = max_pool2d_same(&out, 3, 2);
        }
        for block in self.blocks.iter() {
            out = block.forward(&out);
        }
        out
    }
}

/// Encoder of the Impala network.
///
/// Takes preprocessed frames `[batch, n_stack, height, width]`. The output
/// of [`SubModel::forward`] is the flattened feature map
/// `[batch, feature_dim]`; [`ImpalaEncoder::forward_map`] keeps the spatial axes.
pub struct ImpalaEncoder {
    config: ImpalaEncoderConfig,
    device: Device,
    stacks: Vec<ImpalaStack>,
}

impl ImpalaEncoder {
    /// Returns the feature map `[batch, channels, height, width]` after the final relu.
    pub fn forward_map(&self, x: &Tensor) -> Tensor {
        let out = self
            .stacks
            .iter()
            .fold(x.to(self.device), |out, stack| stack.forward(&out));
        out.relu()
    }
}

impl SubModel for ImpalaEncoder {
    type Config = ImpalaEncoderConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Tensor {
        self.forward_map(x).flatten(1, -1)
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let p = &(var_store.root() / "encoder");
        let mut in_ch = config.n_stack;
        let mut stacks = Vec::with_capacity(config.stack_sizes.len());

        for (i, stack_size) in config.stack_sizes.iter().enumerate() {
            let num_ch = stack_size * config.nn_scale;
            stacks.push(ImpalaStack::new(
                &(p / format!("stack{}", i)),
                in_ch,
                num_ch,
                config.num_blocks,
                config.use_max_pooling,
            ));
            in_ch = num_ch;
        }

        Self {
            config,
            device: var_store.device(),
            stacks,
        }
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::build(var_store, self.config.clone())
    }
}
