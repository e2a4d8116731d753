use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;
use reincarnate::{
    tch_agent::{
        cnn::{NatureResidualQNet, NatureResidualQNetConfig},
        dqn::{DqnModel, DqnModelConfig},
        impala::ImpalaEncoderConfig,
        iqn::{ImpalaIqnModel, IqnModelConfig, IqnSample},
        rainbow::{ImpalaRainbowModel, RainbowModelConfig, RainbowOutput},
        ModelBase,
    },
    util::reincarnate,
};
use tch::{Device, Kind, Tensor};

const V_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Network {
    /// Nature DQN with learned residual scale
    ResidualDqn,
    /// Rainbow head on the Impala encoder
    Rainbow,
    /// Implicit quantile network on the Impala encoder
    Iqn,
}

/// Run a forward pass of an Atari Q-network on random frames
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Network architecture
    #[arg(long, value_enum, default_value_t = Network::Rainbow)]
    network: Network,

    /// Model configuration (YAML), see `make_cfg_atari`
    #[arg(long)]
    config: Option<String>,

    /// Parameters of a prior training run
    #[arg(long)]
    pretrained: Option<String>,

    /// Save parameters after the forward pass
    #[arg(long)]
    save: Option<String>,

    /// Number of actions, overrides the configuration
    #[arg(long)]
    num_actions: Option<i64>,

    /// Number of observations
    #[arg(long, default_value_t = 2)]
    batch_size: i64,

    /// Number of quantiles of IQN
    #[arg(long, default_value_t = 32)]
    num_quantiles: i64,

    /// Seed of the noise and quantiles
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Turn off noise of noisy layers
    #[arg(long, default_value_t = false)]
    eval: bool,
}

fn random_frames(args: &Args, n_stack: i64, height: i64, width: i64, device: Device) -> Tensor {
    Tensor::randint(
        256,
        &[args.batch_size, n_stack, height, width],
        (Kind::Uint8, device),
    )
}

fn log_stats<M: ModelBase>(model: &M) {
    info!("Number of parameters: {}", model.num_params());
    let stats = model.param_stats();
    let mut keys = stats.keys().collect::<Vec<_>>();
    keys.sort();
    for k in keys {
        if let Ok(v) = stats.get_scalar(k) {
            info!("{}: {:.4}", k, v);
        }
    }
}

fn save<M: ModelBase>(model: &M, args: &Args) -> Result<()> {
    if let Some(path) = &args.save {
        model.save(path)?;
    }
    Ok(())
}

fn residual_dqn(args: &Args, device: Device) -> Result<()> {
    let config = match &args.config {
        Some(path) => DqnModelConfig::<NatureResidualQNetConfig>::load(path)?,
        None => DqnModelConfig::default()
            .q_config(NatureResidualQNetConfig::default())
            .out_dim(18),
    };
    let config = match args.num_actions {
        Some(n) => config.out_dim(n),
        None => config,
    };
    let encoder = config
        .q_config
        .as_ref()
        .map_or_else(Default::default, |q| q.encoder.clone());
    let mut model = DqnModel::<NatureResidualQNet>::build(config, device)?;
    reincarnate(&mut model, args.pretrained.as_ref())?;
    log_stats(&model);

    let x = random_frames(args, encoder.n_stack, encoder.height, encoder.width, device);
    let out = tch::no_grad(|| model.forward(&x));
    info!("q_values: {:?}", out.q_values.size());
    out.q_values.print();
    save(&model, args)
}

fn rainbow(args: &Args, device: Device) -> Result<()> {
    let config = match &args.config {
        Some(path) => RainbowModelConfig::<ImpalaEncoderConfig>::load(path)?,
        None => RainbowModelConfig::default()
            .f_config(ImpalaEncoderConfig::default())
            .num_actions(18),
    };
    let config = match args.num_actions {
        Some(n) => config.num_actions(n),
        None => config,
    };
    let encoder = config.f_config.clone().unwrap_or_default();
    let mut model = ImpalaRainbowModel::build(config, device)?;
    reincarnate(&mut model, args.pretrained.as_ref())?;
    log_stats(&model);

    let x = random_frames(args, encoder.n_stack, encoder.height, encoder.width, device);
    let support = model.support(-V_MAX, V_MAX);
    model.check_support(&support)?;
    let out = tch::no_grad(|| model.forward(&x, &support, args.eval, Some(args.seed)));
    match &out {
        RainbowOutput::Distributional {
            q_values,
            logits,
            probabilities,
        } => {
            info!("q_values: {:?}", q_values.size());
            info!("logits: {:?}", logits.size());
            info!("probabilities: {:?}", probabilities.size());
        }
        RainbowOutput::Scalar { q_values } => {
            info!("q_values: {:?}", q_values.size());
        }
    }
    out.q_values().print();
    save(&model, args)
}

fn iqn(args: &Args, device: Device) -> Result<()> {
    let config = match &args.config {
        Some(path) => IqnModelConfig::<ImpalaEncoderConfig>::load(path)?,
        None => IqnModelConfig::default()
            .f_config(ImpalaEncoderConfig::default())
            .num_actions(18),
    };
    let config = match args.num_actions {
        Some(n) => config.num_actions(n),
        None => config,
    };
    let encoder = config.f_config.clone().unwrap_or_default();
    let mut model = ImpalaIqnModel::build(config, device)?;
    reincarnate(&mut model, args.pretrained.as_ref())?;
    log_stats(&model);

    let x = random_frames(args, encoder.n_stack, encoder.height, encoder.width, device);
    let out = tch::no_grad(|| model.forward(&x, args.num_quantiles, args.seed));
    info!("quantile_values: {:?}", out.quantile_values.size());
    info!("quantiles: {:?}", out.quantiles.size());

    let q = tch::no_grad(|| model.average(&x, &IqnSample::Const10, None));
    q.print();
    save(&model, args)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    tch::manual_seed(42);

    let args = Args::parse();
    let device = Device::cuda_if_available();
    info!("Device: {:?}", device);

    match args.network {
        Network::ResidualDqn => residual_dqn(&args, device),
        Network::Rainbow => rainbow(&args, device),
        Network::Iqn => iqn(&args, device),
    }
}
