use anyhow::Result;
use clap::Parser;
use log::info;
use reincarnate::{
    core::VitConfig,
    tch_agent::{
        cnn::NatureResidualQNetConfig,
        dqn::DqnModelConfig,
        impala::ImpalaEncoderConfig,
        iqn::IqnModelConfig,
        rainbow::RainbowModelConfig,
    },
};
use std::path::PathBuf;

/// Create default configuration files of the Atari networks
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Output directory
    #[arg(long, default_value = "./reincarnate/examples/model")]
    dir: PathBuf,

    /// Number of actions
    #[arg(long, default_value_t = 18)]
    num_actions: i64,

    /// Channel multiplier of the Impala encoder
    #[arg(long, default_value_t = 1)]
    nn_scale: i64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    std::fs::create_dir_all(&args.dir)?;

    let impala = ImpalaEncoderConfig::default().nn_scale(args.nn_scale);

    let path = args.dir.join("residual_dqn.yaml");
    DqnModelConfig::default()
        .q_config(NatureResidualQNetConfig::default())
        .out_dim(args.num_actions)
        .save(&path)?;
    info!("Create config file: {:?}", path);

    let path = args.dir.join("rainbow.yaml");
    RainbowModelConfig::default()
        .f_config(impala.clone())
        .num_actions(args.num_actions)
        .save(&path)?;
    info!("Create config file: {:?}", path);

    let path = args.dir.join("iqn.yaml");
    IqnModelConfig::default()
        .f_config(impala)
        .num_actions(args.num_actions)
        .save(&path)?;
    info!("Create config file: {:?}", path);

    let path = args.dir.join("vit_b14.yaml");
    VitConfig::atari_b14().save(&path)?;
    info!("Create config file: {:?}", path);

    Ok(())
}
