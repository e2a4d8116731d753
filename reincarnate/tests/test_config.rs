use anyhow::Result;
use reincarnate::tch_agent::{
    impala::ImpalaEncoderConfig,
    iqn::IqnModelConfig,
    rainbow::RainbowModelConfig,
    OptimizerConfig,
};
use tempdir::TempDir;

#[test]
fn test_rainbow_config() -> Result<()> {
    let dir = TempDir::new("rainbow_config")?;
    let path = dir.path().join("rainbow.yaml");
    let config = RainbowModelConfig::default()
        .f_config(ImpalaEncoderConfig::default().nn_scale(2))
        .num_actions(6)
        .noisy(false)
        .opt_config(OptimizerConfig::Adam { lr: 1e-4, eps: 3e-4 });
    config.save(&path)?;

    let loaded = RainbowModelConfig::<ImpalaEncoderConfig>::load(&path)?;
    assert_eq!(loaded, config);
    assert_eq!(loaded.num_atoms, 51);
    assert!(!loaded.noisy);

    let value: serde_yaml::Value = serde_yaml::from_reader(std::fs::File::open(&path)?)?;
    assert_eq!(value["f_config"]["nn_scale"].as_i64(), Some(2));
    Ok(())
}

#[test]
fn test_iqn_config_defaults() -> Result<()> {
    let s = r#"
f_config:
  n_stack: 4
  height: 84
  width: 84
  nn_scale: 1
  stack_sizes: [16, 32, 32]
  num_blocks: 2
num_actions: 18
embed_dim: 64
hidden_dim: 512
opt_config:
  Adam:
    lr: 0.00005
"#;
    let config: IqnModelConfig<ImpalaEncoderConfig> = serde_yaml::from_str(s)?;
    assert!(!config.inputs_preprocessed);
    assert_eq!(config.f_config, Some(ImpalaEncoderConfig::default()));
    assert_eq!(config.opt_config.learning_rate(), 5e-5);
    Ok(())
}
