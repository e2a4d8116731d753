use anyhow::Result;
use reincarnate::{
    tch_agent::{
        cnn::{NatureCnn, NatureCnnConfig, NatureResidualQNet, NatureResidualQNetConfig},
        dqn::{DqnModel, DqnModelConfig},
        iqn::{IqnModel, IqnModelConfig},
        util::NamedTensors,
        ModelBase,
    },
    util::reincarnate,
};
use std::path::PathBuf;
use tch::{Device, Kind, Tensor};
use tempdir::TempDir;

const NUM_ACTIONS: i64 = 4;

fn residual_dqn() -> Result<DqnModel<NatureResidualQNet>> {
    let config = DqnModelConfig::default()
        .q_config(NatureResidualQNetConfig::default())
        .out_dim(NUM_ACTIONS);
    DqnModel::build(config, Device::Cpu)
}

fn iqn() -> Result<IqnModel<NatureCnn>> {
    let config = IqnModelConfig::default()
        .f_config(NatureCnnConfig::default())
        .num_actions(NUM_ACTIONS);
    IqnModel::build(config, Device::Cpu)
}

fn encoder_weight<M: ModelBase>(model: &M) -> Tensor {
    model.get_var_store().variables()["encoder.c1.weight"].copy()
}

#[test]
fn test_iqn_from_pretrained_dqn() -> Result<()> {
    let dir = TempDir::new("reincarnate")?;
    let path = dir.path().join("dqn.pt");
    let pretrained = residual_dqn()?;
    pretrained.save(&path)?;

    let mut model = iqn()?;
    let mut missing = reincarnate(&mut model, Some(&path))?;
    missing.sort();
    assert_eq!(
        missing,
        vec![
            "iqn_cos_to_feature.bias".to_string(),
            "iqn_cos_to_feature.weight".to_string()
        ]
    );
    assert!(encoder_weight(&pretrained).equal(&encoder_weight(&model)));

    let x = Tensor::randint(256, &[2, 4, 84, 84], (Kind::Uint8, Device::Cpu));
    let out = model.forward(&x, 8, 0);
    assert_eq!(out.quantile_values.size(), vec![2, 8, NUM_ACTIONS]);
    Ok(())
}

#[test]
fn test_no_checkpoint() -> Result<()> {
    let mut model = residual_dqn()?;
    let before = encoder_weight(&model);
    let missing = reincarnate(&mut model, None::<PathBuf>)?;
    assert!(missing.is_empty());
    assert!(before.equal(&encoder_weight(&model)));
    Ok(())
}

#[test]
fn test_transfer_encoder_in_memory() -> Result<()> {
    let pretrained = residual_dqn()?;
    let mut model = iqn()?;
    let encoder = NamedTensors::copy_from(pretrained.get_var_store()).filter_prefix("encoder.");
    assert_eq!(encoder.len(), 6);
    encoder.copy_to(model.get_var_store_mut())?;
    assert!(encoder_weight(&pretrained).equal(&encoder_weight(&model)));
    Ok(())
}
