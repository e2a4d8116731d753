//! Configuration of ViT-style encoders.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Patch extraction of a ViT encoder.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PatchesConfig {
    /// Height and width of a patch.
    pub size: (i64, i64),
}

/// Transformer blocks of a ViT encoder.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TransformerConfig {
    /// Hidden dimension of the MLP block.
    pub mlp_dim: i64,

    /// Number of attention heads.
    pub num_heads: i64,

    /// Number of transformer blocks.
    pub num_layers: i64,

    /// Dropout rate of attention weights.
    pub attention_dropout_rate: f64,

    /// Dropout rate of the other layers.
    pub dropout_rate: f64,
}

/// How the representation of an image is taken from the token sequence.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum Classifier {
    /// Output of the class token.
    Token,

    /// Global average pooling over tokens.
    Gap,
}

/// Configuration record of a ViT encoder.
///
/// Constructed once, read-only thereafter.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct VitConfig {
    /// Name of the configuration.
    pub name: String,

    /// Patch extraction.
    pub patches: PatchesConfig,

    /// Dimension of token embeddings.
    pub hidden_size: i64,

    /// Transformer blocks.
    pub transformer: TransformerConfig,

    /// Readout of the token sequence.
    pub classifier: Classifier,

    /// Size of the optional pre-logits layer.
    pub representation_size: Option<i64>,
}

impl VitConfig {
    /// ViT-B/16 configuration except using patch size of 14x14.
    pub fn atari_b14() -> Self {
        Self {
            name: "ViT-B_14".to_string(),
            patches: PatchesConfig { size: (14, 14) },
            hidden_size: 768,
            transformer: TransformerConfig {
                mlp_dim: 3072,
                num_heads: 12,
                num_layers: 12,
                attention_dropout_rate: 0.0,
                dropout_rate: 0.0,
            },
            classifier: Classifier::Token,
            representation_size: None,
        }
    }

    /// Number of tokens of an image, excluding the class token.
    pub fn num_patches(&self, height: i64, width: i64) -> i64 {
        let (ph, pw) = self.patches.size;
        (height / ph) * (width / pw)
    }

    /// Constructs [`VitConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`VitConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
