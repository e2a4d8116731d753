use anyhow::Result;
use log::debug;
use reincarnate_core::error::ReincarnateError;
use std::{collections::HashMap, iter::FromIterator, path::Path};
use tch::{nn::VarStore, Device::Cpu, Tensor};

/// Parameters of a network detached and copied to CPU, keyed by variable name.
///
/// Used to move parameters of a pretrained network into another one.
pub struct NamedTensors {
    pub named_tensors: HashMap<String, Tensor>,
}

impl NamedTensors {
    /// Copy data of VarStore to CPU.
    pub fn copy_from(vs: &VarStore) -> Self {
        let src = vs.variables();

        tch::no_grad(|| NamedTensors {
            named_tensors: HashMap::from_iter(src.iter().map(|(k, v)| {
                let v = v.detach().to(Cpu).data();
                (k.clone(), v)
            })),
        })
    }

    /// Reads the tensors saved with [`VarStore::save`] to CPU.
    pub fn load<T: AsRef<Path>>(path: T) -> Result<Self> {
        let path = path.as_ref();
        let named_tensors = match path.extension().and_then(|e| e.to_str()) {
            Some("safetensors") => Tensor::read_safetensors(path)?,
            _ => Tensor::load_multi(path)?,
        };
        Ok(Self {
            named_tensors: named_tensors.into_iter().collect(),
        })
    }

    /// Keeps the tensors whose names start with `prefix`.
    pub fn filter_prefix(self, prefix: &str) -> Self {
        Self {
            named_tensors: self
                .named_tensors
                .into_iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .collect(),
        }
    }

    /// Copy all named tensors to [VarStore].
    ///
    /// Fails without modifying `vs` if a name is not a variable of `vs` or
    /// the shapes differ.
    pub fn copy_to(&self, vs: &mut VarStore) -> Result<()> {
        let mut dest = vs.variables();

        for (name, src) in self.named_tensors.iter() {
            match dest.get(name) {
                None => return Err(ReincarnateError::ParameterNotFound(name.clone()).into()),
                Some(dest) if dest.size() != src.size() => {
                    return Err(ReincarnateError::ShapeMismatch {
                        name: name.clone(),
                        src: src.size(),
                        dest: dest.size(),
                    }
                    .into())
                }
                _ => {}
            }
        }

        tch::no_grad(|| -> Result<()> {
            for (name, src) in self.named_tensors.iter() {
                if let Some(dest) = dest.get_mut(name) {
                    dest.f_copy_(src)?;
                }
            }
            Ok(())
        })
    }

    /// Copies the tensors whose name and shape match a variable of `vs`.
    ///
    /// Returns the number of copied tensors.
    pub fn copy_matching_to(&self, vs: &mut VarStore) -> usize {
        let mut dest = vs.variables();
        let mut n = 0;

        tch::no_grad(|| {
            for (name, src) in self.named_tensors.iter() {
                match dest.get_mut(name) {
                    Some(dest) if dest.size() == src.size() => {
                        dest.copy_(src);
                        n += 1;
                    }
                    _ => debug!("Skip variable {}", name),
                }
            }
        });
        n
    }

    /// Returns the names of the variables of `vs` without a tensor of the
    /// same name and shape, sorted.
    ///
    /// These are the variables [`NamedTensors::copy_matching_to`] leaves as they are.
    pub fn unmatched(&self, vs: &VarStore) -> Vec<String> {
        let mut names = vs
            .variables()
            .into_iter()
            .filter(|(name, dest)| match self.named_tensors.get(name) {
                Some(src) => src.size() != dest.size(),
                None => true,
            })
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Returns the number of tensors.
    pub fn len(&self) -> usize {
        self.named_tensors.len()
    }

    /// Returns `true` if there is no tensor.
    pub fn is_empty(&self) -> bool {
        self.named_tensors.is_empty()
    }
}

impl Clone for NamedTensors {
    fn clone(&self) -> Self {
        let src = &self.named_tensors;

        tch::no_grad(|| NamedTensors {
            named_tensors: HashMap::from_iter(src.iter().map(|(k, v)| {
                let v = v.detach().to(Cpu).data();
                (k.clone(), v)
            })),
        })
    }
}
