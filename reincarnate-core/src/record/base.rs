//! Base implementation of records.
use crate::error::ReincarnateError;
use std::collections::{hash_map::Keys, HashMap};

/// Values stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value.
    Scalar(f32),
}

/// Key-value pairs reported by a network.
#[derive(Debug, Default, Clone)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, ReincarnateError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            None => Err(ReincarnateError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_scalar() {
        let mut record = Record::empty();
        assert!(record.is_empty());

        record.insert("loss", RecordValue::Scalar(0.5));
        record.insert("loss", RecordValue::Scalar(0.25));
        assert_eq!(record.len(), 1);
        assert_eq!(record.get_scalar("loss"), Ok(0.25));
        assert_eq!(
            record.get_scalar("missing"),
            Err(ReincarnateError::RecordKeyError("missing".to_string()))
        );
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["loss"]);
    }
}
