//! Key-value records.
//!
//! Networks report statistics of their parameters (mean and standard deviation
//! of each variable, number of parameters) as a [`Record`], which the training
//! loop can forward to whatever logger it uses.
//!
//! ```rust
//! use reincarnate_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("encoder/c1.weight_mean", RecordValue::Scalar(0.0));
//! record.insert("num_params", RecordValue::Scalar(1_690_000.0));
//! assert_eq!(record.len(), 2);
//! ```
mod base;
pub use base::{Record, RecordValue};
