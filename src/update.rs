//! Attribute updates.
//!
//! An [`AttributeUpdate`] changes stored attribute values of existing
//! documents in place. Scalar updates carry one value per attribute; MVA
//! updates carry a full replacement array per attribute.
//!
//! # Example
//! ```rust
//! use sphx::AttributeUpdate;
//!
//! let update = AttributeUpdate::scalar("test1", vec!["group_id".into()])
//!     .entry(1, vec![123])
//!     .entry(3, vec![456]);
//!
//! assert!(update.validate().is_ok());
//! ```
use crate::{ClientError, error::ensure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateValues {
    /// One value per attribute.
    Scalar(Vec<i64>),
    /// One array per attribute.
    Multi(Vec<Vec<u32>>),
}

impl UpdateValues {
    fn arity(&self) -> usize {
        match self {
            UpdateValues::Scalar(v) => v.len(),
            UpdateValues::Multi(v) => v.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEntry {
    pub doc_id: u64,
    pub values: UpdateValues,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeUpdate {
    pub index: String,
    pub attrs: Vec<String>,
    /// Whether the attributes are multi-valued.
    pub multi: bool,
    pub entries: Vec<UpdateEntry>,
}

impl AttributeUpdate {
    pub fn scalar(index: impl Into<String>, attrs: Vec<String>) -> Self {
        Self {
            index: index.into(),
            attrs,
            multi: false,
            entries: Vec::new(),
        }
    }

    pub fn multi(index: impl Into<String>, attrs: Vec<String>) -> Self {
        Self {
            index: index.into(),
            attrs,
            multi: true,
            entries: Vec::new(),
        }
    }

    /// Adds new scalar values for a document.
    ///
    /// Values travel as 32-bit integers; wider values are truncated.
    pub fn entry(mut self, doc_id: u64, values: Vec<i64>) -> Self {
        self.entries.push(UpdateEntry {
            doc_id,
            values: UpdateValues::Scalar(values),
        });
        self
    }

    /// Adds replacement arrays for a document, one per attribute.
    pub fn multi_entry(mut self, doc_id: u64, values: Vec<Vec<u32>>) -> Self {
        self.entries.push(UpdateEntry {
            doc_id,
            values: UpdateValues::Multi(values),
        });
        self
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        ensure(!self.index.is_empty(), "no index name provided")?;
        ensure(!self.attrs.is_empty(), "no attribute names provided")?;
        ensure(!self.entries.is_empty(), "no update entries provided")?;

        for (i, entry) in self.entries.iter().enumerate() {
            let shape_ok = matches!(
                (&entry.values, self.multi),
                (UpdateValues::Scalar(_), false) | (UpdateValues::Multi(_), true)
            );
            if !shape_ok || entry.values.arity() != self.attrs.len() {
                return Err(ClientError::validation(format!(
                    "update entry #{i} has wrong length"
                )));
            }
        }
        Ok(())
    }
}
