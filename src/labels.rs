use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("label `{name}` already bound to {address}")]
    Duplicate { name: String, address: usize },
    #[error("label `{name}` is not bound")]
    Undefined { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub name: String,
    pub address: usize,
}

/// Label name to bundle address, for a single assembly run.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: HashMap<String, usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: &str, address: usize) -> Result<(), LabelError> {
        if let Some(&prev) = self.labels.get(name) {
            return Err(LabelError::Duplicate { name: name.to_string(), address: prev });
        }
        tracing::debug!(label = name, address, "bind label");
        self.labels.insert(name.to_string(), address);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<usize, LabelError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| LabelError::Undefined { name: name.to_string() })
    }

    pub fn reset(&mut self) {
        self.labels.clear();
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Bindings ordered by address, then name.
    pub fn entries(&self) -> Vec<LabelEntry> {
        let mut out: Vec<LabelEntry> = self
            .labels
            .iter()
            .map(|(name, &address)| LabelEntry { name: name.clone(), address })
            .collect();
        out.sort_by(|a, b| a.address.cmp(&b.address).then_with(|| a.name.cmp(&b.name)));
        out
    }
}
