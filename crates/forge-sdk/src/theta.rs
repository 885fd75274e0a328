use std::{fmt, sync::Arc};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{InferenceTensor, ThetaError};

/// Immutable, ordered collection of named parameters.
///
/// Names are dotted paths (`blk.0.attn_q.weight`). Iteration follows
/// insertion order. Clones share the same storage.
#[derive(Clone, Default)]
pub struct Theta {
    entries: Arc<Vec<(String, InferenceTensor)>>,
    index: Arc<FxHashMap<String, usize>>,
}

impl Theta {
    /// Key every tensor by its own name.
    pub fn new(tensors: impl IntoIterator<Item = InferenceTensor>) -> Result<Self, ThetaError> {
        Self::from_entries(tensors.into_iter().map(|tensor| (tensor.name().to_string(), tensor)))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, InferenceTensor)>) -> Result<Self, ThetaError> {
        let entries: Vec<_> = entries.into_iter().collect();
        let mut index = FxHashMap::with_capacity_and_hasher(entries.len(), Default::default());
        for (position, (name, _)) in entries.iter().enumerate() {
            if index.insert(name.clone(), position).is_some() {
                return Err(ThetaError::Duplicate(name.clone()));
            }
        }
        Ok(Self {
            entries: Arc::new(entries),
            index: Arc::new(index),
        })
    }

    /// Look up a tensor, failing when it is absent.
    pub fn tensor(&self, name: &str) -> Result<&InferenceTensor, ThetaError> {
        self.get(name).ok_or_else(|| ThetaError::NotFound(name.to_string()))
    }

    /// [`Self::tensor`] for a path given as components, e.g. `["blk", "0", "weight"]`.
    pub fn tensor_path(&self, path: &[&str]) -> Result<&InferenceTensor, ThetaError> {
        self.tensor(&path.join("."))
    }

    pub fn get(&self, name: &str) -> Option<&InferenceTensor> {
        self.index.get(name).map(|&position| &self.entries[position].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InferenceTensor)> {
        self.entries.iter().map(|(name, tensor)| (name.as_str(), tensor))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries under `prefix.`, re-keyed relative to the prefix.
    pub fn scope(&self, prefix: &str) -> Result<Theta, ThetaError> {
        let lead = format!("{prefix}.");
        let scoped: Vec<_> = self
            .iter()
            .filter_map(|(name, tensor)| name.strip_prefix(&lead).map(|rest| (rest.to_string(), tensor.clone())))
            .collect();
        if scoped.is_empty() {
            return Err(ThetaError::NotFound(prefix.to_string()));
        }
        Self::from_entries(scoped)
    }

    /// Distinct first path components, in first-seen order.
    pub fn child_names(&self) -> Vec<&str> {
        let mut seen = FxHashSet::default();
        self.keys()
            .map(|name| name.split_once('.').map_or(name, |(head, _)| head))
            .filter(|head| seen.insert(*head))
            .collect()
    }
}

impl fmt::Debug for Theta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Theta").field("keys", &self.keys().collect::<Vec<_>>()).finish()
    }
}

#[path = "theta.test.rs"]
mod tests;
