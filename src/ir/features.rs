//! Feature reference resolution.
//!
//! Every backend addresses features by dense index into an input array of
//! exactly `len()` elements. Symbolic names never reach emitted code.

use std::collections::HashMap;

use crate::error::{ConvertError, Result};
use crate::ir::FeatureRef;

/// The ordered, fixed-size domain of input measurements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureUniverse {
    names: Vec<String>,
    by_name: HashMap<String, usize>,
    /// Off when any declared name is itself `f<digits>`; the alias would
    /// then give one index two meanings.
    positional_alias: bool,
}

impl FeatureUniverse {
    /// Anonymous universe: features are named `f0 .. f{count-1}`.
    pub fn indexed(count: usize) -> Self {
        let names: Vec<String> = (0..count).map(|i| format!("f{}", i)).collect();
        let by_name = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        FeatureUniverse {
            names,
            by_name,
            positional_alias: false,
        }
    }

    /// Named universe. Names must be unique.
    pub fn named(names: Vec<String>) -> Result<Self> {
        let mut by_name: HashMap<String, usize> = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if let Some(&first) = by_name.get(name) {
                return Err(ConvertError::DuplicateFeature {
                    name: name.clone(),
                    first,
                    second: i,
                });
            }
            by_name.insert(name.clone(), i);
        }
        let positional_alias = !names.iter().any(|n| positional(n).is_some());
        Ok(FeatureUniverse {
            names,
            by_name,
            positional_alias,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Whether `f<N>` resolves to index N for names that are not declared.
    pub fn positional_alias(&self) -> bool {
        self.positional_alias
    }

    /// Declared `f<N>` names sitting at an index other than N, as
    /// `(index, name)`. Such a list reads differently from how XGBoost
    /// would number the columns.
    pub fn misplaced_positional_names(&self) -> Vec<(usize, &str)> {
        self.names
            .iter()
            .enumerate()
            .filter(|(i, n)| positional(n).is_some_and(|p| p != *i))
            .map(|(i, n)| (i, n.as_str()))
            .collect()
    }

    /// Resolve a symbolic reference to its dense index.
    ///
    /// Declared names resolve directly. `f<N>` is a positional alias for
    /// index N when N is inside the universe, which is how XGBoost names
    /// features of a booster trained without column names. The alias is
    /// only active when no declared name has that shape, so every index
    /// keeps exactly one meaning. Either way the returned reference
    /// carries the canonical declared name.
    pub fn lookup(&self, name: &str) -> Option<FeatureRef> {
        let index = match self.by_name.get(name) {
            Some(&i) => i,
            None if self.positional_alias => {
                positional(name).filter(|&i| i < self.names.len())?
            }
            None => return None,
        };
        Some(FeatureRef {
            name: self.names[index].clone(),
            index,
        })
    }

    /// [`lookup`](Self::lookup), reporting the tree/node on failure.
    pub fn resolve(&self, name: &str, tree: usize, node: u32) -> Result<FeatureRef> {
        self.lookup(name).ok_or_else(|| ConvertError::UnknownFeature {
            feature: name.to_string(),
            tree,
            node,
            feature_count: self.names.len(),
        })
    }
}

fn positional(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('f')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
