//! Recipes: ordered lists of worker kinds defining a pipeline's stages.

use crate::error::Result;
use crate::worker::WorkerKind;

/// An ordered sequence of worker kinds. Length = number of stages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Recipe {
    kinds: Vec<WorkerKind>,
}

impl Recipe {
    /// Parse a comma-separated list of worker-kind names. An empty or
    /// all-whitespace string is the empty recipe (zero stages).
    pub fn parse(list: &str) -> Result<Self> {
        let mut kinds = Vec::new();
        for name in list.split(',') {
            if name.trim().is_empty() {
                continue;
            }
            kinds.push(WorkerKind::parse(name)?);
        }
        Ok(Self { kinds })
    }

    pub fn kinds(&self) -> &[WorkerKind] {
        &self.kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.kinds.iter().map(|k| k.name()).collect();
        write!(f, "{}", names.join(","))
    }
}
