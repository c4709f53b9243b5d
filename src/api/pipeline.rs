//! Shared model preparation pipeline.
//!
//! Loading the dump, building the IR and resolving the requested backends
//! happens once; every emission afterwards reads the prepared model.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codegen::artifacts::short_fingerprint;
use crate::config::backend::Backend;
use crate::config::project::Project;
use crate::diagnostic::feature_warnings;
use crate::error::Result;
use crate::ir::{build_ensemble, FeatureUniverse, TreeEnsemble};
use crate::model::load_dump;

/// An ensemble plus the backends it will be emitted for.
#[derive(Debug)]
pub struct PreparedModel {
    pub ensemble: TreeEnsemble,
    pub backends: Vec<Backend>,
}

impl PreparedModel {
    /// Load `model`, build the IR against `features` and resolve every
    /// backend in `backend_names`.
    ///
    /// Backends are resolved before the model is read so a descriptor
    /// error surfaces without touching the dump.
    pub fn build(
        model: &Path,
        features: FeatureUniverse,
        backend_names: &[String],
        backend_dirs: &[PathBuf],
    ) -> Result<Self> {
        let backends = backend_names
            .iter()
            .map(|name| Backend::resolve(name, backend_dirs))
            .collect::<Result<Vec<_>>>()?;
        for diag in feature_warnings(&features) {
            warn!("{}", diag.message);
        }
        let dumps = load_dump(model)?;
        let ensemble = build_ensemble(&dumps, features)?;
        info!(
            model = %model.display(),
            trees = ensemble.len(),
            features = ensemble.feature_count(),
            fingerprint = %short_fingerprint(&ensemble),
            "prepared model"
        );
        Ok(PreparedModel { ensemble, backends })
    }

    /// Prepare everything a forest.toml asks for.
    pub fn from_project(project: &Project) -> Result<Self> {
        let features = project.feature_universe()?;
        Self::build(
            &project.model,
            features,
            &project.backends,
            &project.backend_dirs,
        )
    }

    /// `limits`, or the full ensemble when empty.
    pub fn tree_limits(&self, limits: &[usize]) -> Vec<usize> {
        if limits.is_empty() {
            vec![self.ensemble.len()]
        } else {
            limits.to_vec()
        }
    }
}
