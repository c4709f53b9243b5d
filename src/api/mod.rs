//! Public conversion entry points.

pub mod pipeline;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::codegen::artifacts::{feature_map, instruction_dump};
use crate::codegen::{assemble, Emission};
use crate::config::backend::Backend;
use crate::config::project::Project;
use crate::error::{ConvertError, Result};
use crate::ir::{build_ensemble, FeatureUniverse, TreeEnsemble};
use crate::model::{load_dump, RawNode};

pub use pipeline::PreparedModel;

#[cfg(test)]
mod tests;

/// Convert raw tree dumps for one backend.
///
/// `tree_limit` of `None` emits every tree. The whole ensemble is built
/// (and so fully validated) before anything is rendered.
pub fn convert(
    dumps: &[Vec<RawNode>],
    features: FeatureUniverse,
    backend: &Backend,
    tree_limit: Option<usize>,
) -> Result<Emission> {
    let ensemble = build_ensemble(dumps, features)?;
    let limit = tree_limit.unwrap_or(ensemble.len());
    assemble(&ensemble, backend, limit)
}

/// Convert a model dump file for the named backend.
pub fn convert_file(
    model: &Path,
    features: FeatureUniverse,
    backend: &str,
    backend_dirs: &[PathBuf],
    tree_limit: Option<usize>,
) -> Result<Emission> {
    let backend = Backend::resolve(backend, backend_dirs)?;
    let dumps = load_dump(model)?;
    convert(&dumps, features, &backend, tree_limit)
}

/// Every (backend, tree limit) combination, in parallel.
///
/// Results come back ordered by backend, then by limit. All limits are
/// checked before any job starts.
pub fn convert_batch(
    ensemble: &TreeEnsemble,
    backends: &[Backend],
    tree_limits: &[usize],
) -> Result<Vec<Emission>> {
    if let Some(&bad) = tree_limits
        .iter()
        .find(|&&k| k == 0 || k > ensemble.len())
    {
        return Err(ConvertError::InvalidTreeLimit {
            requested: bad,
            available: ensemble.len(),
        });
    }
    let jobs: Vec<(&Backend, usize)> = backends
        .iter()
        .flat_map(|b| tree_limits.iter().map(move |&k| (b, k)))
        .collect();
    info!(jobs = jobs.len(), "converting batch");
    jobs.into_par_iter()
        .map(|(backend, limit)| assemble(ensemble, backend, limit))
        .collect()
}

/// Files written by [`write_emission`].
#[derive(Clone, Debug, Default)]
pub struct WrittenFiles {
    pub source: PathBuf,
    pub artifacts: Vec<PathBuf>,
}

/// `<stem>_<limit>trees`, the default file stem of a project emission.
pub fn emission_stem(project: &str, tree_limit: usize) -> String {
    format!("{}_{}trees", project, tree_limit)
}

/// Write an emission and its backend artifacts under `dir/<backend>/`.
pub fn write_emission(dir: &Path, stem: &str, emission: &Emission) -> Result<WrittenFiles> {
    let out_dir = dir.join(&emission.backend);
    std::fs::create_dir_all(&out_dir).map_err(|e| ConvertError::io(&out_dir, e))?;
    let source = out_dir.join(emission.file_name(stem));
    std::fs::write(&source, &emission.source).map_err(|e| ConvertError::io(&source, e))?;
    let mut artifacts = Vec::with_capacity(emission.artifacts.len());
    for artifact in &emission.artifacts {
        let path = out_dir.join(&artifact.file);
        std::fs::write(&path, &artifact.contents).map_err(|e| ConvertError::io(&path, e))?;
        artifacts.push(path);
    }
    Ok(WrittenFiles { source, artifacts })
}

/// Convert a whole forest.toml project and write the results.
///
/// Also writes `<name>.features.txt` and `<name>.trees.txt` next to the
/// backend directories.
pub fn build_project(project: &Project) -> Result<Vec<WrittenFiles>> {
    let prepared = PreparedModel::from_project(project)?;
    let limits = prepared.tree_limits(&project.tree_limits);
    let emissions = convert_batch(&prepared.ensemble, &prepared.backends, &limits)?;

    let dir = &project.output_dir;
    std::fs::create_dir_all(dir).map_err(|e| ConvertError::io(dir, e))?;
    let mut written = Vec::with_capacity(emissions.len());
    for emission in &emissions {
        let stem = emission_stem(&project.name, emission.tree_limit);
        written.push(write_emission(dir, &stem, emission)?);
    }

    let features_path = dir.join(format!("{}.features.txt", project.name));
    std::fs::write(&features_path, feature_map(&prepared.ensemble))
        .map_err(|e| ConvertError::io(&features_path, e))?;
    let dump_path = dir.join(format!("{}.trees.txt", project.name));
    std::fs::write(&dump_path, instruction_dump(&prepared.ensemble, None))
        .map_err(|e| ConvertError::io(&dump_path, e))?;

    info!(project = %project.name, files = written.len(), "build finished");
    Ok(written)
}
