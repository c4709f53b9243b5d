use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::ir::FeatureUniverse;
use crate::model::{load_feature_names, FeatureCache};

pub const PROJECT_FILE: &str = "forest.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectFile {
    project: ProjectSection,
    #[serde(default)]
    output: OutputSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectSection {
    name: String,
    model: PathBuf,
    #[serde(default)]
    feature_count: Option<usize>,
    #[serde(default)]
    features: Option<PathBuf>,
    #[serde(default)]
    features_cache: Option<PathBuf>,
    #[serde(default)]
    features_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputSection {
    #[serde(default = "default_output_dir")]
    dir: PathBuf,
    #[serde(default = "default_backends")]
    backends: Vec<String>,
    #[serde(default)]
    tree_limits: Vec<usize>,
    #[serde(default)]
    backend_dirs: Vec<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_backends() -> Vec<String> {
    vec!["rust".to_string()]
}

impl Default for OutputSection {
    fn default() -> Self {
        OutputSection {
            dir: default_output_dir(),
            backends: default_backends(),
            tree_limits: Vec::new(),
            backend_dirs: Vec::new(),
        }
    }
}

/// Where the feature universe comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureSource {
    /// Anonymous features `f0 .. f{n-1}`.
    Count(usize),
    /// A JSON list of names, optionally memoized in a feature cache.
    Names {
        file: PathBuf,
        cache: Option<(PathBuf, String)>,
        expected: Option<usize>,
    },
}

/// Conversion project configuration from forest.toml.
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Clone, Debug)]
pub struct Project {
    pub name: String,
    pub root_dir: PathBuf,
    pub model: PathBuf,
    pub features: FeatureSource,
    pub output_dir: PathBuf,
    pub backends: Vec<String>,
    /// Empty means "all trees".
    pub tree_limits: Vec<usize>,
    pub backend_dirs: Vec<PathBuf>,
}

impl Project {
    /// Load a project from a forest.toml file.
    pub fn load(toml_path: &Path) -> Result<Project> {
        let content =
            std::fs::read_to_string(toml_path).map_err(|e| ConvertError::io(toml_path, e))?;
        Self::parse(&content, toml_path)
    }

    pub fn parse(content: &str, toml_path: &Path) -> Result<Project> {
        let file: ProjectFile =
            toml::from_str(content).map_err(|e| ConvertError::toml(toml_path, e))?;
        let root_dir = toml_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let invalid = |message: &str| ConvertError::Config {
            path: toml_path.to_path_buf(),
            message: message.to_string(),
            span: None,
        };

        let p = file.project;
        if p.name.is_empty() {
            return Err(invalid("missing 'name' in [project]"));
        }
        let features = match (p.features, p.feature_count) {
            (Some(names), expected) => {
                let cache = match (p.features_cache, p.features_key) {
                    (Some(cache), Some(key)) => Some((root_dir.join(cache), key)),
                    (None, None) => None,
                    _ => {
                        return Err(invalid(
                            "'features_cache' and 'features_key' must be given together",
                        ))
                    }
                };
                FeatureSource::Names {
                    file: root_dir.join(names),
                    cache,
                    expected,
                }
            }
            (None, Some(0)) => return Err(invalid("'feature_count' must be > 0")),
            (None, Some(count)) => FeatureSource::Count(count),
            (None, None) => {
                return Err(invalid(
                    "[project] needs 'feature_count' or a 'features' name list",
                ))
            }
        };

        let out = file.output;
        if out.backends.is_empty() {
            return Err(invalid("[output] backends must not be empty"));
        }
        if out.tree_limits.contains(&0) {
            return Err(invalid("[output] tree_limits must be > 0"));
        }

        Ok(Project {
            name: p.name,
            model: root_dir.join(p.model),
            features,
            output_dir: root_dir.join(out.dir),
            backends: out.backends,
            tree_limits: out.tree_limits,
            backend_dirs: out.backend_dirs.into_iter().map(|d| root_dir.join(d)).collect(),
            root_dir,
        })
    }

    /// Try to find a forest.toml in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(PROJECT_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Build the feature universe, going through the feature cache when
    /// one is configured.
    pub fn feature_universe(&self) -> Result<FeatureUniverse> {
        match &self.features {
            FeatureSource::Count(n) => Ok(FeatureUniverse::indexed(*n)),
            FeatureSource::Names {
                file,
                cache,
                expected,
            } => {
                let names = match cache {
                    Some((cache_path, key)) => {
                        let mut cache = FeatureCache::open(cache_path)?;
                        let names = cache
                            .get_or_insert_with(key, || load_feature_names(file))?
                            .to_vec();
                        cache.save()?;
                        names
                    }
                    None => load_feature_names(file)?,
                };
                if let Some(n) = expected {
                    if names.len() != *n {
                        return Err(ConvertError::InvalidInput(format!(
                            "'{}' lists {} features, feature_count is {}",
                            file.display(),
                            names.len(),
                            n
                        )));
                    }
                }
                debug!(features = names.len(), "loaded feature names");
                FeatureUniverse::named(names)
            }
        }
    }
}
