pub mod backends;
pub mod build;
pub mod convert;
pub mod inspect;
pub mod predict;

use std::path::{Path, PathBuf};
use std::process;

use clap::Args;

use forestc::diagnostic::{feature_warnings, render_diagnostics, report_error};
use forestc::ir::{build_ensemble, FeatureUniverse, TreeEnsemble};
use forestc::model::{load_dump, load_feature_names, FeatureCache};
use forestc::project::{Project, PROJECT_FILE};

/// Unwrap a library result, reporting the error and exiting on failure.
pub fn or_exit<T>(result: forestc::Result<T>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            report_error(&e);
            process::exit(1);
        }
    }
}

/// How the feature universe of an ad-hoc conversion is declared.
#[derive(Args, Clone, Debug)]
pub struct FeatureArgs {
    /// Number of input features (named f0 .. fN-1)
    #[arg(long, value_name = "N", required_unless_present = "feature_names")]
    pub features: Option<usize>,
    /// JSON list of feature names, in input order
    #[arg(long, value_name = "PATH", conflicts_with = "features")]
    pub feature_names: Option<PathBuf>,
    /// Feature-name cache file (used with --feature-names)
    #[arg(long, value_name = "PATH", requires_all = ["feature_names", "cache_key"])]
    pub feature_cache: Option<PathBuf>,
    /// Key of this model in the feature-name cache
    #[arg(long, value_name = "KEY", requires = "feature_cache")]
    pub cache_key: Option<String>,
}

impl FeatureArgs {
    pub fn universe(&self) -> FeatureUniverse {
        if let Some(path) = &self.feature_names {
            let names = match (&self.feature_cache, &self.cache_key) {
                (Some(cache_path), Some(key)) => {
                    let mut cache = or_exit(FeatureCache::open(cache_path));
                    let names = or_exit(cache.get_or_insert_with(key, || load_feature_names(path)))
                        .to_vec();
                    or_exit(cache.save());
                    names
                }
                _ => or_exit(load_feature_names(path)),
            };
            let universe = or_exit(FeatureUniverse::named(names));
            render_diagnostics(&feature_warnings(&universe), "forestc", "");
            return universe;
        }
        match self.features {
            Some(0) | None => {
                eprintln!("error: --features must be > 0");
                process::exit(1);
            }
            Some(n) => FeatureUniverse::indexed(n),
        }
    }
}

/// Load a model dump and build its IR, exiting on error.
pub fn load_ensemble(model: &Path, features: &FeatureArgs) -> TreeEnsemble {
    let universe = features.universe();
    let dumps = or_exit(load_dump(model));
    or_exit(build_ensemble(&dumps, universe))
}

/// Resolve a project path: a forest.toml, a directory holding one, or a
/// directory below one.
pub fn resolve_project(input: &Path) -> Project {
    let toml_path = if input.is_file() {
        Some(input.to_path_buf())
    } else {
        Project::find(input)
    };
    match toml_path {
        Some(path) => or_exit(Project::load(&path)),
        None => {
            eprintln!(
                "error: no {} found in '{}' or its parents",
                PROJECT_FILE,
                input.display()
            );
            process::exit(1);
        }
    }
}

/// Parse a comma- or whitespace-separated list of numbers.
pub fn parse_values(text: &str) -> Result<Vec<f64>, String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f64>()
                .map_err(|e| format!("invalid number '{}': {}", t, e))
        })
        .collect()
}
