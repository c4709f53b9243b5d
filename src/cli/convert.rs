use std::path::PathBuf;
use std::process;

use clap::Args;
use tracing::info;

use forestc::{assemble, Backend};

use super::{load_ensemble, or_exit, FeatureArgs};

#[derive(Args)]
pub struct ConvertArgs {
    /// XGBoost JSON model dump
    pub model: PathBuf,
    /// Target backend (built-in: rust, zokrates)
    #[arg(short, long, default_value = "rust")]
    pub backend: String,
    /// Number of trees to emit (default: all)
    #[arg(short = 'n', long, value_name = "N")]
    pub trees: Option<usize>,
    /// Output source file (default: stdout); artifacts go next to it
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Extra directory searched for <backend>/backend.toml
    #[arg(long = "backend-dir", value_name = "DIR")]
    pub backend_dirs: Vec<PathBuf>,
    #[command(flatten)]
    pub features: FeatureArgs,
}

pub fn cmd_convert(args: ConvertArgs) {
    let ConvertArgs {
        model,
        backend,
        trees,
        output,
        backend_dirs,
        features,
    } = args;

    let backend = or_exit(Backend::resolve(&backend, &backend_dirs));
    let ensemble = load_ensemble(&model, &features);
    let limit = trees.unwrap_or(ensemble.len());
    let emission = or_exit(assemble(&ensemble, &backend, limit));

    let Some(out_path) = output else {
        print!("{}", emission.source);
        for artifact in &emission.artifacts {
            eprintln!(
                "note: backend artifact '{}' is only written with --output",
                artifact.file
            );
        }
        return;
    };

    if let Err(e) = std::fs::write(&out_path, &emission.source) {
        eprintln!("error: cannot write '{}': {}", out_path.display(), e);
        process::exit(1);
    }
    let dir = out_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    for artifact in &emission.artifacts {
        let path = dir.join(&artifact.file);
        if let Err(e) = std::fs::write(&path, &artifact.contents) {
            eprintln!("error: cannot write '{}': {}", path.display(), e);
            process::exit(1);
        }
        eprintln!("Wrote {}", path.display());
    }
    info!(trees = limit, backend = %emission.backend, "converted");
    eprintln!(
        "Converted {} of {} trees -> {}",
        limit,
        ensemble.len(),
        out_path.display()
    );
}
