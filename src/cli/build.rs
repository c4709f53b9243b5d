use std::path::PathBuf;

use clap::Args;

use super::{or_exit, resolve_project};

#[derive(Args)]
pub struct BuildArgs {
    /// forest.toml, or a directory at or below one (default: current directory)
    #[arg(default_value = ".")]
    pub input: PathBuf,
    /// Override [output] dir
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Override [output] tree_limits
    #[arg(short = 'n', long = "trees", value_name = "N", value_delimiter = ',')]
    pub tree_limits: Vec<usize>,
}

pub fn cmd_build(args: BuildArgs) {
    let mut project = resolve_project(&args.input);
    if let Some(dir) = args.output {
        project.output_dir = dir;
    }
    if !args.tree_limits.is_empty() {
        project.tree_limits = args.tree_limits;
    }

    eprintln!("Building {}...", project.name);
    let written = or_exit(forestc::build_project(&project));
    for files in &written {
        eprintln!("  {}", files.source.display());
        for artifact in &files.artifacts {
            eprintln!("  {}", artifact.display());
        }
    }
    eprintln!(
        "Built {} source files -> {}",
        written.len(),
        project.output_dir.display()
    );
}
