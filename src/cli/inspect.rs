use std::path::PathBuf;
use std::process;

use clap::Args;

use forestc::codegen::artifacts::{feature_map, feature_map_json, fingerprint, instruction_dump};

use super::{load_ensemble, FeatureArgs};

#[derive(Args)]
pub struct InspectArgs {
    /// XGBoost JSON model dump
    pub model: PathBuf,
    /// Only list the first N trees
    #[arg(short = 'n', long, value_name = "N")]
    pub trees: Option<usize>,
    /// Print the feature-to-index map instead of the trees
    #[arg(long)]
    pub feature_map: bool,
    /// With --feature-map: print JSON
    #[arg(long, requires = "feature_map")]
    pub json: bool,
    #[command(flatten)]
    pub features: FeatureArgs,
}

pub fn cmd_inspect(args: InspectArgs) {
    let ensemble = load_ensemble(&args.model, &args.features);

    if args.feature_map {
        if args.json {
            match feature_map_json(&ensemble) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("error: cannot encode feature map: {}", e);
                    process::exit(1);
                }
            }
        } else {
            print!("{}", feature_map(&ensemble));
        }
        return;
    }

    let splits: usize = ensemble.trees.iter().map(|t| t.split_count()).sum();
    let depth = ensemble.trees.iter().map(|t| t.depth()).max().unwrap_or(0);
    eprintln!("Model:       {}", args.model.display());
    eprintln!("Trees:       {}", ensemble.len());
    eprintln!("Splits:      {}", splits);
    eprintln!("Max depth:   {}", depth);
    eprintln!(
        "Features:    {} declared, {} referenced",
        ensemble.feature_count(),
        ensemble.referenced_features().len()
    );
    eprintln!("Fingerprint: {}", fingerprint(&ensemble));
    print!("{}", instruction_dump(&ensemble, args.trees));
}
