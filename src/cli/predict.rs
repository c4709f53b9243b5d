use std::path::PathBuf;
use std::process;

use clap::Args;

use forestc::diagnostic::{render_diagnostics, Diagnostic};
use forestc::ir::eval;
use forestc::{dequantize, encode_field_list, encode_inputs, Backend, Fixed};

use super::{load_ensemble, or_exit, parse_values, FeatureArgs};

#[derive(Args)]
pub struct PredictArgs {
    /// XGBoost JSON model dump
    pub model: PathBuf,
    /// Input values, comma separated, in feature order
    #[arg(short, long, value_name = "VALUES", conflicts_with = "input_file")]
    pub input: Option<String>,
    /// File holding the input values
    #[arg(long, value_name = "PATH", required_unless_present = "input")]
    pub input_file: Option<PathBuf>,
    /// Number of trees to evaluate (default: all)
    #[arg(short = 'n', long, value_name = "N")]
    pub trees: Option<usize>,
    /// Also print the input encoded for this backend
    #[arg(long, value_name = "BACKEND")]
    pub emit_input: Option<String>,
    /// Also print the input as the runner's argument list for this backend
    #[arg(long, value_name = "BACKEND")]
    pub emit_fields: Option<String>,
    /// Print each tree's contribution
    #[arg(long)]
    pub contributions: bool,
    /// Extra directory searched for <backend>/backend.toml
    #[arg(long = "backend-dir", value_name = "DIR")]
    pub backend_dirs: Vec<PathBuf>,
    #[command(flatten)]
    pub features: FeatureArgs,
}

pub fn cmd_predict(args: PredictArgs) {
    let ensemble = load_ensemble(&args.model, &args.features);

    let text = match (&args.input, &args.input_file) {
        (Some(values), _) => values.clone(),
        (None, Some(path)) => match std::fs::read_to_string(path) {
            Ok(t) => t.trim().trim_start_matches('[').trim_end_matches(']').to_string(),
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        (None, None) => {
            eprintln!("error: give --input or --input-file");
            process::exit(1);
        }
    };
    let mut values = match parse_values(&text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let expected = ensemble.feature_count();
    if values.len() > expected {
        eprintln!(
            "error: got {} input values, the model has {} features",
            values.len(),
            expected
        );
        process::exit(1);
    }
    if values.len() < expected {
        let padding = Diagnostic::warning(format!(
            "got {} input values, padding to {} with zeros",
            values.len(),
            expected
        ))
        .with_help(format!("emitted code takes exactly {} inputs", expected));
        render_diagnostics(&[padding], "forestc", "");
        values.resize(expected, 0.0);
    }

    if let Some(name) = &args.emit_input {
        let backend = or_exit(Backend::resolve(name, &args.backend_dirs));
        println!("{}", or_exit(encode_inputs(&values, &backend.descriptor)));
    }
    if let Some(name) = &args.emit_fields {
        let backend = or_exit(Backend::resolve(name, &args.backend_dirs));
        println!("{}", or_exit(encode_field_list(&values, &backend.descriptor)));
    }

    let inputs: Vec<Fixed> = values.iter().map(|&v| Fixed::from_f64(v)).collect();
    let limit = args.trees.unwrap_or(ensemble.len());
    let total = or_exit(eval::predict(&ensemble, &inputs, limit));

    if args.contributions {
        let parts = or_exit(eval::contributions(&ensemble, &inputs));
        for (i, part) in parts.iter().take(limit).enumerate() {
            eprintln!("  tree {:>4}: {:>22} ({:.10})", i, part.raw(), dequantize(*part));
        }
    }
    println!("{}", total);
    eprintln!("prediction: {:.10} ({} trees)", dequantize(total), limit);
}
