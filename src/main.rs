use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(
    name = "forestc",
    version,
    about = "Compile gradient-boosted tree ensembles to fixed-point source code"
)]
struct Cli {
    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one model dump for one backend
    Convert(cli::convert::ConvertArgs),
    /// Convert a forest.toml project for all its backends and tree limits
    Build(cli::build::BuildArgs),
    /// Show trees, statistics and the feature map of a model dump
    Inspect(cli::inspect::InspectArgs),
    /// Evaluate a model dump on one input in fixed point
    Predict(cli::predict::PredictArgs),
    /// List backends or show one backend's descriptor
    Backends(cli::backends::BackendsArgs),
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "forestc=info",
        1 => "forestc=debug",
        _ => "forestc=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let opts = Cli::parse();
    init_logging(opts.verbose);

    match opts.command {
        Command::Convert(args) => cli::convert::cmd_convert(args),
        Command::Build(args) => cli::build::cmd_build(args),
        Command::Inspect(args) => cli::inspect::cmd_inspect(args),
        Command::Predict(args) => cli::predict::cmd_predict(args),
        Command::Backends(args) => cli::backends::cmd_backends(args),
    }
}
