use std::path::PathBuf;

use clap::Args;

use forestc::backend::builtin_names;
use forestc::Backend;

use super::or_exit;

#[derive(Args)]
pub struct BackendsArgs {
    /// Show one backend's descriptor instead of listing
    pub name: Option<String>,
    /// Extra directory searched for <backend>/backend.toml
    #[arg(long = "backend-dir", value_name = "DIR")]
    pub backend_dirs: Vec<PathBuf>,
}

pub fn cmd_backends(args: BackendsArgs) {
    let Some(name) = args.name else {
        println!("Built-in backends:");
        for name in builtin_names() {
            let backend = or_exit(Backend::resolve(name, &[]));
            println!(
                "  {:<10} {:<10} {}",
                name, backend.descriptor.display_name, backend.descriptor.file_extension
            );
        }
        return;
    };

    let backend = or_exit(Backend::resolve(&name, &args.backend_dirs));
    let d = &backend.descriptor;
    println!("{} ({})", d.display_name, d.name);
    println!("  extension:   {}", d.file_extension);
    println!("  fixed type:  {}", d.fixed_type);
    println!("  accumulator: {}", d.accumulator);
    println!("  comment:     {}", d.syntax.comment);
    println!(
        "  indent:      {:?} x{}, base depth {}",
        d.syntax.indent, d.syntax.indent_width, d.syntax.base_depth
    );
    for (spec, _) in &backend.templates.artifacts {
        println!("  artifact:    {} -> {}", spec.name, spec.file);
    }
}
