//! Code Assembler: header, per-tree fragments and the main entry stitched
//! into one source file.
//!
//! Layout of every emission:
//!
//! ```text
//! header
//! <blank line>
//! main up to {tree_code}
//! tree 0 fragment
//! <blank line>
//! tree 1 fragment
//! ...
//! rest of main (the footer)
//! ```
//!
//! Nothing before the footer depends on the tree limit, so the emission
//! for `k` trees without its footer is a prefix of the one for `k + 1`.

use tracing::info;

use crate::codegen::render::render_tree;
use crate::codegen::template::Bindings;
use crate::config::backend::Backend;
use crate::error::{ConvertError, Result};
use crate::fixed::PRECISION_MULTIPLIER;
use crate::ir::TreeEnsemble;

/// Separator between two tree fragments inside `{tree_code}`.
const TREE_SEPARATOR: &str = "\n\n";

/// An auxiliary file rendered from a backend's `[[artifacts]]` entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub name: String,
    pub file: String,
    pub contents: String,
}

/// One finished source file for one backend and tree limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Emission {
    pub backend: String,
    pub tree_limit: usize,
    /// File extension, with the dot.
    pub extension: String,
    pub source: String,
    /// Byte offset where the footer starts.
    pub body_end: usize,
    pub artifacts: Vec<RenderedArtifact>,
}

impl Emission {
    /// Everything up to and including the last tree fragment.
    pub fn body(&self) -> &str {
        &self.source[..self.body_end]
    }

    pub fn footer(&self) -> &str {
        &self.source[self.body_end..]
    }

    /// `<stem><extension>`.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}{}", stem, self.extension)
    }
}

/// Values every file template may use.
pub fn global_bindings(backend: &Backend, feature_count: usize) -> Bindings<'static> {
    let d = &backend.descriptor;
    Bindings::new()
        .with("num_features", feature_count.to_string())
        .with("precision", PRECISION_MULTIPLIER.to_string())
        .with("backend", d.name.as_str())
        .with("comment", d.syntax.comment.as_str())
        .with("fixed_type", d.fixed_type.as_str())
}

/// Emit the first `tree_limit` trees of `ensemble` for `backend`.
///
/// The limit is checked before anything is rendered.
pub fn assemble(ensemble: &TreeEnsemble, backend: &Backend, tree_limit: usize) -> Result<Emission> {
    if tree_limit == 0 || tree_limit > ensemble.len() {
        return Err(ConvertError::InvalidTreeLimit {
            requested: tree_limit,
            available: ensemble.len(),
        });
    }

    let globals = global_bindings(backend, ensemble.feature_count());
    let templates = &backend.templates;

    let fragments = ensemble.trees[..tree_limit]
        .iter()
        .enumerate()
        .map(|(i, tree)| render_tree(i, tree, backend, &globals))
        .collect::<Result<Vec<_>>>()?;
    let tree_code = fragments.join(TREE_SEPARATOR);

    let header = templates.header.render(&globals)?;
    let mut main_bindings = globals.clone();
    main_bindings.set("tree_code", tree_code.as_str());
    let main = templates.main.render(&main_bindings)?;

    let mut source = String::with_capacity(header.len() + main.len() + 1);
    source.push_str(&header);
    source.push('\n');
    let main_start = source.len();
    source.push_str(&main);

    // Without {tree_code} the trees never appear and the whole main is footer.
    let body_end = match templates.main.render_prefix("tree_code", &main_bindings)? {
        Some(prefix) => main_start + prefix.len() + tree_code.len(),
        None => main_start,
    };

    let mut artifacts = Vec::with_capacity(templates.artifacts.len());
    for (spec, template) in &templates.artifacts {
        artifacts.push(RenderedArtifact {
            name: spec.name.clone(),
            file: spec.file.clone(),
            contents: template.render(&globals)?,
        });
    }

    info!(
        backend = backend.name(),
        trees = tree_limit,
        bytes = source.len(),
        "assembled source"
    );
    Ok(Emission {
        backend: backend.descriptor.name.clone(),
        tree_limit,
        extension: backend.descriptor.file_extension.clone(),
        source,
        body_end,
        artifacts,
    })
}
