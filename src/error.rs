//! Conversion errors.
//!
//! None of these are transient: each one is an input-data or configuration
//! defect and aborts the whole conversion run.

use std::ops::Range;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    /// Structurally invalid raw tree dump.
    #[error("malformed tree {tree}{}: {reason}", node_suffix(.node))]
    MalformedTree {
        tree: usize,
        node: Option<u32>,
        reason: String,
    },

    /// Feature reference outside the declared feature universe.
    #[error("unknown feature '{feature}' in tree {tree}, node {node} (feature count is {feature_count})")]
    UnknownFeature {
        feature: String,
        tree: usize,
        node: u32,
        feature_count: usize,
    },

    /// A template uses a placeholder nothing supplies.
    #[error("unresolved placeholder '{{{placeholder}}}' in template '{template}'")]
    UnresolvedPlaceholder {
        template: String,
        placeholder: String,
    },

    /// Requested tree count is zero or larger than the ensemble.
    #[error("invalid tree limit {requested} (ensemble has {available} trees)")]
    InvalidTreeLimit { requested: usize, available: usize },

    #[error("duplicate feature name '{name}' at indices {first} and {second}")]
    DuplicateFeature {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("invalid backend descriptor '{backend}': {reason}")]
    InvalidDescriptor { backend: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unparseable TOML or JSON; `span` is a byte range into the file.
    #[error("{}: {message}", .path.display())]
    Config {
        path: PathBuf,
        message: String,
        span: Option<Range<usize>>,
    },
}

fn node_suffix(node: &Option<u32>) -> String {
    match node {
        Some(id) => format!(", node {}", id),
        None => String::new(),
    }
}

impl ConvertError {
    pub(crate) fn malformed(tree: usize, node: Option<u32>, reason: impl Into<String>) -> Self {
        ConvertError::MalformedTree {
            tree,
            node,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn toml(path: impl Into<PathBuf>, e: toml::de::Error) -> Self {
        ConvertError::Config {
            path: path.into(),
            message: e.message().to_string(),
            span: e.span(),
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: &str, e: serde_json::Error) -> Self {
        let span = line_col_offset(source, e.line(), e.column()).map(|at| at..at + 1);
        ConvertError::Config {
            path: path.into(),
            message: e.to_string(),
            span,
        }
    }

    /// Byte range into the offending file, when one is known.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            ConvertError::Config { span, .. } => span.clone(),
            _ => None,
        }
    }
}

/// serde_json reports 1-based line/column; ariadne wants byte offsets.
fn line_col_offset(source: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let mut offset = 0;
    for (i, l) in source.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            let col = column.saturating_sub(1).min(l.len());
            return Some(offset + col);
        }
        offset += l.len();
    }
    None
}

pub type Result<T> = std::result::Result<T, ConvertError>;
