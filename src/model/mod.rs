//! Raw tree dumps: the boundary between a model loader and the IR builder.
//!
//! The builder consumes `RawNode`s. This module turns the JSON forms an
//! XGBoost booster dumps into that flat shape:
//!
//! - `booster.get_dump(dump_format="json")` serialized as a JSON array of
//!   strings, each string one nested tree;
//! - `booster.dump_model(path, dump_format="json")`, a JSON array of
//!   nested trees (`nodeid`, `split`, `split_condition`, `yes`, `no`,
//!   `leaf`, `children`);
//! - an array of flat node lists, one list per tree.

pub mod cache;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConvertError, Result};

pub use cache::FeatureCache;

/// One node of a raw per-tree dump. Which optional fields are present
/// decides whether it is a split or a leaf; the builder validates that.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf: Option<f64>,
}

impl RawNode {
    pub fn split(id: u32, feature: &str, threshold: f64, yes: u32, no: u32) -> Self {
        RawNode {
            id,
            feature: Some(feature.to_string()),
            threshold: Some(threshold),
            yes: Some(yes),
            no: Some(no),
            leaf: None,
        }
    }

    pub fn leaf(id: u32, value: f64) -> Self {
        RawNode {
            id,
            feature: None,
            threshold: None,
            yes: None,
            no: None,
            leaf: Some(value),
        }
    }
}

/// XGBoost writes `split` as a name, or as a bare index in some versions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SplitName {
    Name(String),
    Index(u32),
}

impl SplitName {
    fn into_name(self) -> String {
        match self {
            SplitName::Name(n) => n,
            SplitName::Index(i) => format!("f{}", i),
        }
    }
}

/// Nested XGBoost JSON node. `missing` and the gain/cover statistics are
/// accepted and ignored.
#[derive(Debug, Deserialize)]
struct XgbNode {
    nodeid: u32,
    #[serde(default)]
    split: Option<SplitName>,
    #[serde(default)]
    split_condition: Option<f64>,
    #[serde(default)]
    yes: Option<u32>,
    #[serde(default)]
    no: Option<u32>,
    #[serde(default)]
    leaf: Option<f64>,
    #[serde(default)]
    children: Vec<XgbNode>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TreeDump {
    Flat(Vec<RawNode>),
    Nested(XgbNode),
    Encoded(String),
}

fn flatten(root: XgbNode, out: &mut Vec<RawNode>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(RawNode {
            id: node.nodeid,
            feature: node.split.map(SplitName::into_name),
            threshold: node.split_condition,
            yes: node.yes,
            no: node.no,
            leaf: node.leaf,
        });
        stack.extend(node.children.into_iter().rev());
    }
}

/// Parse a model dump from JSON text. `path` is only used for error reports.
pub fn parse_dump(source: &str, path: &Path) -> Result<Vec<Vec<RawNode>>> {
    let dumps: Vec<TreeDump> =
        serde_json::from_str(source).map_err(|e| ConvertError::json(path, source, e))?;

    let mut trees = Vec::with_capacity(dumps.len());
    for dump in dumps {
        let nodes = match dump {
            TreeDump::Flat(nodes) => nodes,
            TreeDump::Nested(root) => {
                let mut nodes = Vec::new();
                flatten(root, &mut nodes);
                nodes
            }
            TreeDump::Encoded(text) => {
                let root: XgbNode =
                    serde_json::from_str(&text).map_err(|e| ConvertError::json(path, &text, e))?;
                let mut nodes = Vec::new();
                flatten(root, &mut nodes);
                nodes
            }
        };
        trees.push(nodes);
    }
    debug!(path = %path.display(), trees = trees.len(), "parsed model dump");
    Ok(trees)
}

/// Read and parse a model dump file.
pub fn load_dump(path: &Path) -> Result<Vec<Vec<RawNode>>> {
    let source = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    parse_dump(&source, path)
}

/// Read a feature-name list: a JSON array of strings.
pub fn load_feature_names(path: &Path) -> Result<Vec<String>> {
    let source = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    serde_json::from_str(&source).map_err(|e| ConvertError::json(path, &source, e))
}
