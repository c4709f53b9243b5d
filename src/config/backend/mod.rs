//! Backend descriptors: everything language-specific, as data.
//!
//! A backend is a directory holding `backend.toml` plus its templates:
//!
//! ```text
//! backends/rust/
//!   backend.toml
//!   header.template
//!   tree.template
//!   main.template
//! ```
//!
//! The renderer never asks which language it is emitting. Adding a target
//! means adding a directory like the one above.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::codegen::template::Template;
use crate::error::{ConvertError, Result};

mod builtin;

pub use builtin::builtin_names;

/// Placeholder vocabularies, per template kind.
pub mod vocab {
    /// Available in every file template. None of these depend on the tree
    /// limit, so the text before the trees is the same for every limit.
    pub const GLOBAL: &[&str] = &[
        "num_features",
        "precision",
        "backend",
        "comment",
        "fixed_type",
    ];
    /// Per-tree template: GLOBAL plus these.
    pub const TREE: &[&str] = &["tree_index", "tree_logic"];
    /// Main-entry template: GLOBAL plus these.
    pub const MAIN: &[&str] = &["tree_code"];

    pub const LITERAL: &[&str] = &["value", "abs", "sign", "positive", "bit"];
    pub const FIELD_LIST: &[&str] = &["items"];
    pub const FEATURE: &[&str] = &["index"];
    pub const BINARY: &[&str] = &["lhs", "rhs"];
    pub const IF_OPEN: &[&str] = &["cond"];
    pub const LEAF: &[&str] = &["value", "accumulate", "accumulator"];
    pub const NONE: &[&str] = &[];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    #[default]
    Spaces,
    Tabs,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Syntax {
    /// Line-comment marker (e.g. "//").
    pub comment: String,
    #[serde(default)]
    pub indent: IndentStyle,
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
    /// Indentation depth of the outermost line of a tree's logic.
    #[serde(default = "default_base_depth")]
    pub base_depth: usize,
}

fn default_indent_width() -> usize {
    4
}

fn default_base_depth() -> usize {
    1
}

impl Syntax {
    /// One indentation level.
    pub fn indent_unit(&self) -> String {
        match self.indent {
            IndentStyle::Spaces => " ".repeat(self.indent_width),
            IndentStyle::Tabs => "\t".repeat(self.indent_width),
        }
    }
}

// ─── backend.toml layout ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorFile {
    backend: BackendSection,
    syntax: Syntax,
    fixed_point: FixedPointSection,
    operators: OperatorSection,
    control: ControlSection,
    accumulator: AccumulatorSection,
    #[serde(default)]
    templates: TemplateFiles,
    #[serde(default)]
    artifacts: Vec<ArtifactSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BackendSection {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    file_extension: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixedPointSection {
    type_name: String,
    literal: String,
    /// Encoding of one input value for the target's prover or runner.
    /// Defaults to `literal`.
    #[serde(default)]
    input: Option<String>,
    /// One input value as command-line argument(s) of the runner.
    /// Defaults to `literal`.
    #[serde(default)]
    field: Option<String>,
    /// Wraps the comma-joined `field` values. Defaults to `{items}`.
    #[serde(default)]
    field_list: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OperatorSection {
    feature: String,
    le: String,
    add: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ControlSection {
    if_open: String,
    #[serde(rename = "else")]
    else_: String,
    end: String,
    leaf: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AccumulatorSection {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateFiles {
    #[serde(default = "default_header")]
    header: String,
    #[serde(default = "default_tree")]
    tree: String,
    #[serde(default = "default_main")]
    main: String,
}

fn default_header() -> String {
    "header.template".to_string()
}

fn default_tree() -> String {
    "tree.template".to_string()
}

fn default_main() -> String {
    "main.template".to_string()
}

impl Default for TemplateFiles {
    fn default() -> Self {
        TemplateFiles {
            header: default_header(),
            tree: default_tree(),
            main: default_main(),
        }
    }
}

/// An auxiliary output rendered next to the main source file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    pub name: String,
    /// Output file name.
    pub file: String,
    /// Template file name inside the backend directory.
    pub template: String,
}

// ─── In-memory records ─────────────────────────────────────────────

/// Syntax and operator conventions of one target language. Immutable once
/// loaded.
#[derive(Clone, Debug)]
pub struct BackendDescriptor {
    /// Short identifier used in CLI and file names (e.g. "rust").
    pub name: String,
    /// Human-readable name (e.g. "Rust").
    pub display_name: String,
    /// Extension of the emitted source file, with the dot.
    pub file_extension: String,
    pub syntax: Syntax,
    /// Fixed-point type as spelled in the target.
    pub fixed_type: String,
    /// Name of the running total in emitted code.
    pub accumulator: String,
    pub literal: Template,
    pub input: Template,
    pub field: Template,
    pub field_list: Template,
    pub feature: Template,
    pub le: Template,
    pub add: Template,
    pub if_open: Template,
    pub else_: Template,
    pub end: Template,
    pub leaf: Template,
}

/// Header, per-tree body, main entry, and auxiliary templates.
#[derive(Clone, Debug)]
pub struct TemplateSet {
    pub header: Template,
    pub tree: Template,
    pub main: Template,
    pub artifacts: Vec<(ArtifactSpec, Template)>,
}

/// A descriptor with its templates: everything needed to emit one target.
#[derive(Clone, Debug)]
pub struct Backend {
    pub descriptor: BackendDescriptor,
    pub templates: TemplateSet,
}

/// A single file or directory name inside its parent: no separators, no
/// `..`, not hidden.
fn is_plain_name(name: &str) -> bool {
    !(name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains(':')
        || name.contains("..")
        || name.starts_with('.'))
}

fn checked(name: &str, text: &str, vocabulary: &[&str]) -> Result<Template> {
    let t = Template::parse(name, text);
    t.check(vocabulary)?;
    Ok(t)
}

fn with_global(extra: &[&'static str]) -> Vec<&'static str> {
    vocab::GLOBAL.iter().chain(extra).copied().collect()
}

impl BackendDescriptor {
    fn from_file(file: DescriptorFile, path: &Path) -> Result<Self> {
        let backend = file.backend.name.clone();
        let invalid = |reason: &str| ConvertError::InvalidDescriptor {
            backend: backend.clone(),
            reason: format!("{}: {}", path.display(), reason),
        };

        if backend.is_empty() {
            return Err(invalid("backend.name must not be empty"));
        }
        if !file.backend.file_extension.starts_with('.') {
            return Err(invalid("backend.file_extension must start with '.'"));
        }
        if file.syntax.indent_width == 0 {
            return Err(invalid("syntax.indent_width must be > 0"));
        }
        if file.accumulator.name.is_empty() {
            return Err(invalid("accumulator.name must not be empty"));
        }

        Ok(BackendDescriptor {
            display_name: file
                .backend
                .display_name
                .unwrap_or_else(|| backend.clone()),
            file_extension: file.backend.file_extension,
            syntax: file.syntax,
            fixed_type: file.fixed_point.type_name,
            accumulator: file.accumulator.name,
            literal: checked("fixed_point.literal", &file.fixed_point.literal, vocab::LITERAL)?,
            input: checked(
                "fixed_point.input",
                file.fixed_point
                    .input
                    .as_deref()
                    .unwrap_or(&file.fixed_point.literal),
                vocab::LITERAL,
            )?,
            field: checked(
                "fixed_point.field",
                file.fixed_point
                    .field
                    .as_deref()
                    .unwrap_or(&file.fixed_point.literal),
                vocab::LITERAL,
            )?,
            field_list: checked(
                "fixed_point.field_list",
                file.fixed_point.field_list.as_deref().unwrap_or("{items}"),
                vocab::FIELD_LIST,
            )?,
            feature: checked("operators.feature", &file.operators.feature, vocab::FEATURE)?,
            le: checked("operators.le", &file.operators.le, vocab::BINARY)?,
            add: checked("operators.add", &file.operators.add, vocab::BINARY)?,
            if_open: checked("control.if_open", &file.control.if_open, vocab::IF_OPEN)?,
            else_: checked("control.else", &file.control.else_, vocab::NONE)?,
            end: checked("control.end", &file.control.end, vocab::NONE)?,
            leaf: checked("control.leaf", &file.control.leaf, vocab::LEAF)?,
            name: backend,
        })
    }
}

impl Backend {
    /// Build a backend from `backend.toml`, reading the templates it names
    /// through `read`. `origin` locates the files in error messages.
    fn assemble(origin: &Path, read: impl Fn(&str) -> Result<String>) -> Result<Self> {
        let toml_path = origin.join("backend.toml");
        let content = read("backend.toml")?;
        let file: DescriptorFile =
            toml::from_str(&content).map_err(|e| ConvertError::toml(&toml_path, e))?;

        let files = &file.templates;
        let named = [
            ("templates.header", files.header.as_str()),
            ("templates.tree", files.tree.as_str()),
            ("templates.main", files.main.as_str()),
        ]
        .into_iter()
        .chain(file.artifacts.iter().flat_map(|a| {
            [
                ("artifacts.file", a.file.as_str()),
                ("artifacts.template", a.template.as_str()),
            ]
        }));
        for (field, value) in named {
            if !is_plain_name(value) {
                return Err(ConvertError::InvalidDescriptor {
                    backend: file.backend.name.clone(),
                    reason: format!(
                        "{}: {} '{}' must be a plain file name",
                        toml_path.display(),
                        field,
                        value
                    ),
                });
            }
        }

        let header = checked("header", &read(&files.header)?, vocab::GLOBAL)?;
        let tree = checked("tree", &read(&files.tree)?, &with_global(vocab::TREE))?;
        let main = checked("main", &read(&files.main)?, &with_global(vocab::MAIN))?;

        let mut artifacts = Vec::with_capacity(file.artifacts.len());
        for spec in &file.artifacts {
            let t = checked(&spec.name, &read(&spec.template)?, vocab::GLOBAL)?;
            artifacts.push((spec.clone(), t));
        }

        let descriptor = BackendDescriptor::from_file(file, &toml_path)?;
        debug!(backend = %descriptor.name, origin = %origin.display(), "loaded backend");
        Ok(Backend {
            descriptor,
            templates: TemplateSet {
                header,
                tree,
                main,
                artifacts,
            },
        })
    }

    /// Load a backend directory.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::assemble(dir, |file| {
            let path = dir.join(file);
            std::fs::read_to_string(&path).map_err(|e| ConvertError::io(&path, e))
        })
    }

    /// One of the backends compiled into the binary.
    pub fn builtin(name: &str) -> Option<Result<Self>> {
        let files = builtin::files(name)?;
        let origin = PathBuf::from(format!("<builtin>/{}", name));
        Some(Self::assemble(&origin, |file| {
            files
                .iter()
                .find(|(f, _)| *f == file)
                .map(|(_, text)| text.to_string())
                .ok_or_else(|| {
                    ConvertError::io(
                        origin.join(file),
                        std::io::Error::new(std::io::ErrorKind::NotFound, "not a built-in file"),
                    )
                })
        }))
    }

    /// Resolve a backend by name.
    ///
    /// Looks in `backend_dirs` first (`<dir>/<name>/backend.toml`), then at
    /// the built-in backends, then for `backends/<name>/` next to the binary
    /// or in the working directory.
    pub fn resolve(name: &str, backend_dirs: &[PathBuf]) -> Result<Self> {
        if !is_plain_name(name) {
            return Err(ConvertError::InvalidDescriptor {
                backend: name.to_string(),
                reason: "invalid backend name".to_string(),
            });
        }

        for dir in backend_dirs {
            let candidate = dir.join(name);
            if candidate.join("backend.toml").exists() {
                return Self::load(&candidate);
            }
        }

        if let Some(backend) = Self::builtin(name) {
            return backend;
        }

        let relative = PathBuf::from("backends").join(name);
        let mut roots: Vec<PathBuf> = Vec::new();
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                roots.extend(dir.ancestors().take(3).map(Path::to_path_buf));
            }
        }
        roots.push(PathBuf::from("."));
        for root in roots {
            let candidate = root.join(&relative);
            if candidate.join("backend.toml").exists() {
                return Self::load(&candidate);
            }
        }

        warn!(backend = name, "backend not found");
        Err(ConvertError::InvalidDescriptor {
            backend: name.to_string(),
            reason: format!(
                "unknown backend (looked for '{}'; built-in: {})",
                relative.join("backend.toml").display(),
                builtin_names().join(", ")
            ),
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}
