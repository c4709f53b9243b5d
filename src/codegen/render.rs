//! Template Renderer: one IR tree to target text.
//!
//! Everything target-specific comes from the [`BackendDescriptor`]; this
//! module only walks the tree and fills placeholders.

use tracing::debug;

use crate::codegen::template::Bindings;
use crate::config::backend::{Backend, BackendDescriptor};
use crate::error::Result;
use crate::fixed::Fixed;
use crate::ir::{Node, NodeId, Tree};

/// Bindings for the `literal` and `input` templates.
///
/// Zero counts as positive, so `positive` and `sign` agree with
/// sign/magnitude encodings that have a single zero.
pub fn literal_bindings(value: Fixed) -> Bindings<'static> {
    let negative = value.is_negative();
    Bindings::new()
        .with("value", value.raw().to_string())
        .with("abs", value.magnitude().to_string())
        .with("sign", if negative { "-" } else { "" })
        .with("positive", if negative { "false" } else { "true" })
        .with("bit", if negative { "0" } else { "1" })
}

pub fn render_literal(descriptor: &BackendDescriptor, value: Fixed) -> Result<String> {
    descriptor.literal.render(&literal_bindings(value))
}

/// Encode an input vector as the JSON array the backend's prover or runner
/// reads: each value is quantized, then rendered with the `input` template.
pub fn encode_inputs(values: &[f64], descriptor: &BackendDescriptor) -> Result<String> {
    let encoded = values
        .iter()
        .map(|&v| descriptor.input.render(&literal_bindings(Fixed::from_f64(v))))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("[{}]", encoded.join(", ")))
}

/// Encode an input vector as the argument list of the backend's runner:
/// each value through the `field` template, joined by `", "`, then
/// wrapped by `field_list`.
pub fn encode_field_list(values: &[f64], descriptor: &BackendDescriptor) -> Result<String> {
    let items = values
        .iter()
        .map(|&v| descriptor.field.render(&literal_bindings(Fixed::from_f64(v))))
        .collect::<Result<Vec<_>>>()?;
    descriptor
        .field_list
        .render(&Bindings::new().with("items", items.join(", ")))
}

/// Pending work while walking a tree.
enum Step {
    Node(NodeId, usize),
    Else(usize),
    End(usize),
}

/// Collects `(depth, text)` lines for one tree.
struct LogicEmitter<'a> {
    descriptor: &'a BackendDescriptor,
    lines: Vec<(usize, String)>,
}

impl<'a> LogicEmitter<'a> {
    fn new(descriptor: &'a BackendDescriptor) -> Self {
        LogicEmitter {
            descriptor,
            lines: Vec::new(),
        }
    }

    fn emit(&mut self, depth: usize, text: String) {
        if !text.is_empty() {
            self.lines.push((depth, text));
        }
    }

    /// Walk `tree` from the root with an explicit stack of pending steps.
    fn tree(&mut self, tree: &Tree) -> Result<()> {
        let d = self.descriptor;
        let mut steps = vec![Step::Node(NodeId::ROOT, 0)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Else(depth) => self.emit(depth, d.else_.render(&Bindings::new())?),
                Step::End(depth) => self.emit(depth, d.end.render(&Bindings::new())?),
                Step::Node(id, depth) => match tree.node(id) {
                    Node::Split {
                        feature,
                        threshold,
                        yes,
                        no,
                    } => {
                        let lhs = d
                            .feature
                            .render(&Bindings::new().with("index", feature.index.to_string()))?;
                        let rhs = render_literal(d, *threshold)?;
                        let cond = d
                            .le
                            .render(&Bindings::new().with("lhs", lhs).with("rhs", rhs))?;
                        self.emit(depth, d.if_open.render(&Bindings::new().with("cond", cond))?);
                        steps.push(Step::End(depth));
                        steps.push(Step::Node(*no, depth + 1));
                        steps.push(Step::Else(depth));
                        steps.push(Step::Node(*yes, depth + 1));
                    }
                    Node::Leaf { value } => {
                        let value = render_literal(d, *value)?;
                        let accumulate = d.add.render(
                            &Bindings::new()
                                .with("lhs", d.accumulator.as_str())
                                .with("rhs", value.as_str()),
                        )?;
                        let line = d.leaf.render(
                            &Bindings::new()
                                .with("value", value)
                                .with("accumulate", accumulate)
                                .with("accumulator", d.accumulator.as_str()),
                        )?;
                        self.emit(depth, line);
                    }
                },
            }
        }
        Ok(())
    }

    /// First line bare, the rest indented at `base_depth + depth`, so the
    /// block can follow text already on the template's line.
    fn finish(self) -> String {
        let unit = self.descriptor.syntax.indent_unit();
        let base = self.descriptor.syntax.base_depth;
        let mut out = String::new();
        for (i, (depth, text)) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
                out.push_str(&unit.repeat(base + depth));
            }
            out.push_str(text);
        }
        out
    }
}

/// Conditional logic of one tree, without the per-tree template around it.
pub fn render_tree_logic(tree: &Tree, descriptor: &BackendDescriptor) -> Result<String> {
    let mut emitter = LogicEmitter::new(descriptor);
    emitter.tree(tree)?;
    Ok(emitter.finish())
}

/// One tree through the backend's per-tree template. Trailing newlines
/// are dropped; the assembler decides the separation between trees.
pub fn render_tree(
    index: usize,
    tree: &Tree,
    backend: &Backend,
    globals: &Bindings,
) -> Result<String> {
    let logic = render_tree_logic(tree, &backend.descriptor)?;
    let mut bindings = globals.clone();
    bindings.set("tree_index", index.to_string());
    bindings.set("tree_logic", logic);
    let text = backend.templates.tree.render(&bindings)?;
    debug!(backend = backend.name(), tree = index, nodes = tree.len(), "rendered tree");
    Ok(text.trim_end_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{build_tree, FeatureUniverse};
    use crate::model::RawNode;

    fn rust() -> Backend {
        Backend::builtin("rust").unwrap().unwrap()
    }

    fn zokrates() -> Backend {
        Backend::builtin("zokrates").unwrap().unwrap()
    }

    fn stump() -> Tree {
        build_tree(
            0,
            &[
                RawNode::split(0, "f5", 0.3, 1, 2),
                RawNode::leaf(1, -0.1),
                RawNode::leaf(2, 0.2),
            ],
            &FeatureUniverse::indexed(116),
        )
        .unwrap()
    }

    #[test]
    fn test_literal_bindings() {
        let b = literal_bindings(Fixed(-1_000_000_000));
        assert_eq!(b.get("value"), Some("-1000000000"));
        assert_eq!(b.get("abs"), Some("1000000000"));
        assert_eq!(b.get("sign"), Some("-"));
        assert_eq!(b.get("positive"), Some("false"));

        let zero = literal_bindings(Fixed::ZERO);
        assert_eq!(zero.get("sign"), Some(""));
        assert_eq!(zero.get("positive"), Some("true"));
        assert_eq!(zero.get("bit"), Some("1"));
        assert_eq!(b.get("bit"), Some("0"));
    }

    #[test]
    fn test_rust_stump_logic() {
        let text = render_tree_logic(&stump(), &rust().descriptor).unwrap();
        assert_eq!(
            text,
            "if fixed_le(f[5], 3000000000) {\n\
             \x20       y = fixed_add(y, -1000000000);\n\
             \x20   } else {\n\
             \x20       y = fixed_add(y, 2000000000);\n\
             \x20   }"
        );
    }

    #[test]
    fn test_zokrates_stump_logic() {
        let text = render_tree_logic(&stump(), &zokrates().descriptor).unwrap();
        insta::assert_snapshot!(text, @r###"
        if i64_le(f[5], i64 { sgn: true, v: 3000000000 }) {
                i64 { sgn: false, v: 1000000000 }
            } else {
                i64 { sgn: true, v: 2000000000 }
            }
        "###);
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = build_tree(0, &[RawNode::leaf(0, 0.5)], &FeatureUniverse::indexed(1)).unwrap();
        assert_eq!(
            render_tree_logic(&tree, &rust().descriptor).unwrap(),
            "y = fixed_add(y, 5000000000);"
        );
        assert_eq!(
            render_tree_logic(&tree, &zokrates().descriptor).unwrap(),
            "i64 { sgn: true, v: 5000000000 }"
        );
    }

    #[test]
    fn test_render_tree_uses_template() {
        let backend = zokrates();
        let globals = Bindings::new().with("comment", "//");
        let text = render_tree(3, &stump(), &backend, &globals).unwrap();
        assert!(text.starts_with("    // Tree 3\n    i64 t3 = if i64_le("));
        assert!(text.ends_with("    };\n    y = i64_add(y, t3);"));
    }

    #[test]
    fn test_encode_inputs() {
        assert_eq!(
            encode_inputs(&[0.3, -0.1, 0.0], &rust().descriptor).unwrap(),
            "[3000000000, -1000000000, 0]"
        );
        assert_eq!(
            encode_inputs(&[-0.1], &zokrates().descriptor).unwrap(),
            r#"[{"sgn":false,"v":"1000000000"}]"#
        );
    }

    #[test]
    fn test_encode_field_list() {
        assert_eq!(
            encode_field_list(&[0.3, -0.1], &rust().descriptor).unwrap(),
            "vec![3000000000, -1000000000]"
        );
        assert_eq!(
            encode_field_list(&[0.3, -0.1, 0.0], &zokrates().descriptor).unwrap(),
            r#""1", "3000000000", "0", "1000000000", "1", "0""#
        );
    }
}
