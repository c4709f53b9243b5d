//! Backends compiled into the binary from `backends/`.

type Files = &'static [(&'static str, &'static str)];

const RUST: Files = &[
    ("backend.toml", include_str!("../../../backends/rust/backend.toml")),
    ("header.template", include_str!("../../../backends/rust/header.template")),
    ("tree.template", include_str!("../../../backends/rust/tree.template")),
    ("main.template", include_str!("../../../backends/rust/main.template")),
];

const ZOKRATES: Files = &[
    ("backend.toml", include_str!("../../../backends/zokrates/backend.toml")),
    ("header.template", include_str!("../../../backends/zokrates/header.template")),
    ("tree.template", include_str!("../../../backends/zokrates/tree.template")),
    ("main.template", include_str!("../../../backends/zokrates/main.template")),
    (
        "fixed_i64.template",
        include_str!("../../../backends/zokrates/fixed_i64.template"),
    ),
];

const BUILTINS: &[(&str, Files)] = &[("rust", RUST), ("zokrates", ZOKRATES)];

pub(super) fn files(name: &str) -> Option<Files> {
    BUILTINS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, files)| *files)
}

/// Names of the built-in backends.
pub fn builtin_names() -> Vec<&'static str> {
    BUILTINS.iter().map(|(n, _)| *n).collect()
}
