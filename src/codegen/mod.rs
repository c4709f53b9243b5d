//! Source emission: templates, per-tree rendering, assembly and the
//! auxiliary listings.

pub mod artifacts;
pub mod assemble;
pub mod render;
pub mod template;

pub use assemble::{assemble, Emission, RenderedArtifact};
pub use render::{encode_field_list, encode_inputs, render_tree, render_tree_logic};
pub use template::{Bindings, Template};
