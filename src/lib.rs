//! Compile gradient-boosted tree ensembles to fixed-point source code.
//!
//! ```text
//! model dump ─▶ ir::builder ─▶ TreeEnsemble ─▶ codegen::render ─▶ codegen::assemble ─▶ source
//!                  │    │                           ▲
//!          fixed::quantize  ir::features    config::backend (descriptor + templates)
//! ```

pub mod api;
pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod fixed;
pub mod ir;
pub mod model;

// Re-exports keep `forestc::X` paths short for the CLI and tests
pub use config::backend;
pub use config::project;

pub use api::*;
pub use codegen::{assemble, encode_field_list, encode_inputs, Emission};
pub use config::backend::{Backend, BackendDescriptor, TemplateSet};
pub use error::{ConvertError, Result};
pub use fixed::{dequantize, quantize, Fixed, PRECISION_MULTIPLIER};
pub use ir::{FeatureUniverse, TreeEnsemble};
pub use model::RawNode;
