pub mod backend;
pub mod project;
