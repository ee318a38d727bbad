//! CLI command implementations.

pub mod common;
pub mod render;
pub mod submit;
pub mod version;
