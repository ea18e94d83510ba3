//! Hierarchical label path search
//!
//! - [`decompose`]: raw search value -> label segments
//! - [`engine`]: segments -> matching row chain, re-fetching children on demand

pub mod decompose;
pub mod engine;

pub use decompose::{ActionKind, ActionPathDecomposer, PathDecomposer};
pub use engine::PathSearchEngine;
