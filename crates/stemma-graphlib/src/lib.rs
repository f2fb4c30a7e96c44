#![forbid(unsafe_code)]

//! Graph container APIs used by `stemma`.
//!
//! Nodes are addressed by string id but stored in a flat arena; every node also has a dense
//! index (its insertion position) that the helper algorithms in [`alg`] work with. Callers that
//! insert nodes in a canonical order get canonical iteration order for free.

pub mod alg;
mod graph;

pub use graph::{EdgeInsert, Graph, GraphOptions};
