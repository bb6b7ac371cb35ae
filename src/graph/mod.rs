//! Atom adjacency graph module

pub mod compressed;
pub mod builder;
pub mod subgraph;

pub use compressed::AdjacencyGraph;
