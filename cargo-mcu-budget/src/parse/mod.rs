//! Input formats for the graph snapshot produced by model introspection.

pub mod json;
