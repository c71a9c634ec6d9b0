//! JSON graph export.
//!
//! ```json
//! {
//!   "tensors": [{"idx": 0, "name": "x", "shape": [1, 1024], "dtype": "int8", "is_const": false}],
//!   "layers":  [{"idx": 0, "name": "FullyConnected", "op": {"type": "fully_connected"},
//!                "inputs": [0, 1, 2], "outputs": [3]}]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::estimate::DeviceBudget;
use crate::ir::{Graph, Layer, Tensor};

/// Wire form of a graph, before tensor-index validation.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphDoc {
    pub tensors: Vec<Tensor>,
    pub layers: Vec<Layer>,
}

impl GraphDoc {
    pub fn into_graph(self) -> Result<Graph> {
        Graph::new(self.tensors, self.layers)
    }
}

pub fn graph_from_str(text: &str) -> Result<Graph> {
    let doc: GraphDoc = serde_json::from_str(text)?;
    log::debug!(
        "parsed graph: {} tensors, {} layers",
        doc.tensors.len(),
        doc.layers.len()
    );
    doc.into_graph()
}

pub fn graph_from_path(path: impl AsRef<Path>) -> Result<Graph> {
    graph_from_str(&fs::read_to_string(path)?)
}

pub fn budget_from_str(text: &str) -> Result<DeviceBudget> {
    Ok(serde_json::from_str(text)?)
}

pub fn budget_from_path(path: impl AsRef<Path>) -> Result<DeviceBudget> {
    budget_from_str(&fs::read_to_string(path)?)
}
