pub mod graph;
pub mod op;
pub mod validate;

pub use graph::{DType, Graph, Layer, LayerId, Tensor, TensorId};
pub use op::LayerOp;
pub use validate::validate_sequential;
