use crate::ir::{LayerId, TensorId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operand shapes violate the operator's channel/dimension agreement
    #[error("{op}: shape mismatch: {reason}")]
    ShapeMismatch { op: &'static str, reason: String },

    /// Only single-sample inference is modelled
    #[error("{op}: unsupported batch size {batch} (expected 1)")]
    UnsupportedBatchSize { op: &'static str, batch: usize },

    /// Tag with no entry in the dtype width table
    #[error("unknown dtype '{0}'")]
    UnknownDType(String),

    /// A tensor is referenced again after a gap in the layer sequence
    #[error(
        "tensor {tensor} is not live over a contiguous range: last seen at layer {last_seen}, referenced again at layer {resumed_at}"
    )]
    NonSequentialGraph {
        tensor: TensorId,
        last_seen: LayerId,
        resumed_at: LayerId,
    },

    #[error("layer {layer} references unknown tensor {tensor}")]
    UnknownTensor { layer: LayerId, tensor: TensorId },

    #[error("tensor index {0} appears more than once")]
    DuplicateTensor(TensorId),

    #[error("arithmetic overflow computing {what}")]
    SizeOverflow { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(op: &'static str, reason: impl Into<String>) -> Self {
        Error::ShapeMismatch {
            op,
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(what: impl Into<String>) -> Self {
        Error::SizeOverflow { what: what.into() }
    }
}
