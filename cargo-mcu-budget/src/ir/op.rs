//! Operator kinds that carry a MAC cost formula.
//!
//! Operand positions follow the TFLite convention: `inputs[0]` is the
//! activation, `inputs[1]` the weights, optional `inputs[2]` the bias and
//! `outputs[0]` the result.

use serde::{Deserialize, Serialize};

use super::graph::{Layer, TensorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerOp {
    /// NHWC input, OHWI kernel `[C_out, K_h, K_w, C_in]`
    Conv2d,

    /// Kernel `[1, K_h, K_w, C_out]`, `C_out = C_in * depth_multiplier`
    DepthwiseConv2d { depth_multiplier: usize },

    /// Dense layer; weights stored `[out_features, in_features]`
    FullyConnected,
}

impl LayerOp {
    pub fn name(&self) -> &'static str {
        match self {
            LayerOp::Conv2d => "conv2d",
            LayerOp::DepthwiseConv2d { .. } => "depthwise_conv2d",
            LayerOp::FullyConnected => "fully_connected",
        }
    }
}

/// The activation, weight and output tensors of a costed layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operands {
    pub input: TensorId,
    pub weights: TensorId,
    pub output: TensorId,
}

impl Layer {
    /// Returns `None` when the layer lists fewer than two inputs or no output.
    pub fn operands(&self) -> Option<Operands> {
        Some(Operands {
            input: *self.inputs.first()?,
            weights: *self.inputs.get(1)?,
            output: *self.outputs.first()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_json_tagging() {
        let op: LayerOp =
            serde_json::from_str(r#"{"type": "depthwise_conv2d", "depth_multiplier": 4}"#)
                .unwrap();
        assert_eq!(op, LayerOp::DepthwiseConv2d { depth_multiplier: 4 });

        let op: LayerOp = serde_json::from_str(r#"{"type": "conv2d"}"#).unwrap();
        assert_eq!(op, LayerOp::Conv2d);
    }

    #[test]
    fn operands_skip_bias() {
        let layer = Layer::new(0, "Conv2D", vec![0, 1, 2], vec![3]).with_op(LayerOp::Conv2d);
        assert_eq!(
            layer.operands(),
            Some(Operands {
                input: 0,
                weights: 1,
                output: 3
            })
        );
    }

    #[test]
    fn operands_missing_weights() {
        let layer = Layer::new(0, "Softmax", vec![0], vec![1]);
        assert_eq!(layer.operands(), None);
    }
}
