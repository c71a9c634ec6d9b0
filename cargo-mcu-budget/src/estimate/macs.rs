//! Closed-form MAC counts for the supported operators.
//!
//! All counts assume a single inference sample and count multiplications
//! only; bias additions are excluded.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::ir::{Graph, Layer, LayerId, LayerOp, TensorId};

const CONV2D: &str = "conv2d";
const DEPTHWISE_CONV2D: &str = "depthwise_conv2d";
const FULLY_CONNECTED: &str = "fully_connected";
const MATMUL: &str = "matmul";

/// 2-D convolution.
///
/// - `in_shape`:     `[1, H_in, W_in, C_in]`
/// - `kernel_shape`: `[C_out, K_h, K_w, C_in]`
/// - `out_shape`:    `[1, H_out, W_out, C_out]`
pub fn macs_conv2d(in_shape: &[usize], kernel_shape: &[usize], out_shape: &[usize]) -> Result<u64> {
    let [in_n, _, _, in_c] = rank4(CONV2D, "input", in_shape)?;
    let [k_oc, k_h, k_w, k_ic] = rank4(CONV2D, "kernel", kernel_shape)?;
    let [out_n, out_h, out_w, out_c] = rank4(CONV2D, "output", out_shape)?;

    single_sample(CONV2D, in_n)?;
    single_sample(CONV2D, out_n)?;

    if in_c != k_ic {
        return Err(Error::shape(
            CONV2D,
            format!("input has {in_c} channels but kernel expects {k_ic}"),
        ));
    }
    if out_c != k_oc {
        return Err(Error::shape(
            CONV2D,
            format!("output has {out_c} channels but kernel produces {k_oc}"),
        ));
    }

    product(CONV2D, &[out_h, out_w, out_c, k_h, k_w, in_c])
}

/// Depthwise 2-D convolution.
///
/// - `in_shape`:     `[1, H_in, W_in, C_in]`
/// - `kernel_shape`: `[1, K_h, K_w, C_out]`
/// - `out_shape`:    `[1, H_out, W_out, C_out]`, `C_out = C_in * channel_mult`
pub fn macs_depthwise_conv2d(
    in_shape: &[usize],
    kernel_shape: &[usize],
    out_shape: &[usize],
    channel_mult: usize,
) -> Result<u64> {
    let [in_n, _, _, in_c] = rank4(DEPTHWISE_CONV2D, "input", in_shape)?;
    let [k_lead, k_h, k_w, k_oc] = rank4(DEPTHWISE_CONV2D, "kernel", kernel_shape)?;
    let [out_n, out_h, out_w, out_c] = rank4(DEPTHWISE_CONV2D, "output", out_shape)?;

    single_sample(DEPTHWISE_CONV2D, in_n)?;
    single_sample(DEPTHWISE_CONV2D, out_n)?;

    if k_lead != 1 {
        return Err(Error::shape(
            DEPTHWISE_CONV2D,
            format!("kernel leading dimension must be 1, got {k_lead}"),
        ));
    }
    let expected_c = in_c
        .checked_mul(channel_mult)
        .ok_or_else(|| Error::overflow(format!("{DEPTHWISE_CONV2D} output channels")))?;
    if out_c != expected_c {
        return Err(Error::shape(
            DEPTHWISE_CONV2D,
            format!("output has {out_c} channels, expected {in_c} x {channel_mult} = {expected_c}"),
        ));
    }
    if k_oc != out_c {
        return Err(Error::shape(
            DEPTHWISE_CONV2D,
            format!("kernel has {k_oc} output channels but output has {out_c}"),
        ));
    }

    product(DEPTHWISE_CONV2D, &[out_h, out_w, in_c, k_h, k_w, channel_mult])
}

/// Fully connected layer over a single sample.
///
/// - `in_shape`:     `[1, W_in]`
/// - `filter_shape`: `[W_in, W_out]`
/// - `out_shape`:    `[1, W_out]`
///
/// More than one row is `UnsupportedBatchSize`; use [`macs_matmul`] for
/// multi-row inputs.
pub fn macs_fully_connected(
    in_shape: &[usize],
    filter_shape: &[usize],
    out_shape: &[usize],
) -> Result<u64> {
    let [in_h, _] = rank2(FULLY_CONNECTED, "input", in_shape)?;
    let [out_h, _] = rank2(FULLY_CONNECTED, "output", out_shape)?;
    single_sample(FULLY_CONNECTED, in_h)?;
    single_sample(FULLY_CONNECTED, out_h)?;

    matmul(FULLY_CONNECTED, in_shape, filter_shape, out_shape)
}

/// Matrix multiply `[H, W_in] x [W_in, W_out] -> [H, W_out]` with any row count.
pub fn macs_matmul(in_shape: &[usize], filter_shape: &[usize], out_shape: &[usize]) -> Result<u64> {
    matmul(MATMUL, in_shape, filter_shape, out_shape)
}

fn matmul(
    op: &'static str,
    in_shape: &[usize],
    filter_shape: &[usize],
    out_shape: &[usize],
) -> Result<u64> {
    let [in_h, in_w] = rank2(op, "input", in_shape)?;
    let [f_h, f_w] = rank2(op, "filter", filter_shape)?;
    let [out_h, out_w] = rank2(op, "output", out_shape)?;

    if in_w != f_h {
        return Err(Error::shape(
            op,
            format!("input width {in_w} does not match filter height {f_h}"),
        ));
    }
    if out_w != f_w {
        return Err(Error::shape(
            op,
            format!("output width {out_w} does not match filter width {f_w}"),
        ));
    }
    if in_h != out_h {
        return Err(Error::shape(
            op,
            format!("input has {in_h} rows but output has {out_h}"),
        ));
    }

    product(op, &[in_h, in_w, out_w])
}

// ─── Per-layer report ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerMacs {
    pub layer: LayerId,
    pub name: String,
    /// Operator kind; `None` for layers without a cost formula
    pub op: Option<&'static str>,
    pub macs: u64,
}

/// MAC count of every layer, in execution order.
pub fn estimate_layer_macs(graph: &Graph) -> Result<Vec<LayerMacs>> {
    graph
        .layers()
        .iter()
        .enumerate()
        .map(|(pos, layer)| -> Result<LayerMacs> {
            let macs = match layer.op {
                Some(op) => layer_macs(graph, pos, layer, op).map_err(|e| in_layer(e, pos, layer))?,
                None => 0,
            };
            log::debug!("layer {pos} '{}': {macs} MACs", layer.name);
            Ok(LayerMacs {
                layer: pos,
                name: layer.name.clone(),
                op: layer.op.map(|op| op.name()),
                macs,
            })
        })
        .collect()
}

/// Sum of all per-layer MAC counts.
pub fn total_macs(layers: &[LayerMacs]) -> Result<u64> {
    layers
        .iter()
        .try_fold(0u64, |acc, l| acc.checked_add(l.macs))
        .ok_or_else(|| Error::overflow("total MACs"))
}

fn layer_macs(graph: &Graph, pos: LayerId, layer: &Layer, op: LayerOp) -> Result<u64> {
    let operands = layer.operands().ok_or_else(|| {
        Error::shape(
            op.name(),
            "layer needs an input, a weight tensor and an output",
        )
    })?;
    let shape = |id: TensorId| {
        graph
            .tensor(id)
            .map(|t| t.shape.as_slice())
            .ok_or(Error::UnknownTensor { layer: pos, tensor: id })
    };
    let input = shape(operands.input)?;
    let weights = shape(operands.weights)?;
    let output = shape(operands.output)?;

    match op {
        LayerOp::Conv2d => macs_conv2d(input, weights, output),
        LayerOp::DepthwiseConv2d { depth_multiplier } => {
            macs_depthwise_conv2d(input, weights, output, depth_multiplier)
        }
        LayerOp::FullyConnected => {
            // Weights are [out_features, in_features]
            let [out_features, in_features] = rank2(FULLY_CONNECTED, "weights", weights)?;
            macs_fully_connected(
                &flatten_rows(FULLY_CONNECTED, input)?,
                &[in_features, out_features],
                &flatten_rows(FULLY_CONNECTED, output)?,
            )
        }
    }
}

/// View an activation as `[rows, cols]`: rank 1 becomes one row, higher
/// ranks keep the leading (batch) dimension and fold the rest.
fn flatten_rows(op: &'static str, shape: &[usize]) -> Result<[usize; 2]> {
    match shape {
        [] => Err(Error::shape(op, "activation must not be a scalar")),
        [n] => Ok([1, *n]),
        [rows, rest @ ..] => {
            let cols = rest
                .iter()
                .try_fold(1usize, |acc, &d| acc.checked_mul(d))
                .ok_or_else(|| Error::overflow(format!("{op} flattened width")))?;
            Ok([*rows, cols])
        }
    }
}

fn in_layer(err: Error, pos: LayerId, layer: &Layer) -> Error {
    match err {
        Error::ShapeMismatch { op, reason } => Error::ShapeMismatch {
            op,
            reason: format!("layer {pos} '{}': {reason}", layer.name),
        },
        other => other,
    }
}

fn rank4(op: &'static str, what: &str, shape: &[usize]) -> Result<[usize; 4]> {
    shape
        .try_into()
        .map_err(|_| Error::shape(op, format!("{what} must be rank 4, got {shape:?}")))
}

fn rank2(op: &'static str, what: &str, shape: &[usize]) -> Result<[usize; 2]> {
    shape
        .try_into()
        .map_err(|_| Error::shape(op, format!("{what} must be rank 2, got {shape:?}")))
}

fn single_sample(op: &'static str, batch: usize) -> Result<()> {
    if batch != 1 {
        return Err(Error::UnsupportedBatchSize { op, batch });
    }
    Ok(())
}

fn product(op: &'static str, factors: &[usize]) -> Result<u64> {
    factors
        .iter()
        .try_fold(1u64, |acc, &f| acc.checked_mul(f as u64))
        .ok_or_else(|| Error::overflow(format!("{op} MACs")))
}
