//! Pre-deployment resource estimator for quantized inference graphs.
//!
//! Computes per-layer MACs, ROM for constant tensors and peak RAM for
//! activations, and checks them against a microcontroller's budget.

pub mod error;
pub mod estimate;
pub mod ir;
pub mod parse;

pub use error::{Error, Result};
pub use estimate::{
    estimate_ram, estimate_rom, macs_conv2d, macs_depthwise_conv2d, macs_fully_connected,
    tensor_size,
};
