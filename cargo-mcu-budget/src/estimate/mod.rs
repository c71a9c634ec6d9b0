//! Resource estimators. Each is a pure function over an immutable snapshot.

pub mod macs;
pub mod ram;
pub mod report;
pub mod rom;
pub mod size;

pub use macs::{
    estimate_layer_macs, macs_conv2d, macs_depthwise_conv2d, macs_fully_connected, macs_matmul,
    total_macs, LayerMacs,
};
pub use ram::{estimate_ram, estimate_ram_rescan, plan_memory, LayerMemory, Lifetime, MemoryPlan};
pub use report::{BudgetCheck, DeviceBudget, Fit, Report};
pub use rom::estimate_rom;
pub use size::{dtype_width, tensor_size};
