use super::size::tensor_size;
use crate::error::{Error, Result};
use crate::ir::Tensor;

/// Bytes of non-volatile storage taken by constant tensors (weights, biases,
/// reshape shape operands). Activations contribute nothing.
pub fn estimate_rom(tensors: &[Tensor]) -> Result<usize> {
    tensors
        .iter()
        .filter(|t| t.is_const)
        .try_fold(0usize, |acc, t| {
            acc.checked_add(tensor_size(t)?)
                .ok_or_else(|| Error::overflow("ROM total"))
        })
}
