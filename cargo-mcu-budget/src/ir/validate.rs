//! Sequential-graph guard.
//!
//! The RAM planner assumes every activation is live over one contiguous span
//! of layers. This pass checks that assumption; the planner itself does not
//! call it.

use std::collections::HashMap;

use super::graph::{index_tensors, Layer, LayerId, Tensor, TensorId};
use crate::error::{Error, Result};

/// Fail with `NonSequentialGraph` if a non-constant tensor is referenced,
/// skipped by at least one layer, then referenced again.
pub fn validate_sequential(tensors: &[Tensor], layers: &[Layer]) -> Result<()> {
    let index = index_tensors(tensors)?;
    let mut last_seen: HashMap<TensorId, LayerId> = HashMap::new();

    for (pos, layer) in layers.iter().enumerate() {
        for id in layer.tensor_refs() {
            let &slot = index
                .get(&id)
                .ok_or(Error::UnknownTensor { layer: pos, tensor: id })?;
            if tensors[slot].is_const {
                continue;
            }
            if let Some(prev) = last_seen.insert(id, pos) {
                if prev + 1 < pos {
                    return Err(Error::NonSequentialGraph {
                        tensor: id,
                        last_seen: prev,
                        resumed_at: pos,
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DType;

    fn act(idx: TensorId) -> Tensor {
        Tensor::new(idx, format!("t{idx}"), vec![1, 8], DType::I8, false)
    }

    #[test]
    fn chain_is_sequential() {
        let tensors = vec![act(0), act(1), act(2), act(3)];
        let layers = vec![
            Layer::new(0, "a", vec![0], vec![1]),
            Layer::new(1, "b", vec![1], vec![2]),
            Layer::new(2, "c", vec![2], vec![3]),
        ];
        validate_sequential(&tensors, &layers).unwrap();
    }

    #[test]
    fn skip_connection_rejected() {
        // t1 feeds both layer 1 and layer 3, but layer 2 does not touch it
        let tensors = vec![act(0), act(1), act(2), act(3), act(4)];
        let layers = vec![
            Layer::new(0, "a", vec![0], vec![1]),
            Layer::new(1, "b", vec![1], vec![2]),
            Layer::new(2, "c", vec![2], vec![3]),
            Layer::new(3, "add", vec![3, 1], vec![4]),
        ];
        let err = validate_sequential(&tensors, &layers).unwrap_err();
        assert!(matches!(
            err,
            Error::NonSequentialGraph {
                tensor: 1,
                last_seen: 1,
                resumed_at: 3
            }
        ));
    }

    #[test]
    fn shared_constant_is_exempt() {
        let mut tensors = vec![act(0), act(1), act(2), act(3)];
        tensors.push(Tensor::new(9, "shape", vec![2], DType::I32, true));
        let layers = vec![
            Layer::new(0, "reshape", vec![0, 9], vec![1]),
            Layer::new(1, "relu", vec![1], vec![2]),
            Layer::new(2, "reshape", vec![2, 9], vec![3]),
        ];
        validate_sequential(&tensors, &layers).unwrap();
    }

    #[test]
    fn repeated_reference_within_layer_is_fine() {
        let tensors = vec![act(0), act(1)];
        let layers = vec![Layer::new(0, "square", vec![0, 0], vec![1])];
        validate_sequential(&tensors, &layers).unwrap();
    }

    #[test]
    fn unknown_reference_reported() {
        let tensors = vec![act(0)];
        let layers = vec![Layer::new(0, "a", vec![0], vec![5])];
        let err = validate_sequential(&tensors, &layers).unwrap_err();
        assert!(matches!(err, Error::UnknownTensor { layer: 0, tensor: 5 }));
    }
}
