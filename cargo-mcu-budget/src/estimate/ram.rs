//! Liveness-based peak RAM planner.
//!
//! Model: every input and output of the running layer is resident at once,
//! no layer runs in place, an activation is allocated at its first reference
//! and freed right after its last one, and constants live in ROM. With an
//! ideal (fragmentation-free) allocator the peak is the largest sum of live
//! tensor sizes over all layers.
//!
//! The layer list must describe a sequential graph; see
//! [`validate_sequential`](crate::ir::validate_sequential).

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::size::tensor_size;
use crate::error::{Error, Result};
use crate::ir::graph::index_tensors;
use crate::ir::{Layer, LayerId, Tensor, TensorId};

/// Result of one planning pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryPlan {
    /// Peak RAM in bytes
    pub peak_bytes: usize,
    /// First layer at which the peak is reached
    pub peak_layer: Option<LayerId>,
    /// Resident set while each layer runs, in execution order
    pub layers: Vec<LayerMemory>,
    /// Live span of every planned activation, ordered by release
    pub lifetimes: Vec<Lifetime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerMemory {
    pub layer: LayerId,
    pub live_bytes: usize,
    /// Sorted by tensor index
    pub live: Vec<TensorId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lifetime {
    pub tensor: TensorId,
    pub size: usize,
    pub first_use: LayerId,
    pub last_use: LayerId,
}

/// Peak RAM in bytes needed to run `layers` once.
pub fn estimate_ram(tensors: &[Tensor], layers: &[Layer]) -> Result<usize> {
    plan_memory(tensors, layers).map(|plan| plan.peak_bytes)
}

/// Plan with last-use indices precomputed in one backward pass.
pub fn plan_memory(tensors: &[Tensor], layers: &[Layer]) -> Result<MemoryPlan> {
    let index = index_tensors(tensors)?;

    let mut last_use: HashMap<TensorId, LayerId> = HashMap::new();
    for (pos, layer) in layers.iter().enumerate().rev() {
        for id in layer.tensor_refs() {
            last_use.entry(id).or_insert(pos);
        }
    }

    let mut live: BTreeMap<TensorId, (usize, LayerId)> = BTreeMap::new();
    let mut resident = 0usize;
    let mut plan = MemoryPlan {
        peak_bytes: 0,
        peak_layer: None,
        layers: Vec::with_capacity(layers.len()),
        lifetimes: Vec::new(),
    };

    for (pos, layer) in layers.iter().enumerate() {
        // (1) allocate on first reference
        for id in layer.tensor_refs() {
            let tensor = lookup(tensors, &index, pos, id)?;
            if tensor.is_const || live.contains_key(&id) {
                continue;
            }
            let size = tensor_size(tensor)?;
            resident = resident
                .checked_add(size)
                .ok_or_else(|| Error::overflow(format!("resident bytes at layer {pos}")))?;
            live.insert(id, (size, pos));
        }

        // (2) every operand of this layer is resident now
        log::debug!(
            "layer {pos} '{}': {resident} bytes live across {} tensors",
            layer.name,
            live.len()
        );
        if plan.peak_layer.is_none() || resident > plan.peak_bytes {
            plan.peak_bytes = resident;
            plan.peak_layer = Some(pos);
        }
        plan.layers.push(LayerMemory {
            layer: pos,
            live_bytes: resident,
            live: live.keys().copied().collect(),
        });

        // (3) release what no later layer reads
        live.retain(|&id, &mut (size, first_use)| {
            if last_use[&id] > pos {
                return true;
            }
            resident -= size;
            plan.lifetimes.push(Lifetime {
                tensor: id,
                size,
                first_use,
                last_use: pos,
            });
            false
        });
    }

    debug_assert!(live.is_empty());
    Ok(plan)
}

/// Literal planner: after every layer, re-scan all later layers to decide
/// what to free. Quadratic in the number of layers; always agrees with
/// [`estimate_ram`].
pub fn estimate_ram_rescan(tensors: &[Tensor], layers: &[Layer]) -> Result<usize> {
    let index = index_tensors(tensors)?;
    let mut live: HashMap<TensorId, usize> = HashMap::new();
    let mut peak = 0usize;

    for (pos, layer) in layers.iter().enumerate() {
        for id in layer.tensor_refs() {
            let tensor = lookup(tensors, &index, pos, id)?;
            if tensor.is_const || live.contains_key(&id) {
                continue;
            }
            live.insert(id, tensor_size(tensor)?);
        }

        let resident = live
            .values()
            .try_fold(0usize, |acc, &size| acc.checked_add(size))
            .ok_or_else(|| Error::overflow(format!("resident bytes at layer {pos}")))?;
        peak = peak.max(resident);

        let future: HashSet<TensorId> = layers[pos + 1..]
            .iter()
            .flat_map(|l| l.tensor_refs())
            .collect();
        live.retain(|id, _| future.contains(id));
    }

    Ok(peak)
}

fn lookup<'a>(
    tensors: &'a [Tensor],
    index: &HashMap<TensorId, usize>,
    layer: LayerId,
    id: TensorId,
) -> Result<&'a Tensor> {
    index
        .get(&id)
        .map(|&slot| &tensors[slot])
        .ok_or(Error::UnknownTensor { layer, tensor: id })
}
