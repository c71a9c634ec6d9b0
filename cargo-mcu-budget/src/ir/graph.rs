//! Core graph types: an immutable tensor/layer snapshot of a quantized model.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::op::LayerOp;
use crate::error::{Error, Result};

pub type TensorId = usize;
pub type LayerId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tensor {
    pub idx: TensorId,
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: DType,
    /// Weights, biases and other compile-time constants (e.g. a reshape's shape operand)
    pub is_const: bool,
}

impl Tensor {
    pub fn new(
        idx: TensorId,
        name: impl Into<String>,
        shape: Vec<usize>,
        dtype: DType,
        is_const: bool,
    ) -> Self {
        Self {
            idx,
            name: name.into(),
            shape,
            dtype,
            is_const,
        }
    }

    pub fn num_elements(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum DType {
    F32,
    F16,
    F8,
    I64,
    I32,
    I16,
    I8,
    U64,
    U32,
    U16,
    U8,
}

impl DType {
    pub const ALL: [DType; 11] = [
        DType::F32,
        DType::F16,
        DType::F8,
        DType::I64,
        DType::I32,
        DType::I16,
        DType::I8,
        DType::U64,
        DType::U32,
        DType::U16,
        DType::U8,
    ];

    /// Width of one element in bytes.
    pub const fn width(self) -> usize {
        match self {
            DType::I64 | DType::U64 => 8,
            DType::F32 | DType::I32 | DType::U32 => 4,
            DType::F16 | DType::I16 | DType::U16 => 2,
            DType::F8 | DType::I8 | DType::U8 => 1,
        }
    }

    pub const fn tag(self) -> &'static str {
        match self {
            DType::F32 => "float32",
            DType::F16 => "float16",
            DType::F8 => "float8",
            DType::I64 => "int64",
            DType::I32 => "int32",
            DType::I16 => "int16",
            DType::I8 => "int8",
            DType::U64 => "uint64",
            DType::U32 => "uint32",
            DType::U16 => "uint16",
            DType::U8 => "uint8",
        }
    }
}

impl FromStr for DType {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        DType::ALL
            .into_iter()
            .find(|dtype| dtype.tag() == tag)
            .ok_or_else(|| Error::UnknownDType(tag.to_string()))
    }
}

impl TryFrom<String> for DType {
    type Error = Error;

    fn try_from(tag: String) -> Result<Self> {
        tag.parse()
    }
}

impl From<DType> for &'static str {
    fn from(dtype: DType) -> Self {
        dtype.tag()
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One computational step. Its position in the layer list is its execution slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub idx: LayerId,
    pub name: String,
    /// Operator kind, for layers that have a MAC cost formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<LayerOp>,
    pub inputs: Vec<TensorId>,
    pub outputs: Vec<TensorId>,
}

impl Layer {
    pub fn new(
        idx: LayerId,
        name: impl Into<String>,
        inputs: Vec<TensorId>,
        outputs: Vec<TensorId>,
    ) -> Self {
        Self {
            idx,
            name: name.into(),
            op: None,
            inputs,
            outputs,
        }
    }

    pub fn with_op(mut self, op: LayerOp) -> Self {
        self.op = Some(op);
        self
    }

    /// Every tensor this layer reads or writes, inputs first.
    pub fn tensor_refs(&self) -> impl Iterator<Item = TensorId> + '_ {
        self.inputs.iter().chain(self.outputs.iter()).copied()
    }
}

/// Validated snapshot: tensors addressable by `idx`, layers in execution order.
#[derive(Debug, Clone)]
pub struct Graph {
    tensors: Vec<Tensor>,
    layers: Vec<Layer>,
    index: HashMap<TensorId, usize>,
}

impl Graph {
    pub fn new(tensors: Vec<Tensor>, layers: Vec<Layer>) -> Result<Self> {
        let index = index_tensors(&tensors)?;

        for (pos, layer) in layers.iter().enumerate() {
            if layer.idx != pos {
                log::warn!(
                    "layer '{}' has idx {} but sits at position {pos}; list order wins",
                    layer.name,
                    layer.idx
                );
            }
            if let Some(tensor) = layer.tensor_refs().find(|t| !index.contains_key(t)) {
                return Err(Error::UnknownTensor { layer: pos, tensor });
            }
        }

        Ok(Self {
            tensors,
            layers,
            index,
        })
    }

    pub fn tensor(&self, idx: TensorId) -> Option<&Tensor> {
        self.index.get(&idx).map(|&pos| &self.tensors[pos])
    }

    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

/// Map tensor `idx` to its position in `tensors`, rejecting duplicates.
pub(crate) fn index_tensors(tensors: &[Tensor]) -> Result<HashMap<TensorId, usize>> {
    let mut index = HashMap::with_capacity(tensors.len());
    for (pos, tensor) in tensors.iter().enumerate() {
        if index.insert(tensor.idx, pos).is_some() {
            return Err(Error::DuplicateTensor(tensor.idx));
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fc_tensors() -> Vec<Tensor> {
        vec![
            Tensor::new(0, "x", vec![1, 1024], DType::I8, false),
            Tensor::new(1, "W", vec![10, 1024], DType::I8, true),
            Tensor::new(2, "b", vec![10], DType::I32, true),
            Tensor::new(3, "y", vec![1, 10], DType::I8, false),
        ]
    }

    #[test]
    fn dtype_widths() {
        let widths: Vec<usize> = DType::ALL.iter().map(|d| d.width()).collect();
        assert_eq!(widths, vec![4, 2, 1, 8, 4, 2, 1, 8, 4, 2, 1]);
    }

    #[test]
    fn dtype_tags_parse_back() {
        for dtype in DType::ALL {
            assert_eq!(dtype.tag().parse::<DType>().unwrap(), dtype);
        }
    }

    #[test]
    fn unknown_dtype_tag_rejected() {
        let err = "bfloat16".parse::<DType>().unwrap_err();
        assert!(matches!(err, Error::UnknownDType(ref tag) if tag == "bfloat16"));
    }

    #[test]
    fn graph_lookup_by_idx() {
        let mut tensors = fc_tensors();
        tensors.reverse();
        let layers = vec![Layer::new(0, "FullyConnected", vec![0, 1, 2], vec![3])];
        let graph = Graph::new(tensors, layers).unwrap();
        assert_eq!(graph.tensor(2).unwrap().name, "b");
        assert!(graph.tensor(4).is_none());
    }

    #[test]
    fn duplicate_tensor_idx_rejected() {
        let mut tensors = fc_tensors();
        tensors.push(Tensor::new(1, "W2", vec![4], DType::I8, true));
        let err = Graph::new(tensors, vec![]).unwrap_err();
        assert!(matches!(err, Error::DuplicateTensor(1)));
    }

    #[test]
    fn dangling_tensor_reference_rejected() {
        let layers = vec![
            Layer::new(0, "FullyConnected", vec![0, 1, 2], vec![3]),
            Layer::new(1, "Softmax", vec![3], vec![9]),
        ];
        let err = Graph::new(fc_tensors(), layers).unwrap_err();
        assert!(matches!(err, Error::UnknownTensor { layer: 1, tensor: 9 }));
    }

    #[test]
    fn tensor_refs_inputs_then_outputs() {
        let layer = Layer::new(0, "Conv2D", vec![4, 5, 6], vec![7]);
        assert_eq!(layer.tensor_refs().collect::<Vec<_>>(), vec![4, 5, 6, 7]);
    }
}
