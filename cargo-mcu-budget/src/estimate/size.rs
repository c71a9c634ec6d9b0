use crate::error::{Error, Result};
use crate::ir::{DType, Tensor};

/// Footprint of one tensor in bytes: `product(shape) * width(dtype)`.
///
/// A scalar (empty shape) occupies one element; any zero dimension yields 0.
pub fn tensor_size(tensor: &Tensor) -> Result<usize> {
    tensor
        .num_elements()
        .and_then(|n| n.checked_mul(tensor.dtype.width()))
        .ok_or_else(|| {
            Error::overflow(format!(
                "size of tensor {} '{}' {:?}",
                tensor.idx, tensor.name, tensor.shape
            ))
        })
}

/// Byte width for a textual dtype tag such as `"int8"`.
pub fn dtype_width(tag: &str) -> Result<usize> {
    Ok(tag.parse::<DType>()?.width())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(shape: Vec<usize>, dtype: DType) -> Tensor {
        Tensor::new(0, "t", shape, dtype, false)
    }

    #[test]
    fn product_times_width() {
        assert_eq!(tensor_size(&tensor(vec![1, 1024], DType::I8)).unwrap(), 1024);
        assert_eq!(tensor_size(&tensor(vec![10], DType::I32)).unwrap(), 40);
        assert_eq!(tensor_size(&tensor(vec![2, 3, 4], DType::F16)).unwrap(), 48);
        assert_eq!(tensor_size(&tensor(vec![3, 3], DType::U64)).unwrap(), 72);
    }

    #[test]
    fn scalar_is_one_element() {
        for dtype in DType::ALL {
            assert_eq!(tensor_size(&tensor(vec![], dtype)).unwrap(), dtype.width());
        }
    }

    #[test]
    fn zero_dim_is_empty() {
        assert_eq!(tensor_size(&tensor(vec![4, 0, 8], DType::F32)).unwrap(), 0);
    }

    #[test]
    fn overflow_is_an_error() {
        let err = tensor_size(&tensor(vec![usize::MAX, 2], DType::I8)).unwrap_err();
        assert!(matches!(err, Error::SizeOverflow { .. }));
        let err = tensor_size(&tensor(vec![usize::MAX], DType::I32)).unwrap_err();
        assert!(matches!(err, Error::SizeOverflow { .. }));
    }

    #[test]
    fn width_lookup_by_tag() {
        assert_eq!(dtype_width("float8").unwrap(), 1);
        assert_eq!(dtype_width("uint16").unwrap(), 2);
        assert!(matches!(
            dtype_width("complex64").unwrap_err(),
            Error::UnknownDType(_)
        ));
    }
}
