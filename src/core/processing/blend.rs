use ndarray::{ArrayD, Zip};

use crate::core::tensor::{MemoryLedger, Tensor};
use crate::models::BackendError;

/// Length of the style bottleneck produced by both encoders.
pub const EMBEDDING_DIM: usize = 100;

/// Shape of one embedding as the transform graphs expect it.
pub const EMBEDDING_SHAPE: [usize; 4] = [1, 1, 1, EMBEDDING_DIM];

/// Linear interpolation of two embeddings: `a * ratio + b * (1 - ratio)`.
///
/// Shapes must match exactly. `ratio` must lie in `[0, 1]`.
pub fn blend(
    ledger: &MemoryLedger,
    a: &Tensor,
    b: &Tensor,
    ratio: f32,
) -> Result<Tensor, BackendError> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(BackendError::Runtime(format!(
            "blend ratio must be within [0, 1], got {ratio}"
        )));
    }
    if a.shape() != b.shape() {
        return Err(BackendError::Shape(format!(
            "cannot blend embeddings of shape {:?} and {:?}",
            a.shape(),
            b.shape()
        )));
    }

    let weight_b = 1.0 - ratio;
    let mut out = ArrayD::<f32>::zeros(a.array().raw_dim());
    Zip::from(&mut out)
        .and(a.array())
        .and(b.array())
        .for_each(|o, &x, &y| *o = x * ratio + y * weight_b);

    Ok(ledger.track(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(ledger: &MemoryLedger, f: impl Fn(usize) -> f32) -> Tensor {
        let values = (0..EMBEDDING_DIM).map(f).collect();
        ledger.from_shape_vec(&EMBEDDING_SHAPE, values).unwrap()
    }

    fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f32::max)
    }

    #[test]
    fn endpoints_return_inputs() {
        let ledger = MemoryLedger::new();
        let a = embedding(&ledger, |i| i as f32 * 0.37 - 5.0);
        let b = embedding(&ledger, |i| (i as f32).sin());

        let full = blend(&ledger, &a, &b, 1.0).unwrap();
        assert!(max_abs_diff(&full.to_vec(), &a.to_vec()) < 1e-6);

        let none = blend(&ledger, &a, &b, 0.0).unwrap();
        assert!(max_abs_diff(&none.to_vec(), &b.to_vec()) < 1e-6);
    }

    #[test]
    fn interior_ratio_is_linear() {
        let ledger = MemoryLedger::new();
        let a = embedding(&ledger, |_| 2.0);
        let b = embedding(&ledger, |_| -1.0);

        let mixed = blend(&ledger, &a, &b, 0.23).unwrap();
        let expected = 2.0 * 0.23 + -1.0 * 0.77;
        for v in mixed.to_vec() {
            assert!((v - expected).abs() < 1e-6);
        }
        assert_eq!(mixed.shape(), &EMBEDDING_SHAPE);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let ledger = MemoryLedger::new();
        let a = embedding(&ledger, |_| 1.0);
        let b = ledger.zeros(&[1, 100]);
        assert!(matches!(blend(&ledger, &a, &b, 0.5), Err(BackendError::Shape(_))));
    }

    #[test]
    fn out_of_range_ratio_is_rejected() {
        let ledger = MemoryLedger::new();
        let a = embedding(&ledger, |_| 1.0);
        let b = embedding(&ledger, |_| 1.0);
        assert!(blend(&ledger, &a, &b, 1.5).is_err());
        assert!(blend(&ledger, &a, &b, f32::NAN).is_err());
        assert_eq!(ledger.snapshot().allocations, 2);
    }
}
