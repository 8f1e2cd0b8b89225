//! Batched matrix multiply with broadcast batch axes.
use crate::broadcast::multi_broadcast;
use tract_delegate_data::internal::*;
use tract_ndarray::linalg::general_mat_mul;
use tract_ndarray::LinalgScalar;
use tract_ndarray::{ArrayView2, ArrayViewD, ArrayViewMutD, Axis, Dimension, Ix2};

/// Logical geometry of `a * b`, after transposition of the two innermost
/// axes of `a` (resp. `b`) when `adj_a` (resp. `adj_b`) is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchMatMulGeo {
    pub batch: TVec<usize>,
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

impl BatchMatMulGeo {
    pub fn compute(
        a_shape: &[usize],
        b_shape: &[usize],
        adj_a: bool,
        adj_b: bool,
    ) -> TractResult<BatchMatMulGeo> {
        ensure!(
            a_shape.len() >= 2 && b_shape.len() >= 2,
            "BatchMatMul operands must have rank 2 or more, got {:?} and {:?}",
            a_shape,
            b_shape
        );
        let (ar, br) = (a_shape.len(), b_shape.len());
        let (m, ka) = if adj_a {
            (a_shape[ar - 1], a_shape[ar - 2])
        } else {
            (a_shape[ar - 2], a_shape[ar - 1])
        };
        let (kb, n) = if adj_b {
            (b_shape[br - 1], b_shape[br - 2])
        } else {
            (b_shape[br - 2], b_shape[br - 1])
        };
        ensure!(ka == kb, "BatchMatMul accumulation depth mismatch: {} != {}", ka, kb);
        let batch = multi_broadcast(&[&a_shape[..ar - 2], &b_shape[..br - 2]])?;
        Ok(BatchMatMulGeo { batch, m, k: ka, n })
    }

    pub fn output_shape(&self) -> TVec<usize> {
        let mut shape = self.batch.clone();
        shape.push(self.m);
        shape.push(self.n);
        shape
    }
}

/// Extract the matrix of a (possibly broadcast) operand matching one output
/// batch position.
fn operand_matrix<'a, T>(
    x: &ArrayViewD<'a, T>,
    prefix: &[usize],
) -> TractResult<ArrayView2<'a, T>> {
    let batch_rank = x.ndim() - 2;
    let offset = prefix.len() - batch_rank;
    let mut view = x.clone();
    for axis in 0..batch_rank {
        let d = prefix[offset + axis].min(view.shape()[0] - 1);
        view = view.index_axis_move(Axis(0), d);
    }
    Ok(view.into_dimensionality::<Ix2>()?)
}

pub fn batch_matmul<T: Datum + LinalgScalar>(
    a: ArrayViewD<T>,
    b: ArrayViewD<T>,
    adj_a: bool,
    adj_b: bool,
    mut c: ArrayViewMutD<T>,
) -> TractResult<()> {
    let geo = BatchMatMulGeo::compute(a.shape(), b.shape(), adj_a, adj_b)?;
    let expected = geo.output_shape();
    ensure!(
        c.shape() == &*expected,
        "BatchMatMul output shape {:?}, expected {:?}",
        c.shape(),
        expected
    );
    log::trace!("batch_matmul {:?} adj_a:{} adj_b:{}", geo, adj_a, adj_b);
    for prefix in tract_ndarray::indices(&*geo.batch) {
        let prefix = prefix.slice();
        let a2 = operand_matrix(&a, prefix)?;
        let b2 = operand_matrix(&b, prefix)?;
        let a2 = if adj_a { a2.reversed_axes() } else { a2 };
        let b2 = if adj_b { b2.reversed_axes() } else { b2 };
        let mut c2 = c.view_mut();
        for &d in prefix {
            c2 = c2.index_axis_move(Axis(0), d);
        }
        let mut c2 = c2.into_dimensionality::<Ix2>()?;
        general_mat_mul(T::one(), &a2, &b2, T::zero(), &mut c2);
    }
    Ok(())
}
