//! Batch to space rearrangement.
use tract_delegate_data::internal::*;
use tract_ndarray::{s, ArrayViewD, ArrayViewMutD, Axis, Ix4};

/// Move blocks of the batch axis into the spatial axes, then crop.
///
/// Input is `[batch, height, width, depth]` or `[batch, height, depth]`, in
/// which case `block` and `crops` have a single entry. The output must
/// already have the cropped shape.
pub fn batch_to_space_nd<T: Datum>(
    input: ArrayViewD<T>,
    block: &[usize],
    crops: &[(usize, usize)],
    output: ArrayViewMutD<T>,
) -> TractResult<()> {
    ensure!(
        input.ndim() == 3 || input.ndim() == 4,
        "BatchToSpaceNd expects a rank 3 or 4 input, got {:?}",
        input.shape()
    );
    ensure!(
        block.len() == input.ndim() - 2 && crops.len() == block.len(),
        "BatchToSpaceNd block {:?} and crops {:?} do not fit input {:?}",
        block,
        crops,
        input.shape()
    );
    ensure!(output.ndim() == input.ndim(), "BatchToSpaceNd input and output rank differ");
    let (input, output, block, crops) = if input.ndim() == 3 {
        (
            input.insert_axis(Axis(2)),
            output.insert_axis(Axis(2)),
            [block[0], 1],
            [crops[0], (0, 0)],
        )
    } else {
        (input, output, [block[0], block[1]], [crops[0], crops[1]])
    };
    let input = input.into_dimensionality::<Ix4>()?;
    let mut output = output.into_dimensionality::<Ix4>()?;
    let (in_batch, in_h, in_w, depth) = input.dim();
    let (out_batch, out_h, out_w, out_depth) = output.dim();
    ensure!(block.iter().all(|&b| b > 0), "Block sizes must be positive");
    ensure!(
        out_batch * block[0] * block[1] == in_batch && depth == out_depth,
        "BatchToSpaceNd output shape {:?} inconsistent with input {:?}",
        output.shape(),
        input.shape()
    );
    for b in 0..in_batch {
        let ob = b % out_batch;
        let spatial_offset = b / out_batch;
        for y in 0..in_h {
            let oy = (y * block[0] + spatial_offset / block[1]) as isize - crops[0].0 as isize;
            if oy < 0 || oy >= out_h as isize {
                continue;
            }
            for x in 0..in_w {
                let ox = (x * block[1] + spatial_offset % block[1]) as isize - crops[1].0 as isize;
                if ox < 0 || ox >= out_w as isize {
                    continue;
                }
                output
                    .slice_mut(s![ob, oy as usize, ox as usize, ..])
                    .assign(&input.slice(s![b, y, x, ..]));
            }
        }
    }
    Ok(())
}
