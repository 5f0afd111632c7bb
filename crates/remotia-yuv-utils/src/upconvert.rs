//! Chroma upsampling from 4:2:0 to 4:4:4.
//!
//! Every output sample is a 3:1 linear blend of the two nearest input samples
//! along each axis, first horizontally then vertically. Edge samples are
//! replicated.

use crate::{raster::check_plane, RasterError};

#[inline]
fn blend(near: u8, far: u8) -> u8 {
    ((3 * near as u16 + far as u16 + 2) >> 2) as u8
}

fn upconvert_row(src: &[u8], dst: &mut [u8]) {
    let width = src.len();

    dst[0] = src[0];
    for i in 1..width {
        dst[2 * i - 1] = blend(src[i - 1], src[i]);
        dst[2 * i] = blend(src[i], src[i - 1]);
    }
    dst[2 * width - 1] = src[width - 1];
}

/// Upsamples a `width` x `height` chroma plane to `2 * width` x `2 * height`.
///
/// The returned plane is tightly packed. `stride` is the distance between two
/// rows of the input plane. Empty planes produce an empty output; a plane too
/// short for its size is reported as [`RasterError::PlaneTooSmall`] on plane
/// `'C'`.
pub fn convert_420_to_444(
    chroma: &[u8],
    width: usize,
    height: usize,
    stride: usize,
) -> Result<Vec<u8>, RasterError> {
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    check_plane('C', chroma, stride, width, height)?;

    let out_width = width * 2;
    let out_height = height * 2;
    let out_size = out_width
        .checked_mul(out_height)
        .ok_or(RasterError::DestinationTooSmall {
            required: usize::MAX,
            available: 0,
        })?;

    let horizontal: Vec<Vec<u8>> = (0..height)
        .map(|j| {
            let mut row = vec![0; out_width];
            upconvert_row(&chroma[j * stride..j * stride + width], &mut row);
            row
        })
        .collect();

    let mut output = vec![0; out_size];
    let mut rows = output.chunks_exact_mut(out_width);

    if let Some(first) = rows.next() {
        first.copy_from_slice(&horizontal[0]);
    }

    for pair in horizontal.windows(2) {
        let (upper, lower) = (&pair[0], &pair[1]);

        if let Some(row) = rows.next() {
            row.iter_mut()
                .zip(upper.iter().zip(lower))
                .for_each(|(out, (a, b))| *out = blend(*a, *b));
        }

        if let Some(row) = rows.next() {
            row.iter_mut()
                .zip(upper.iter().zip(lower))
                .for_each(|(out, (a, b))| *out = blend(*b, *a));
        }
    }

    if let Some(last) = rows.next() {
        last.copy_from_slice(&horizontal[height - 1]);
    }

    Ok(output)
}
