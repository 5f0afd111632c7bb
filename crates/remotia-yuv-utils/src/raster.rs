use log::debug;
use rayon::prelude::*;

use crate::{pixel, RasterError};

/// Borrowed view of an I420 picture as produced by H.264 decoders.
///
/// The U and V planes share `uv_stride` and are subsampled 2:1 in both axes.
#[derive(Debug, Clone, Copy)]
pub struct YuvPlanes<'a> {
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
    pub y_stride: usize,
    pub uv_stride: usize,
}

/// Target rectangle inside a packed 32 bit frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrgbRect {
    pub step: usize,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl XrgbRect {
    /// Full frame of `width` x `height` pixels with a tightly packed step.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            step: width.saturating_mul(4),
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Bytes of destination the rectangle spans, `None` on overflow.
    fn required_len(&self) -> Option<usize> {
        if self.width == 0 || self.height == 0 {
            return Some(0);
        }

        let last_row = self.y.checked_add(self.height - 1)?.checked_mul(self.step)?;
        last_row.checked_add(self.row_end()?)
    }

    fn row_end(&self) -> Option<usize> {
        self.x.checked_add(self.width)?.checked_mul(4)
    }
}

/// Number of chroma samples covering `luma` samples along one axis.
///
/// Odd dimensions round up: the last luma column (or row) owns a chroma
/// sample on its own.
#[inline]
pub fn chroma_extent(luma: usize) -> usize {
    luma / 2 + luma % 2
}

/// Checks that `data` holds `height` rows of `width` samples laid out
/// `stride` bytes apart. Sizes that overflow are reported as too small.
pub(crate) fn check_plane(
    plane: char,
    data: &[u8],
    stride: usize,
    width: usize,
    height: usize,
) -> Result<(), RasterError> {
    if stride < width {
        return Err(RasterError::StrideTooSmall {
            plane,
            stride,
            width,
        });
    }

    let required = (height - 1)
        .checked_mul(stride)
        .and_then(|rows| rows.checked_add(width))
        .unwrap_or(usize::MAX);
    if data.len() < required {
        return Err(RasterError::PlaneTooSmall {
            plane,
            required,
            available: data.len(),
        });
    }

    Ok(())
}

/// Checks that `planes` hold a whole `width` x `height` picture.
pub fn validate_planes(planes: &YuvPlanes, width: usize, height: usize) -> Result<(), RasterError> {
    if width == 0 || height == 0 {
        return Ok(());
    }

    let chroma_width = chroma_extent(width);
    let chroma_height = chroma_extent(height);

    check_plane('Y', planes.y, planes.y_stride, width, height)?;
    check_plane('U', planes.u, planes.uv_stride, chroma_width, chroma_height)?;
    check_plane('V', planes.v, planes.uv_stride, chroma_width, chroma_height)?;

    Ok(())
}

/// Converts an I420 picture into packed XRGB32 pixels.
///
/// One destination pixel is produced per luma sample of the `rect.width` x
/// `rect.height` area, written at (`rect.x`, `rect.y`) of `dst`. Each 2x2 block
/// of luma samples shares the chroma pair at `(x / 2, y / 2)`.
///
/// Odd widths or heights are accepted: the trailing column or row reuses the
/// chroma sample of its block, which requires the chroma planes to cover
/// `ceil(width / 2)` x `ceil(height / 2)` samples.
///
/// Rows are converted in parallel; the call returns once the whole rectangle
/// has been written.
pub fn copy_yuv420p_to_xrgb(
    planes: &YuvPlanes,
    dst: &mut [u8],
    rect: XrgbRect,
) -> Result<(), RasterError> {
    let XrgbRect {
        step,
        x: dst_x,
        y: dst_y,
        width,
        height,
    } = rect;

    if width == 0 || height == 0 {
        return Ok(());
    }

    if rect.row_end().map_or(true, |row_end| step < row_end) {
        return Err(RasterError::DestinationStepTooSmall {
            step,
            width: dst_x.saturating_add(width),
        });
    }

    let required = rect.required_len().unwrap_or(usize::MAX);
    if dst.len() < required {
        return Err(RasterError::DestinationTooSmall {
            required,
            available: dst.len(),
        });
    }

    validate_planes(planes, width, height)?;

    if width % 2 != 0 || height % 2 != 0 {
        debug!(
            "Converting odd sized {}x{} picture, trailing chroma samples are reused",
            width, height
        );
    }

    let row_offset = dst_x * 4;
    let row_bytes = width * 4;

    dst[dst_y * step..required]
        .par_chunks_mut(step)
        .take(height)
        .enumerate()
        .for_each(|(row, line)| {
            let y_row = &planes.y[row * planes.y_stride..][..width];
            let u_row = &planes.u[(row / 2) * planes.uv_stride..];
            let v_row = &planes.v[(row / 2) * planes.uv_stride..];

            let pixels = line[row_offset..row_offset + row_bytes].chunks_exact_mut(4);

            for (column, (pixel, luma)) in pixels.zip(y_row).enumerate() {
                let word = pixel::yuv_to_xrgb(*luma, u_row[column / 2], v_row[column / 2]);
                pixel.copy_from_slice(&word.to_le_bytes());
            }
        });

    Ok(())
}

/// Converts a whole I420 picture into a newly allocated, tightly packed frame.
pub fn yuv420p_to_xrgb_frame(
    planes: &YuvPlanes,
    width: usize,
    height: usize,
) -> Result<Vec<u8>, RasterError> {
    let size = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or(RasterError::DestinationTooSmall {
            required: usize::MAX,
            available: 0,
        })?;
    let mut frame = vec![0; size];
    copy_yuv420p_to_xrgb(planes, &mut frame, XrgbRect::full(width, height))?;
    Ok(frame)
}
