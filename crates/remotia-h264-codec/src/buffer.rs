use log::debug;

use crate::H264Error;

pub const BYTES_PER_PIXEL: usize = 4;

/// Grow-only XRGB32 frame buffer.
///
/// The allocation is replaced only when a frame needs more bytes than it
/// holds, so consecutive frames of the same size are written in place.
/// `scanline` is always `width * 4` and the allocation always covers
/// `scanline * height` bytes.
#[derive(Debug)]
pub struct FrameBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    scanline: usize,
    allocations: usize,
}

fn allocate(size: usize) -> Result<Vec<u8>, H264Error> {
    let mut data = Vec::new();
    data.try_reserve_exact(size)
        .map_err(|_| H264Error::AllocationFailure)?;
    data.resize(size, 0);
    Ok(data)
}

fn frame_size(width: usize, height: usize) -> Result<(usize, usize), H264Error> {
    let scanline = width
        .checked_mul(BYTES_PER_PIXEL)
        .ok_or(H264Error::AllocationFailure)?;
    let size = scanline
        .checked_mul(height)
        .ok_or(H264Error::AllocationFailure)?;

    Ok((scanline, size))
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Result<Self, H264Error> {
        let (scanline, size) = frame_size(width, height)?;

        Ok(Self {
            data: allocate(size)?,
            width,
            height,
            scanline,
            allocations: 1,
        })
    }

    /// Makes room for a `width` x `height` frame.
    ///
    /// Returns whether the allocation had to grow. On failure the buffer and
    /// its dimensions are left as they were.
    pub fn prepare(&mut self, width: usize, height: usize) -> Result<bool, H264Error> {
        let (scanline, size) = frame_size(width, height)?;

        let grown = size > self.data.len();
        if grown {
            debug!(
                "Growing frame buffer from {} to {} bytes ({}x{})",
                self.data.len(),
                size,
                width,
                height
            );

            self.data = allocate(size)?;
            self.allocations += 1;
        }

        self.width = width;
        self.height = height;
        self.scanline = scanline;

        Ok(grown)
    }

    pub(crate) fn release(&mut self) {
        self.data = Vec::new();
        self.width = 0;
        self.height = 0;
        self.scanline = 0;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn scanline(&self) -> usize {
        self.scanline
    }

    /// Size in bytes of the current allocation.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of allocations performed since creation.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// The `scanline * height` bytes of the current frame.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.scanline * self.height]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.scanline * self.height;
        &mut self.data[..len]
    }
}
