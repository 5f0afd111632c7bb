//! Optional per-frame dumps of the decoder input and output.
//!
//! Dumps are best effort: write failures are logged and never change the
//! outcome of a decode call.

use std::{
    fs::{create_dir_all, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    pub enabled: bool,
    pub folder: PathBuf,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            folder: PathBuf::from("/tmp/wlog"),
        }
    }
}

impl DumpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // Building functions
    pub fn enabled(mut self, value: bool) -> Self {
        self.enabled = value;
        self
    }

    pub fn folder<P: Into<PathBuf>>(mut self, folder: P) -> Self {
        self.folder = folder.into();
        self
    }
}

/// Writes the dumps of a single context and numbers its frames.
///
/// Each successfully decoded frame `N` may produce `bs_N.h264` (decoder
/// input), `H264_N.ppm` (luma plane, grayscale) and `H264_N_rgb.ppm`
/// (converted frame).
#[derive(Debug, Default)]
pub struct FrameDumper {
    config: DumpConfig,
    frame_id: u64,
}

impl FrameDumper {
    pub fn new(config: DumpConfig) -> Self {
        Self {
            config,
            frame_id: 0,
        }
    }

    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Number of frames decoded so far by the owning context.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub(crate) fn advance(&mut self) {
        self.frame_id += 1;
    }

    pub fn bitstream_path(&self) -> PathBuf {
        self.config.folder.join(format!("bs_{}.h264", self.frame_id))
    }

    pub fn luma_path(&self) -> PathBuf {
        self.config.folder.join(format!("H264_{}.ppm", self.frame_id))
    }

    pub fn rgb_path(&self) -> PathBuf {
        self.config
            .folder
            .join(format!("H264_{}_rgb.ppm", self.frame_id))
    }

    pub fn dump_bitstream(&self, data: &[u8]) {
        if !self.config.enabled {
            return;
        }

        let path = self.bitstream_path();
        self.report(&path, write_file(&path, |writer| writer.write_all(data)));
    }

    pub fn dump_luma(&self, luma: &[u8], stride: usize, width: usize, height: usize) {
        if !self.config.enabled {
            return;
        }

        let path = self.luma_path();
        let result = write_file(&path, |writer| {
            write!(writer, "P5\n{} {}\n255\n", width, height)?;
            for row in luma.chunks(stride.max(1)).take(height) {
                writer.write_all(&row[..width.min(row.len())])?;
            }
            Ok(())
        });

        self.report(&path, result);
    }

    pub fn dump_xrgb(&self, frame: &[u8], scanline: usize, width: usize, height: usize) {
        if !self.config.enabled {
            return;
        }

        let path = self.rgb_path();
        let result = write_file(&path, |writer| {
            write!(writer, "P6\n{} {}\n255\n", width, height)?;
            for row in frame.chunks(scanline.max(1)).take(height) {
                for pixel in row.chunks_exact(4).take(width) {
                    // XRGB32 is stored little endian: B, G, R, X
                    writer.write_all(&[pixel[2], pixel[1], pixel[0]])?;
                }
            }
            Ok(())
        });

        self.report(&path, result);
    }

    fn report(&self, path: &Path, result: io::Result<()>) {
        match result {
            Ok(_) => debug!("Dumped frame {} to {}", self.frame_id, path.display()),
            Err(err) => warn!("Unable to dump frame {} to {}: {}", self.frame_id, path.display(), err),
        }
    }
}

fn write_file<F>(path: &Path, contents: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    if let Some(folder) = path.parent() {
        create_dir_all(folder)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    contents(&mut writer)?;
    writer.flush()
}
