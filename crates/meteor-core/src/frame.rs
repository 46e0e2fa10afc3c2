use ndarray::{Array2, Array3, Axis};
use std::path::PathBuf;

/// A single decoded video frame.
/// Samples keep their raw integer range (0..255 for 8-bit, 0..65535 for 16-bit).
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, shape = (height, width, channels)
    pub data: Array3<f32>,
    /// Bit depth of the source samples (8 or 16)
    pub bit_depth: u8,
    /// Position of the frame in the source
    pub index: usize,
}

impl Frame {
    pub fn new(data: Array3<f32>, bit_depth: u8, index: usize) -> Self {
        Self {
            data,
            bit_depth,
            index,
        }
    }

    /// Wrap a single-channel plane.
    pub fn from_plane(plane: Array2<f32>, bit_depth: u8, index: usize) -> Self {
        Self::new(plane.insert_axis(Axis(2)), bit_depth, index)
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn shape(&self) -> FrameShape {
        FrameShape {
            height: self.height(),
            width: self.width(),
            channels: self.channels(),
            bit_depth: self.bit_depth,
        }
    }
}

/// Geometry and sample format shared by every frame of a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub bit_depth: u8,
}

impl FrameShape {
    /// Bytes of one packed frame (8-bit samples use one byte, deeper ones two).
    pub fn frame_byte_size(&self) -> usize {
        let bytes_per_sample = if self.bit_depth <= 8 { 1 } else { 2 };
        self.height * self.width * self.channels * bytes_per_sample
    }
}

impl std::fmt::Display for FrameShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}x{} @ {}-bit",
            self.width, self.height, self.channels, self.bit_depth
        )
    }
}

/// Container format of a frame source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Anything ffmpeg can demux, decoded to rgb24.
    Video,
    /// Raw SER capture.
    Ser,
}

/// Metadata about an opened source.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub filename: PathBuf,
    pub kind: SourceKind,
    pub shape: FrameShape,
    /// Frame count, when the container declares one.
    pub total_frames: Option<usize>,
    /// Nominal frame rate, when the container declares one.
    pub fps: Option<f64>,
}
