use std::path::Path;

use ndarray::{Array3, Zip};

use crate::error::{MeteorError, Result};
use crate::frame::Frame;
use crate::io::image_io::save_png;
use crate::io::source::FrameSource;

/// Pixelwise maximum over a run of frames: the trail a moving bright object
/// leaves across a clip.
#[derive(Clone, Debug, Default)]
pub struct Composite {
    data: Option<Array3<f32>>,
    bit_depth: u8,
    frames: usize,
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one frame in. The first frame fixes the shape of the
    /// accumulator, which starts at zero.
    pub fn accumulate(&mut self, frame: &Frame) -> Result<()> {
        let acc = self.data.get_or_insert_with(|| {
            Array3::zeros(frame.data.dim())
        });
        if acc.dim() != frame.data.dim() {
            return Err(MeteorError::FrameShapeMismatch {
                expected: acc.dim(),
                found: frame.data.dim(),
            });
        }

        Zip::from(acc)
            .and(&frame.data)
            .for_each(|a, &v| *a = a.max(v));
        self.bit_depth = self.bit_depth.max(frame.bit_depth);
        self.frames += 1;
        Ok(())
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn data(&self) -> Option<&Array3<f32>> {
        self.data.as_ref()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = self.data.as_ref().ok_or(MeteorError::EmptySequence)?;
        save_png(data, self.bit_depth, path)
    }
}

/// Composite every remaining frame of `source`.
pub fn composite_source(source: &mut dyn FrameSource) -> Result<Composite> {
    let mut composite = Composite::new();
    while let Some(frame) = source.next_frame()? {
        composite.accumulate(&frame)?;
    }
    if composite.frames() == 0 {
        return Err(MeteorError::EmptySequence);
    }
    Ok(composite)
}
