use std::path::Path;

use crate::error::{MeteorError, Result};
use crate::frame::{Frame, FrameShape, SourceInfo};

use super::ffmpeg::FfmpegSource;
use super::ser::SerSource;

/// Sequential access to the frames of a recording.
pub trait FrameSource: Send {
    /// Shape and container metadata, known once the source is open.
    fn info(&self) -> &SourceInfo;

    /// Decode the next frame, or `None` at the end of the stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying file or decoder process.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn shape(&self) -> FrameShape {
        self.info().shape
    }
}

/// Open a recording, picking the reader from the file extension.
///
/// `.ser` files are memory mapped directly; everything else is decoded by an
/// ffmpeg subprocess.
pub fn open_source(path: &Path) -> Result<Box<dyn FrameSource>> {
    if !path.is_file() {
        return Err(MeteorError::InputNotFound(path.to_path_buf()));
    }
    if is_ser_path(path) {
        Ok(Box::new(SerSource::open(path)?))
    } else {
        Ok(Box::new(FfmpegSource::open(path)?))
    }
}

pub fn is_ser_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ser"))
}

/// Iterate all remaining frames of a source.
pub fn frames(source: &mut dyn FrameSource) -> impl Iterator<Item = Result<Frame>> + Send + '_ {
    std::iter::from_fn(move || source.next_frame().transpose())
}
