//! Frame decoding through an ffmpeg subprocess.
//!
//! The video is probed once with `ffprobe` for its geometry, then decoded to
//! packed rgb24 over a rawvideo pipe. Every spawn passes an explicit argument
//! list; nothing goes through a shell.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use ndarray::Array3;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{MeteorError, Result};
use crate::frame::{Frame, FrameShape, SourceInfo, SourceKind};

use super::source::FrameSource;

/// Channels delivered by the rgb24 pipe.
const RGB_CHANNELS: usize = 3;

/// Locate the ffmpeg executable on PATH.
pub fn locate_ffmpeg() -> Result<PathBuf> {
    which::which("ffmpeg").map_err(|_| MeteorError::FfmpegNotFound)
}

fn locate_ffprobe() -> Result<PathBuf> {
    which::which("ffprobe").map_err(|_| MeteorError::FfmpegNotFound)
}

/// Geometry of the first video stream, as reported by ffprobe.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoProbe {
    pub width: usize,
    pub height: usize,
    pub fps: Option<f64>,
    pub frame_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<usize>,
    height: Option<usize>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

/// Probe the first video stream of `path`.
pub fn probe_video(path: &Path) -> Result<VideoProbe> {
    let ffprobe = locate_ffprobe()?;
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(MeteorError::Decode(format!(
            "ffprobe failed on {} ({})",
            path.display(),
            output.status
        )));
    }

    parse_probe(&output.stdout)
}

/// Parse ffprobe's `-print_format json -show_streams` output.
pub fn parse_probe(json: &[u8]) -> Result<VideoProbe> {
    let parsed: FfprobeOutput = serde_json::from_slice(json)
        .map_err(|e| MeteorError::Decode(format!("Unreadable ffprobe output: {e}")))?;
    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| MeteorError::Decode("No video stream".into()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        (w, h) => {
            return Err(MeteorError::InvalidDimensions {
                width: w.unwrap_or(0) as u32,
                height: h.unwrap_or(0) as u32,
            })
        }
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate));
    let frame_count = stream.nb_frames.as_deref().and_then(|n| n.parse().ok());

    Ok(VideoProbe {
        width,
        height,
        fps,
        frame_count,
    })
}

/// Parse an ffprobe rational such as `30000/1001`.
fn parse_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/').unwrap_or((rate, "1"));
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    (den != 0.0 && num > 0.0).then(|| num / den)
}

/// [`FrameSource`] decoding any ffmpeg-readable video to 8-bit RGB frames.
pub struct FfmpegSource {
    info: SourceInfo,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    buffer: Vec<u8>,
    next_index: usize,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> Result<Self> {
        let ffmpeg = locate_ffmpeg()?;
        let probe = probe_video(path)?;
        let shape = FrameShape {
            height: probe.height,
            width: probe.width,
            channels: RGB_CHANNELS,
            bit_depth: 8,
        };

        debug!(path = %path.display(), %shape, "Spawning ffmpeg decoder");
        let mut child = Command::new(ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        // Drain stderr so a chatty decoder never blocks on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        Ok(Self {
            info: SourceInfo {
                filename: path.to_path_buf(),
                kind: SourceKind::Video,
                shape,
                total_frames: probe.frame_count,
                fps: probe.fps,
            },
            child: Some(child),
            stdout,
            stderr,
            buffer: vec![0u8; shape.frame_byte_size()],
            next_index: 0,
        })
    }

    /// Wait for the decoder and turn a failed exit into an error.
    fn finish(&mut self) -> Result<()> {
        self.stdout = None;
        let status = match self.child.take() {
            Some(mut child) => child.wait()?,
            None => return Ok(()),
        };
        let diagnostics = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(MeteorError::Decode(format!(
                "ffmpeg exited with {status} after {} frames: {}",
                self.next_index,
                diagnostics.trim()
            )))
        }
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let filled = read_full(stdout, &mut self.buffer)?;
        if filled == 0 {
            self.finish()?;
            return Ok(None);
        }
        if filled < self.buffer.len() {
            self.finish()?;
            return Err(MeteorError::Decode(format!(
                "Truncated frame {}: {} of {} bytes",
                self.next_index,
                filled,
                self.buffer.len()
            )));
        }

        let shape = self.info.shape;
        let samples: Vec<f32> = self.buffer.iter().map(|&b| b as f32).collect();
        let data = Array3::from_shape_vec((shape.height, shape.width, shape.channels), samples)
            .map_err(|e| MeteorError::Decode(e.to_string()))?;

        let frame = Frame::new(data, shape.bit_depth, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(child) = self.child.as_mut() {
            // Closing early is normal; the decoder is simply stopped.
            if child.try_wait()?.is_none() {
                child.kill()?;
            }
        }
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            child.wait()?;
        }
        if let Some(handle) = self.stderr.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Failed to stop ffmpeg decoder");
        }
    }
}

/// Fill `buf` from `reader`, returning how many bytes were read before EOF.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
