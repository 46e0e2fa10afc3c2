//! Lossless subclip cutting.

use std::ffi::OsString;
use std::io::Read;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::consts::TRIM_POLL_INTERVAL_MS;
use crate::error::{MeteorError, Result};
use crate::io::ffmpeg::locate_ffmpeg;
use crate::io::ser::SerReader;
use crate::io::ser_writer::SerWriter;
use crate::io::source::is_ser_path;

use super::config::ExtractionConfig;

/// One subclip to cut.
#[derive(Clone, Debug, PartialEq)]
pub struct TrimRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Source frames covered by the clip.
    pub frames: Range<usize>,
    /// Seconds from the start of the input.
    pub start_time: f64,
    /// Seconds.
    pub duration: f64,
}

/// Cuts a subclip without re-encoding.
pub trait Trimmer: Send + Sync {
    fn name(&self) -> &str;

    /// Produce `request.output`. Blocks until the clip is written or the
    /// attempt has failed.
    fn trim(&self, request: &TrimRequest) -> Result<()>;
}

/// Pick the trimmer for `input`: SER captures are cut natively, anything
/// else through ffmpeg stream copy.
pub fn trimmer_for(input: &Path, config: &ExtractionConfig) -> Result<Box<dyn Trimmer>> {
    if is_ser_path(input) {
        return Ok(Box::new(SerTrimmer));
    }
    let program = match &config.ffmpeg {
        Some(path) => path.clone(),
        None => locate_ffmpeg()?,
    };
    Ok(Box::new(FfmpegTrimmer::new(
        program,
        Duration::from_secs(config.timeout_secs),
    )))
}

/// Runs `ffmpeg -ss <start> -i <input> -t <duration> ... copy` as a
/// subprocess with a timeout.
#[derive(Clone, Debug)]
pub struct FfmpegTrimmer {
    program: PathBuf,
    timeout: Duration,
}

impl FfmpegTrimmer {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Argument list passed to the trimming program, in order.
    ///
    /// Seek comes before `-i` (fast input seek); every stream is mapped and
    /// copied as is.
    pub fn build_args(request: &TrimRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(14);
        args.push("-y".into());
        args.push("-ss".into());
        args.push(format!("{:.2}", request.start_time).into());
        args.push("-i".into());
        args.push(request.input.clone().into_os_string());
        args.push("-t".into());
        args.push(format!("{:.2}", request.duration).into());
        for flag in ["-map", "0", "-vcodec", "copy", "-acodec", "copy"] {
            args.push(flag.into());
        }
        args.push(request.output.clone().into_os_string());
        args
    }
}

impl Trimmer for FfmpegTrimmer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn trim(&self, request: &TrimRequest) -> Result<()> {
        let args = Self::build_args(request);
        debug!(program = %self.program.display(), ?args, "Running trimmer");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                MeteorError::TrimFailed(format!(
                    "cannot start {}: {e}",
                    self.program.display()
                ))
            })?;

        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        let poll = Duration::from_millis(TRIM_POLL_INTERVAL_MS);
        let status = match supervise(&mut child, self.timeout, poll) {
            Ok(Outcome::Exited(status)) => status,
            Ok(Outcome::TimedOut) => {
                warn!(
                    output = %request.output.display(),
                    timeout_secs = self.timeout.as_secs(),
                    "Trimmer timed out, process killed"
                );
                return Err(MeteorError::TrimTimeout(self.timeout.as_secs()));
            }
            Err(e) => {
                return Err(MeteorError::TrimFailed(format!(
                    "cannot poll {}: {e}",
                    self.program.display()
                )));
            }
        };

        let diagnostics = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(MeteorError::TrimFailed(format!(
                "{} exited with {status}: {}",
                self.program.display(),
                last_line(&diagnostics)
            )))
        }
    }
}

/// Handle on a running process, as polled by [`supervise`].
trait Supervised {
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>>;
    fn kill(&mut self) -> std::io::Result<()>;
    fn wait(&mut self) -> std::io::Result<ExitStatus>;
}

impl Supervised for Child {
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn kill(&mut self) -> std::io::Result<()> {
        Child::kill(self)
    }

    fn wait(&mut self) -> std::io::Result<ExitStatus> {
        Child::wait(self)
    }
}

#[derive(Debug)]
enum Outcome {
    Exited(ExitStatus),
    TimedOut,
}

/// Poll `process` until it exits or `timeout` passes. Whenever this returns
/// without an exit status the process has been killed and reaped.
fn supervise(
    process: &mut impl Supervised,
    timeout: Duration,
    poll: Duration,
) -> std::io::Result<Outcome> {
    let deadline = Instant::now() + timeout;
    loop {
        match process.try_wait() {
            Ok(Some(status)) => return Ok(Outcome::Exited(status)),
            Ok(None) => {}
            Err(e) => {
                reap(process);
                return Err(e);
            }
        }
        if Instant::now() >= deadline {
            reap(process);
            return Ok(Outcome::TimedOut);
        }
        std::thread::sleep(poll);
    }
}

fn reap(process: &mut impl Supervised) {
    let _ = process.kill();
    let _ = process.wait();
}

fn last_line(text: &str) -> &str {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim()
}

/// Copies the raw bytes of a frame range into a new SER file.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerTrimmer;

impl Trimmer for SerTrimmer {
    fn name(&self) -> &str {
        "ser"
    }

    fn trim(&self, request: &TrimRequest) -> Result<()> {
        let reader = SerReader::open(&request.input)?;
        let end = request.frames.end.min(reader.frame_count());
        let start = request.frames.start.min(end);
        if start == end {
            return Err(MeteorError::TrimFailed(format!(
                "frames {:?} are outside the {} frame capture",
                request.frames,
                reader.frame_count()
            )));
        }

        let mut header = reader.header.clone();
        header.frame_count = (end - start) as u32;

        let mut writer = SerWriter::create(&request.output, &header)?;
        for index in start..end {
            writer.write_raw_frame(reader.frame_raw(index)?)?;
        }
        let timestamps: Option<Vec<u64>> =
            (start..end).map(|i| reader.read_timestamp(i)).collect();
        if let Some(timestamps) = timestamps {
            writer.write_timestamps(&timestamps)?;
        }
        writer.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Process whose status can never be read.
    #[derive(Default)]
    struct Unpollable {
        polls: usize,
        killed: bool,
        reaped: bool,
    }

    impl Supervised for Unpollable {
        fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
            self.polls += 1;
            Err(std::io::Error::other("status unavailable"))
        }

        fn kill(&mut self) -> std::io::Result<()> {
            self.killed = true;
            Ok(())
        }

        fn wait(&mut self) -> std::io::Result<ExitStatus> {
            self.reaped = true;
            Err(std::io::Error::other("status unavailable"))
        }
    }

    /// Process that never exits on its own.
    #[derive(Default)]
    struct Hung {
        killed: bool,
        reaped: bool,
    }

    impl Supervised for Hung {
        fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
            Ok(None)
        }

        fn kill(&mut self) -> std::io::Result<()> {
            self.killed = true;
            Ok(())
        }

        fn wait(&mut self) -> std::io::Result<ExitStatus> {
            self.reaped = true;
            Err(std::io::Error::other("no status"))
        }
    }

    #[test]
    fn test_poll_error_kills_and_reaps() {
        let mut process = Unpollable::default();
        let err = supervise(&mut process, Duration::from_secs(60), Duration::ZERO).unwrap_err();
        assert_eq!(err.to_string(), "status unavailable");
        assert_eq!(process.polls, 1);
        assert!(process.killed);
        assert!(process.reaped);
    }

    #[test]
    fn test_deadline_kills_and_reaps() {
        let mut process = Hung::default();
        let outcome = supervise(&mut process, Duration::ZERO, Duration::ZERO).unwrap();
        assert!(matches!(outcome, Outcome::TimedOut));
        assert!(process.killed);
        assert!(process.reaped);
    }

    #[test]
    fn test_last_line_skips_trailing_blanks() {
        assert_eq!(last_line("first\n  second  \n\n"), "second");
        assert_eq!(last_line(""), "");
    }
}
