/// Side length of the noise-normalization kernel (every entry is `1/s`).
pub const NORMALIZATION_KERNEL_SIZE: usize = 7;

/// 3x3 Laplacian edge kernel: 8 at the center, -1 elsewhere.
pub const LAPLACIAN_KERNEL: [[f64; 3]; 3] = [
    [-1.0, -1.0, -1.0],
    [-1.0, 8.0, -1.0],
    [-1.0, -1.0, -1.0],
];

/// Gain applied to |v| in the first step of the rectifying gate.
pub const RECTIFIER_GAIN: f64 = -0.99;

/// 7x7 matched point-source filter. Literal values; flipped on both axes
/// before convolution.
pub const MATCHED_FILTER: [[f64; 7]; 7] = [
    [-99.0, -90.0, -93.0, -118.0, -92.0, -90.0, -99.0],
    [-105.0, -79.0, -98.0, -170.0, -98.0, -79.0, -105.0],
    [-112.0, -99.0, -122.0, -122.0, -122.0, -99.0, -112.0],
    [-118.0, -170.0, -122.0, -255.0, -122.0, -170.0, -118.0],
    [-112.0, -99.0, -122.0, -122.0, -122.0, -99.0, -112.0],
    [-105.0, -79.0, -98.0, -170.0, -98.0, -79.0, -105.0],
    [-99.0, -90.0, -93.0, -118.0, -92.0, -90.0, -99.0],
];

/// Total shrink per spatial dimension across the three valid convolutions
/// (7, 3 and 7 wide).
pub const METRIC_SHRINK: usize = (NORMALIZATION_KERNEL_SIZE - 1) + (3 - 1) + (7 - 1);

/// Smallest reduced-frame side that still leaves a 1x1 residual map.
pub const MIN_FRAME_SIDE: usize = METRIC_SHRINK + 1;

/// Default frame rate of the recordings, frames per second.
pub const DEFAULT_FPS: f64 = 25.0;

/// Default chunk length in frames (two minutes at 25 fps).
pub const DEFAULT_CHUNK_SIZE: usize = 3000;

/// Default sliding-window length, in fitted samples.
pub const DEFAULT_WINDOW: usize = 5;

/// Degree of the per-chunk least-squares polynomial.
pub const POLYNOMIAL_DEGREE: usize = 7;

/// Default sensitivity for the raw mean + alpha * std threshold.
pub const DEFAULT_FIXED_SENSITIVITY: f64 = 3.7;

/// Default sensitivity for the max-normalized threshold.
pub const DEFAULT_NORMALIZED_SENSITIVITY: f64 = 1.0;

/// Fraction of frames allowed to fail before the scan is declared degraded.
pub const DEFAULT_MAX_FAILURE_RATIO: f64 = 0.1;

/// Pending-frame bound per worker when `max_pending` is not configured.
pub const PENDING_FRAMES_PER_WORKER: usize = 2;

/// Default wall-clock limit for a single trimming subprocess, in seconds.
pub const DEFAULT_TRIM_TIMEOUT_SECS: u64 = 600;

/// Poll interval while waiting on a trimming subprocess.
pub const TRIM_POLL_INTERVAL_MS: u64 = 50;

/// Default metric table file name.
pub const DEFAULT_METRIC_TABLE: &str = "data.csv.gz";

/// Extension used for clips cut from inputs without one.
pub const DEFAULT_CLIP_EXTENSION: &str = "mp4";

/// Extension of the composite trail images.
pub const COMPOSITE_EXTENSION: &str = "png";
