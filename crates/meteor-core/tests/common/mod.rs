use std::path::{Path, PathBuf};

use meteor_core::frame::Frame;
use meteor_core::io::ser::SER_HEADER_SIZE;
use meteor_core::series::MetricSeries;
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Build a SER file header for mono 8-bit frames.
///
/// Returns a `Vec<u8>` containing just the 178-byte header.
/// Append frame pixel data after calling this function.
pub fn build_ser_header(width: u32, height: u32, num_frames: usize) -> Vec<u8> {
    build_ser_header_full(width, height, 8, num_frames, 0)
}

/// Build a SER file header with configurable bit depth and color mode.
///
/// `color_id`: 0=MONO, 8=BAYER_RGGB, 100=RGB, 101=BGR
pub fn build_ser_header_full(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0 (little-endian per Siril convention)
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer, Instrument, Telescope (40 bytes each)
    buf.extend_from_slice(&[0u8; 120]);
    // DateTime, DateTimeUTC
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Build a complete synthetic mono 8-bit SER file with the given frame data.
pub fn build_ser_with_frames(width: u32, height: u32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_ser_header(width, height, frames.len());
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    buf
}

/// Write a SER buffer as `dir/name` and return its path.
pub fn write_ser_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("write SER data");
    path
}

/// Mono 8-bit noise frames with a deterministic seed per frame.
pub fn noise_frames_u8(width: usize, height: usize, count: usize, seed: u64) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed + i as u64);
            (0..width * height)
                .map(|_| rng.random_range(10..60))
                .collect()
        })
        .collect()
}

/// Uniform noise in `[0, 100)`.
pub fn noise_plane(height: usize, width: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((height, width), |_| rng.random_range(0.0..100.0))
}

pub fn noise_frame(height: usize, width: usize, seed: u64, index: usize) -> Frame {
    Frame::from_plane(noise_plane(height, width, seed), 8, index)
}

pub fn rgb_frame(data: Array3<f32>, index: usize) -> Frame {
    Frame::new(data, 8, index)
}

/// `len` zeros with `value` over `spike`.
pub fn spike_series(len: usize, spike: std::ops::Range<usize>, value: f64) -> MetricSeries {
    MetricSeries::from_metrics((0..len).map(|i| if spike.contains(&i) { value } else { 0.0 }))
}
