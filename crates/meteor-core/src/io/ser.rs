use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::Array3;

use crate::error::{MeteorError, Result};
use crate::frame::{Frame, FrameShape, SourceInfo, SourceKind};

use super::source::FrameSource;

pub const SER_HEADER_SIZE: usize = 178;
pub const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// Sample layout declared by the SER ColorID field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerLayout {
    Mono,
    /// Any of the Bayer mosaics. Kept as one raw plane.
    Bayer,
    Rgb,
    Bgr,
}

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
    pub date_time: u64,
    pub date_time_utc: u64,
}

impl SerHeader {
    /// Bytes per pixel plane (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_pixel_plane(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Number of planes per pixel (1 for mono/bayer, 3 for RGB/BGR).
    pub fn planes_per_pixel(&self) -> usize {
        match self.layout() {
            SerLayout::Rgb | SerLayout::Bgr => 3,
            SerLayout::Mono | SerLayout::Bayer => 1,
        }
    }

    /// Total bytes per frame.
    pub fn frame_byte_size(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.bytes_per_pixel_plane()
            * self.planes_per_pixel()
    }

    pub fn layout(&self) -> SerLayout {
        match self.color_id {
            8..=19 => SerLayout::Bayer,
            100 => SerLayout::Rgb,
            101 => SerLayout::Bgr,
            _ => SerLayout::Mono,
        }
    }

    pub fn shape(&self) -> FrameShape {
        FrameShape {
            height: self.height as usize,
            width: self.width as usize,
            channels: self.planes_per_pixel(),
            bit_depth: if self.pixel_depth <= 8 { 8 } else { 16 },
        }
    }
}

/// Memory-mapped SER file reader.
pub struct SerReader {
    mmap: Mmap,
    pub header: SerHeader,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // The mapping is read-only and the file is not resized while open.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(MeteorError::InvalidSer(
                "File too small for SER header".into(),
            ));
        }

        if &mmap[0..14] != SER_MAGIC {
            return Err(MeteorError::InvalidSer(
                "Missing LUCAM-RECORDER magic".into(),
            ));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;

        let expected_data_size =
            SER_HEADER_SIZE + header.frame_byte_size() * header.frame_count as usize;
        if mmap.len() < expected_data_size {
            return Err(MeteorError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        Ok(Self { mmap, header })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Get the raw bytes for a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(MeteorError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        let offset = SER_HEADER_SIZE + index * self.header.frame_byte_size();
        let end = offset + self.header.frame_byte_size();
        Ok(&self.mmap[offset..end])
    }

    /// Read a single frame with raw sample values, channels in RGB order.
    pub fn read_frame(&self, index: usize) -> Result<Frame> {
        let raw = self.frame_raw(index)?;
        let shape = self.header.shape();
        let data = decode_interleaved(
            raw,
            shape,
            self.header.bytes_per_pixel_plane(),
            self.header.little_endian,
            self.header.layout() == SerLayout::Bgr,
        );
        Ok(Frame::new(data, shape.bit_depth, index))
    }

    /// Per-frame timestamp from the optional trailer.
    pub fn read_timestamp(&self, index: usize) -> Option<u64> {
        let trailer_offset =
            SER_HEADER_SIZE + self.header.frame_byte_size() * self.header.frame_count as usize;
        let ts_offset = trailer_offset + index * 8;
        if ts_offset + 8 <= self.mmap.len() {
            let bytes = &self.mmap[ts_offset..ts_offset + 8];
            Some(u64::from_le_bytes(bytes.try_into().ok()?))
        } else {
            None
        }
    }

    pub fn source_info(&self, path: &Path) -> SourceInfo {
        SourceInfo {
            filename: path.to_path_buf(),
            kind: SourceKind::Ser,
            shape: self.header.shape(),
            total_frames: Some(self.frame_count()),
            fps: None,
        }
    }
}

/// [`FrameSource`] over a SER file, yielding frames in file order.
pub struct SerSource {
    reader: SerReader,
    info: SourceInfo,
    cursor: usize,
}

impl SerSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = SerReader::open(path)?;
        let info = reader.source_info(path);
        Ok(Self {
            reader,
            info,
            cursor: 0,
        })
    }
}

impl FrameSource for SerSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.cursor >= self.reader.frame_count() {
            return Ok(None);
        }
        let frame = self.reader.read_frame(self.cursor)?;
        self.cursor += 1;
        Ok(Some(frame))
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()? as u32;
    let height = cursor.read_i32::<LittleEndian>()? as u32;
    let pixel_depth = cursor.read_i32::<LittleEndian>()? as u32;
    let frame_count = cursor.read_i32::<LittleEndian>()? as u32;

    let observer = read_fixed_string(&buf[42..82]);
    let instrument = read_fixed_string(&buf[82..122]);
    let telescope = read_fixed_string(&buf[122..162]);

    let mut cursor = std::io::Cursor::new(&buf[162..]);
    let date_time = cursor.read_u64::<LittleEndian>()?;
    let date_time_utc = cursor.read_u64::<LittleEndian>()?;

    if width == 0 || height == 0 {
        return Err(MeteorError::InvalidDimensions { width, height });
    }
    if pixel_depth == 0 || pixel_depth > 16 {
        return Err(MeteorError::InvalidSer(format!(
            "Unsupported pixel depth {pixel_depth}"
        )));
    }

    // Siril convention: 0 means little-endian despite what the format notes say.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width,
        height,
        pixel_depth,
        frame_count,
        observer,
        instrument,
        telescope,
        date_time,
        date_time_utc,
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn decode_interleaved(
    raw: &[u8],
    shape: FrameShape,
    bytes_per_sample: usize,
    little_endian: bool,
    swap_red_blue: bool,
) -> Array3<f32> {
    let planes = shape.channels;
    let mut data = Array3::<f32>::zeros((shape.height, shape.width, planes));

    for ((row, col, plane), value) in data.indexed_iter_mut() {
        // BGR captures are stored blue first; expose them as RGB.
        let src_plane = if swap_red_blue { planes - 1 - plane } else { plane };
        let idx = ((row * shape.width + col) * planes + src_plane) * bytes_per_sample;
        *value = if bytes_per_sample == 1 {
            raw[idx] as f32
        } else {
            let pair = [raw[idx], raw[idx + 1]];
            if little_endian {
                u16::from_le_bytes(pair) as f32
            } else {
                u16::from_be_bytes(pair) as f32
            }
        };
    }

    data
}
