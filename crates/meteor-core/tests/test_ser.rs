#[allow(dead_code)]
mod common;

use tempfile::TempDir;

use meteor_core::error::MeteorError;
use meteor_core::extract::{trimmer_for, ExtractionConfig, SerTrimmer, TrimRequest, Trimmer};
use meteor_core::frame::SourceKind;
use meteor_core::io::ser::{SerLayout, SerReader};
use meteor_core::io::ser_writer::SerWriter;
use meteor_core::io::{frames, open_source};

#[test]
fn test_read_mono_frames() {
    let tmp = TempDir::new().unwrap();
    let data = common::noise_frames_u8(6, 4, 3, 10);
    let path = common::write_ser_file(
        tmp.path(),
        "mono.ser",
        &common::build_ser_with_frames(6, 4, &data),
    );

    let reader = SerReader::open(&path).unwrap();
    assert_eq!(reader.frame_count(), 3);
    assert_eq!(reader.header.layout(), SerLayout::Mono);

    let frame = reader.read_frame(1).unwrap();
    assert_eq!(frame.data.dim(), (4, 6, 1));
    assert_eq!(frame.index, 1);
    assert_eq!(frame.bit_depth, 8);
    // Raw sample values, row-major.
    assert_eq!(frame.data[[2, 3, 0]], f32::from(data[1][2 * 6 + 3]));

    assert!(matches!(
        reader.read_frame(3),
        Err(MeteorError::FrameIndexOutOfRange { index: 3, total: 3 })
    ));
}

#[test]
fn test_bgr_is_reordered_to_rgb() {
    let tmp = TempDir::new().unwrap();
    let mut buf = common::build_ser_header_full(2, 1, 16, 1, 101);
    // Two pixels, B G R order, 16-bit little-endian.
    for sample in [100u16, 200, 300, 1000, 2000, 3000] {
        buf.extend_from_slice(&sample.to_le_bytes());
    }
    let path = common::write_ser_file(tmp.path(), "bgr.ser", &buf);

    let reader = SerReader::open(&path).unwrap();
    assert_eq!(reader.header.layout(), SerLayout::Bgr);
    let frame = reader.read_frame(0).unwrap();
    assert_eq!(frame.data.dim(), (1, 2, 3));
    assert_eq!(frame.bit_depth, 16);
    assert_eq!(
        frame.data.iter().copied().collect::<Vec<f32>>(),
        vec![300.0, 200.0, 100.0, 3000.0, 2000.0, 1000.0]
    );
}

#[test]
fn test_source_yields_frames_in_order() {
    let tmp = TempDir::new().unwrap();
    let data = common::noise_frames_u8(5, 5, 7, 0);
    let path = common::write_ser_file(
        tmp.path(),
        "seq.ser",
        &common::build_ser_with_frames(5, 5, &data),
    );

    let mut source = open_source(&path).unwrap();
    let info = source.info().clone();
    assert_eq!(info.kind, SourceKind::Ser);
    assert_eq!(info.total_frames, Some(7));
    assert_eq!(info.shape.channels, 1);

    let indices: Vec<usize> = frames(source.as_mut()).map(|f| f.unwrap().index).collect();
    assert_eq!(indices, (0..7).collect::<Vec<_>>());
    assert!(source.next_frame().unwrap().is_none());
    source.close().unwrap();
}

#[test]
fn test_rejects_invalid_files() {
    let tmp = TempDir::new().unwrap();

    let mut bad_magic = common::build_ser_header(4, 4, 0);
    bad_magic[..5].copy_from_slice(b"HELLO");
    let path = common::write_ser_file(tmp.path(), "magic.ser", &bad_magic);
    assert!(matches!(SerReader::open(&path), Err(MeteorError::InvalidSer(_))));

    let mut truncated = common::build_ser_header(4, 4, 3);
    truncated.extend_from_slice(&[0u8; 20]);
    let path = common::write_ser_file(tmp.path(), "short.ser", &truncated);
    assert!(matches!(SerReader::open(&path), Err(MeteorError::InvalidSer(_))));

    let path = common::write_ser_file(tmp.path(), "tiny.ser", b"LUCAM");
    assert!(matches!(SerReader::open(&path), Err(MeteorError::InvalidSer(_))));

    assert!(matches!(
        open_source(&tmp.path().join("missing.ser")),
        Err(MeteorError::InputNotFound(_))
    ));
}

#[test]
fn test_ser_trimmer_copies_frame_range() {
    let tmp = TempDir::new().unwrap();
    let data = common::noise_frames_u8(8, 6, 10, 5);
    let mut buf = common::build_ser_with_frames(8, 6, &data);
    for ts in 0..10u64 {
        buf.extend_from_slice(&(1_000 + ts).to_le_bytes());
    }
    let input = common::write_ser_file(tmp.path(), "capture.ser", &buf);

    let trimmer = trimmer_for(&input, &ExtractionConfig::default()).unwrap();
    assert_eq!(trimmer.name(), "ser");

    let output = tmp.path().join("subclip_3_7.ser");
    trimmer
        .trim(&TrimRequest {
            input: input.clone(),
            output: output.clone(),
            frames: 3..7,
            start_time: 0.12,
            duration: 0.16,
        })
        .unwrap();

    let clip = SerReader::open(&output).unwrap();
    assert_eq!(clip.frame_count(), 4);
    for (i, expected) in data[3..7].iter().enumerate() {
        assert_eq!(clip.frame_raw(i).unwrap(), expected.as_slice());
    }
    assert_eq!(clip.read_timestamp(0), Some(1_003));
    assert_eq!(clip.read_timestamp(3), Some(1_006));
}

#[test]
fn test_ser_trimmer_clamps_to_capture() {
    let tmp = TempDir::new().unwrap();
    let data = common::noise_frames_u8(4, 4, 5, 1);
    let input = common::write_ser_file(
        tmp.path(),
        "capture.ser",
        &common::build_ser_with_frames(4, 4, &data),
    );

    let output = tmp.path().join("tail.ser");
    let request = |frames| TrimRequest {
        input: input.clone(),
        output: output.clone(),
        frames,
        start_time: 0.0,
        duration: 1.0,
    };

    SerTrimmer.trim(&request(3..3000)).unwrap();
    let clip = SerReader::open(&output).unwrap();
    assert_eq!(clip.frame_count(), 2);
    assert_eq!(clip.read_timestamp(0), None);

    assert!(matches!(
        SerTrimmer.trim(&request(10..20)),
        Err(MeteorError::TrimFailed(_))
    ));
}

#[test]
fn test_writer_checks_frame_count() {
    let tmp = TempDir::new().unwrap();
    let data = common::noise_frames_u8(4, 4, 2, 1);
    let input = common::write_ser_file(
        tmp.path(),
        "capture.ser",
        &common::build_ser_with_frames(4, 4, &data),
    );
    let header = SerReader::open(&input).unwrap().header;

    let mut writer = SerWriter::create(&tmp.path().join("out.ser"), &header).unwrap();
    assert!(writer.write_raw_frame(&[0u8; 3]).is_err());
    writer.write_raw_frame(&data[0]).unwrap();
    assert!(matches!(writer.finalize(), Err(MeteorError::InvalidSer(_))));
}
