#[allow(dead_code)]
mod common;

use ndarray::{Array2, Array3, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tempfile::TempDir;

use meteor_core::error::MeteorError;
use meteor_core::extract::{composite_source, Composite};
use meteor_core::frame::Frame;
use meteor_core::io::image_io::load_png_u8;
use meteor_core::io::open_source;

fn composite_of(frames: &[Frame]) -> Array3<f32> {
    let mut composite = Composite::new();
    for frame in frames {
        composite.accumulate(frame).unwrap();
    }
    composite.data().unwrap().clone()
}

#[test]
fn test_composite_ignores_frame_order() {
    let frames: Vec<Frame> = (0..12).map(|i| common::noise_frame(16, 20, i, i as usize)).collect();
    let reference = composite_of(&frames);

    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..5 {
        let mut shuffled = frames.clone();
        shuffled.shuffle(&mut rng);
        assert_eq!(composite_of(&shuffled), reference);
    }
}

#[test]
fn test_composite_dominates_every_frame() {
    let frames: Vec<Frame> = (0..8).map(|i| common::noise_frame(10, 10, 40 + i, i as usize)).collect();
    let composite = composite_of(&frames);
    for frame in &frames {
        Zip::from(&composite)
            .and(&frame.data)
            .for_each(|&c, &v| assert!(c >= v));
    }
    // Every composite sample comes from some frame.
    Zip::indexed(&composite).for_each(|idx, &c| {
        assert!(frames.iter().any(|f| f.data[idx] == c));
    });
}

#[test]
fn test_composite_keeps_moving_trail() {
    // A bright dot moving one pixel per frame along the diagonal.
    let frames: Vec<Frame> = (0..6)
        .map(|i| {
            let mut plane = Array2::from_elem((8, 8), 5.0f32);
            plane[[i, i]] = 250.0;
            Frame::from_plane(plane, 8, i)
        })
        .collect();
    let composite = composite_of(&frames);
    for i in 0..6 {
        assert_eq!(composite[[i, i, 0]], 250.0);
    }
    assert_eq!(composite[[0, 7, 0]], 5.0);
}

#[test]
fn test_shape_mismatch_is_an_error() {
    let mut composite = Composite::new();
    composite.accumulate(&common::noise_frame(10, 10, 1, 0)).unwrap();
    let err = composite
        .accumulate(&common::noise_frame(10, 12, 2, 1))
        .unwrap_err();
    match err {
        MeteorError::FrameShapeMismatch { expected, found } => {
            assert_eq!(expected, (10, 10, 1));
            assert_eq!(found, (10, 12, 1));
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(composite.frames(), 1);
}

#[test]
fn test_empty_composite_cannot_be_saved() {
    let tmp = TempDir::new().unwrap();
    let composite = Composite::new();
    assert!(composite.data().is_none());
    assert!(matches!(
        composite.save(&tmp.path().join("empty.png")),
        Err(MeteorError::EmptySequence)
    ));
}

#[test]
fn test_composite_of_ser_clip_saved_as_png() {
    let tmp = TempDir::new().unwrap();
    let (w, h) = (12usize, 9usize);
    let mut frames = common::noise_frames_u8(w, h, 5, 3);
    frames[2][4 * w + 7] = 255;
    let path = common::write_ser_file(
        tmp.path(),
        "clip.ser",
        &common::build_ser_with_frames(w as u32, h as u32, &frames),
    );

    let mut source = open_source(&path).unwrap();
    let composite = composite_source(source.as_mut()).unwrap();
    assert_eq!(composite.frames(), 5);

    let png = tmp.path().join("clip.png");
    composite.save(&png).unwrap();
    let loaded = load_png_u8(&png).unwrap();
    assert_eq!(loaded.dim(), (h, w, 1));
    assert_eq!(loaded[[4, 7, 0]], 255);

    let expected_corner = frames.iter().map(|f| f[0]).max().unwrap();
    assert_eq!(loaded[[0, 0, 0]], expected_corner);
}
