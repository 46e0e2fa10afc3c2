use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use meteor_core::detect::DetectionResult;
use meteor_core::extract::{
    clip_path, ClipExtractor, ClipStage, ExtractionConfig, FfmpegTrimmer, TrimRequest, Trimmer,
};

fn request() -> TrimRequest {
    TrimRequest {
        input: PathBuf::from("night sky.mp4"),
        output: PathBuf::from("out/subclip_3000_6000.mp4"),
        frames: 3000..6000,
        start_time: 120.0,
        duration: 120.0,
    }
}

#[test]
fn test_trim_arguments() {
    let args = FfmpegTrimmer::build_args(&request());
    let expected: Vec<OsString> = [
        "-y",
        "-ss",
        "120.00",
        "-i",
        "night sky.mp4",
        "-t",
        "120.00",
        "-map",
        "0",
        "-vcodec",
        "copy",
        "-acodec",
        "copy",
        "out/subclip_3000_6000.mp4",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    assert_eq!(args, expected);
}

#[test]
fn test_trim_times_are_rounded_to_centiseconds() {
    let mut req = request();
    req.start_time = 1.0 / 3.0;
    req.duration = 2.0 / 3.0;
    let args = FfmpegTrimmer::build_args(&req);
    assert_eq!(args[2], OsString::from("0.33"));
    assert_eq!(args[6], OsString::from("0.67"));
}

#[test]
fn test_clip_names_follow_frame_range() {
    let dir = PathBuf::from("clips");
    assert_eq!(
        clip_path(&dir, &PathBuf::from("a/b/capture.MOV"), &(0..3000)),
        dir.join("subclip_0_3000.MOV")
    );
    assert_eq!(
        clip_path(&dir, &PathBuf::from("noext"), &(3000..4500)),
        dir.join("subclip_3000_4500.mp4")
    );
}

/// Stand-in trimming programs. All subprocess checks live in one test so no
/// other thread forks while a script is still open for writing.
#[cfg(unix)]
#[test]
fn test_trimming_subprocess_outcomes() {
    use std::os::unix::fs::PermissionsExt;

    use meteor_core::error::MeteorError;

    let tmp = tempfile::TempDir::new().unwrap();
    let script = |name: &str, body: &str| {
        let path = tmp.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    };
    let failing = script("failing.sh", "echo 'Invalid data found' >&2\nexit 3");
    let slow = script("slow.sh", "sleep 5");
    let writer = script("writer.sh", "for a; do last=$a; done\n: > \"$last\"");

    let mut req = request();
    req.output = tmp.path().join("clip.mp4");

    let missing = FfmpegTrimmer::new("/nonexistent/ffmpeg-binary", Duration::from_secs(5));
    assert!(matches!(missing.trim(&req), Err(MeteorError::TrimFailed(_))));

    let err = FfmpegTrimmer::new(&failing, Duration::from_secs(5))
        .trim(&req)
        .unwrap_err();
    match err {
        MeteorError::TrimFailed(reason) => assert!(reason.contains("Invalid data found"), "{reason}"),
        other => panic!("unexpected error {other}"),
    }

    let started = std::time::Instant::now();
    let err = FfmpegTrimmer::new(&slow, Duration::from_millis(300))
        .trim(&req)
        .unwrap_err();
    assert!(matches!(err, MeteorError::TrimTimeout(_)));
    assert!(started.elapsed() < Duration::from_secs(4));

    FfmpegTrimmer::new(&writer, Duration::from_secs(5))
        .trim(&req)
        .unwrap();
    assert!(req.output.is_file());

    // Full extraction with the failing program: every triggered chunk is
    // reported, none aborts the run.
    let results = vec![
        DetectionResult {
            start: 0,
            end: 100,
            detections: 30,
            peak_fit: Some(1.0),
            triggered: true,
        },
        DetectionResult {
            start: 100,
            end: 200,
            detections: 0,
            peak_fit: Some(0.1),
            triggered: false,
        },
        DetectionResult {
            start: 200,
            end: 250,
            detections: 40,
            peak_fit: Some(1.2),
            triggered: true,
        },
    ];
    let config = ExtractionConfig {
        composite: false,
        ..ExtractionConfig::default()
    };
    let extractor = ClipExtractor::new(
        config.clone(),
        Box::new(FfmpegTrimmer::new(&failing, Duration::from_secs(5))),
    );
    let out_dir = tmp.path().join("clips");
    let report = extractor
        .extract(&results, &PathBuf::from("in.mp4"), &out_dir, 25.0)
        .unwrap();
    assert!(report.clips.is_empty());
    let failed: Vec<_> = report.failures.iter().map(|f| (f.frames.clone(), f.stage)).collect();
    assert_eq!(failed, vec![(0..100, ClipStage::Trim), (200..250, ClipStage::Trim)]);

    let extractor = ClipExtractor::new(
        config,
        Box::new(FfmpegTrimmer::new(&writer, Duration::from_secs(5))),
    );
    let report = extractor
        .extract(&results, &PathBuf::from("in.mp4"), &out_dir, 25.0)
        .unwrap();
    assert!(report.failures.is_empty());
    let clips: Vec<_> = report.clips.iter().map(|c| c.path.clone()).collect();
    assert_eq!(
        clips,
        vec![
            out_dir.join("subclip_0_100.mp4"),
            out_dir.join("subclip_200_250.mp4")
        ]
    );
    assert_eq!(report.clips[1].start_time, 8.0);
    assert_eq!(report.clips[1].end_time, 10.0);
    assert!(clips.iter().all(|p| p.is_file()));
}
