use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use meteor_core::frame::SourceKind;
use meteor_core::io::open_source;

#[derive(Args)]
pub struct InfoArgs {
    /// Input video or SER file
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let mut source = open_source(&args.file)?;
    let info = source.info().clone();
    source.close()?;

    let kind = match info.kind {
        SourceKind::Video => "video (decoded by ffmpeg)",
        SourceKind::Ser => "SER",
    };
    println!("File:        {}", info.filename.display());
    println!("Format:      {kind}");
    println!("Dimensions:  {}x{}", info.shape.width, info.shape.height);
    println!("Channels:    {}", info.shape.channels);
    println!("Bit depth:   {}", info.shape.bit_depth);
    match info.total_frames {
        Some(n) => println!("Frames:      {n}"),
        None => println!("Frames:      unknown"),
    }
    if let Some(fps) = info.fps {
        println!("Frame rate:  {fps:.3} fps");
        if let Some(n) = info.total_frames {
            println!("Duration:    {:.2} s", n as f64 / fps);
        }
    }

    let min_side = info.shape.width.min(info.shape.height);
    if min_side < meteor_core::consts::MIN_FRAME_SIDE {
        println!(
            "Warning:     frames are smaller than {0}x{0}; every metric will be undefined",
            meteor_core::consts::MIN_FRAME_SIDE
        );
    }

    Ok(())
}
