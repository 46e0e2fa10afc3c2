use console::Style;
use meteor_core::aggregate::FrameFailure;
use meteor_core::extract::ExtractionReport;
use meteor_core::pipeline::{MeteorConfig, RunReport};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    hit: Style,
    failure: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            hit: Style::new().green().bold(),
            failure: Style::new().red(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!(
        "  {}",
        s.title.apply_to("\u{2550}".repeat(title.chars().count()))
    );
    println!();
}

pub fn print_scan_header(config: &MeteorConfig) {
    let s = Styles::new();

    print_title(&s, "Meteor Scan");
    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Metric table"),
        s.path.apply_to(config.metric_table.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Workers"),
        s.value.apply_to(config.scan.resolved_workers())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Max failures"),
        s.value
            .apply_to(format!("{:.0}%", config.scan.max_failure_ratio * 100.0))
    );
    println!();
}

pub fn print_detection_header(config: &MeteorConfig) {
    let s = Styles::new();
    let detection = &config.detection;

    print_title(&s, "Meteor Detection");
    println!(
        "  {:<14}{}",
        s.label.apply_to("Recording"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Threshold"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Policy"),
        s.method.apply_to(detection.policy)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Alpha"),
        s.value.apply_to(detection.resolved_sensitivity())
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Trigger"),
        s.method.apply_to(detection.trigger)
    );
    println!();

    println!("  {}", s.header.apply_to("Chunks"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Frame rate"),
        s.value.apply_to(format!("{} fps", detection.fps))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!(
            "{} frames ({:.1} s)",
            detection.chunk_size,
            detection.chunk_size as f64 / detection.fps
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Window"),
        s.value.apply_to(detection.window)
    );
    if !config.extraction.composite {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Composite"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();
}

pub fn print_frame_failures(failures: &[FrameFailure]) {
    if failures.is_empty() {
        return;
    }
    let s = Styles::new();
    println!();
    println!(
        "  {}",
        s.failure
            .apply_to(format!("{} frames without a metric", failures.len()))
    );
    for failure in failures {
        println!(
            "    {:<10}{:?}",
            s.label.apply_to(failure.index),
            failure.fault
        );
    }
}

pub fn print_run_report(config: &MeteorConfig, report: &RunReport) {
    let s = Styles::new();
    let fps = config.detection.fps;

    print_title(&s, "Results");
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(report.frames)
    );
    println!();

    println!("  {}", s.header.apply_to("Chunks"));
    for chunk in &report.detections {
        let line = format!(
            "    {:>8}..{:<8} {:>8.1}s - {:<8.1}s {:>6} detections",
            chunk.start,
            chunk.end,
            chunk.start_time(fps),
            chunk.end_time(fps),
            chunk.detections,
        );
        if chunk.triggered {
            println!("{}  {}", s.hit.apply_to(line), s.hit.apply_to("EVENT"));
        } else {
            println!("{}", s.label.apply_to(line));
        }
    }
    println!();

    let triggered = report.triggered().count();
    if triggered == 0 {
        println!("  {}", s.disabled.apply_to("No events found"));
    } else {
        println!(
            "  {}",
            s.hit.apply_to(format!("{triggered} chunk(s) triggered"))
        );
    }

    print_extraction(&s, &report.extraction);
    print_frame_failures(&report.frame_failures);
    println!();
}

fn print_extraction(s: &Styles, extraction: &ExtractionReport) {
    if extraction.clips.is_empty() && extraction.failures.is_empty() {
        return;
    }
    println!();
    println!("  {}", s.header.apply_to("Clips"));
    for clip in &extraction.clips {
        println!(
            "    {}",
            s.path.apply_to(clip.path.display())
        );
        if let Some(ref composite) = clip.composite {
            println!(
                "      {:<10}{}",
                s.label.apply_to("trail"),
                s.path.apply_to(composite.display())
            );
        }
    }
    for failure in &extraction.failures {
        println!(
            "    {}",
            s.failure.apply_to(format!(
                "{}..{} {} failed: {}",
                failure.frames.start, failure.frames.end, failure.stage, failure.reason
            ))
        );
    }
}
