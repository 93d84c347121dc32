use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use camsight_core::detection::domain::detector_adapter::{DetectorAdapter, DetectorKind};
use camsight_core::detection::domain::hand_detector::HandDrawOptions;
use camsight_core::detection::domain::hand_landmark_model::HandModelConfig;
use camsight_core::detection::infrastructure::detector_factory::{
    create_face_detector, create_hand_detector,
};
use camsight_core::detection::infrastructure::model_resolver::{
    self, ModelSpec, FACE_MODEL, HAND_LANDMARK_MODEL, PALM_MODEL,
};
use camsight_core::display::domain::display_sink::DisplaySink;
use camsight_core::display::infrastructure::log_display_sink::LogDisplaySink;
use camsight_core::display::infrastructure::video_file_sink::VideoFileSink;
use camsight_core::pipeline::active_detector::ActiveDetector;
use camsight_core::pipeline::frame_pipeline::{control_channel, FramePipeline, PipelineOutput};
use camsight_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use camsight_core::pipeline::run_pipeline_use_case::{EndReason, RunPipelineUseCase};
use camsight_core::video::domain::frame_source::FrameSource;
use camsight_core::shared::constants::{DEFAULT_CAMERA_INDEX, HAND_LANDMARK_COUNT};
use camsight_core::shared::source_spec::SourceSpec;
use camsight_core::video::infrastructure::source_for;

/// Recording rate when the source does not report one.
const FALLBACK_RECORDING_FPS: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DetectorArg {
    Hand,
    Face,
    None,
}

impl DetectorArg {
    fn kind(self) -> Option<DetectorKind> {
        match self {
            DetectorArg::Hand => Some(DetectorKind::Hand),
            DetectorArg::Face => Some(DetectorKind::Face),
            DetectorArg::None => None,
        }
    }
}

/// Real-time hand and face detection on a camera or video file.
#[derive(Parser, Debug)]
#[command(name = "camsight")]
struct Cli {
    /// Camera device index.
    #[arg(long, conflicts_with = "file")]
    camera: Option<u32>,

    /// Video or image file to read instead of a camera.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Detector to run on each frame.
    #[arg(long, value_enum, default_value = "hand")]
    detector: DetectorArg,

    /// Maximum number of hands to track.
    #[arg(long, default_value = "2")]
    max_hands: usize,

    /// Palm detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    detection_confidence: f32,

    /// Hand tracking confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    tracking_confidence: f32,

    /// Treat every frame as unrelated (no tracking between frames).
    #[arg(long)]
    static_mode: bool,

    /// Which detected hand to report landmarks for.
    #[arg(long, default_value = "0")]
    hand_index: usize,

    /// Detect without drawing overlays.
    #[arg(long)]
    no_draw: bool,

    /// Landmark to print each frame a hand is found.
    #[arg(long, default_value = "4")]
    print_landmark: usize,

    /// Record the annotated stream to this video file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,
}

impl Cli {
    fn source_spec(&self) -> SourceSpec {
        match &self.file {
            Some(path) => SourceSpec::File(path.clone()),
            None => SourceSpec::Camera(self.camera.unwrap_or(DEFAULT_CAMERA_INDEX)),
        }
    }

    fn hand_config(&self) -> HandModelConfig {
        HandModelConfig {
            static_mode: self.static_mode,
            max_hands: self.max_hands,
            detection_confidence: self.detection_confidence,
            tracking_confidence: self.tracking_confidence,
        }
    }

    fn draw_options(&self) -> HandDrawOptions {
        if self.no_draw {
            HandDrawOptions::no_draw(self.hand_index)
        } else {
            HandDrawOptions {
                hand_index: self.hand_index,
                ..Default::default()
            }
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(cancelled.clone());

    let spec = cli.source_spec();
    let (_control_tx, control_rx) = control_channel();
    let mut pipeline = FramePipeline::new(ActiveDetector::from_kind(cli.detector.kind()), control_rx);
    if let Some(adapter) = build_detector(&cli)? {
        pipeline.install(adapter);
    }

    let sink: Box<dyn DisplaySink> = match &cli.output {
        Some(path) => Box::new(VideoFileSink::new(path, FALLBACK_RECORDING_FPS)),
        None => Box::new(LogDisplaySink::default()),
    };

    let summary = run_use_case(&cli, source_for(&spec), spec.clone(), pipeline, sink, cancelled)
        .execute()?;
    match summary.end {
        EndReason::EndOfStream => log::info!("End of {spec}"),
        EndReason::MaxFrames => log::info!("Stopped after {} frames", summary.frames),
        EndReason::Cancelled => log::info!("Interrupted after {} frames", summary.frames),
    }
    if let Some(path) = &cli.output {
        log::info!("Output written to {}", path.display());
    }
    Ok(())
}

/// Ctrl-C sets `cancelled` so the run stops the capture thread and closes
/// the sink instead of the process dying mid-write.
fn install_interrupt_handler(cancelled: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        cancelled.store(true, Ordering::SeqCst);
    }) {
        log::warn!("Failed to install Ctrl-C handler: {e}");
    }
}

fn run_use_case(
    cli: &Cli,
    source: Box<dyn FrameSource>,
    spec: SourceSpec,
    pipeline: FramePipeline,
    sink: Box<dyn DisplaySink>,
    cancelled: Arc<AtomicBool>,
) -> RunPipelineUseCase {
    let print_landmark = cli.print_landmark;
    RunPipelineUseCase::new(
        source,
        spec,
        pipeline,
        sink,
        Box::new(StdoutPipelineLogger::default()),
    )
    .with_max_frames(cli.max_frames)
    .with_cancel_flag(cancelled)
    .on_output(Box::new(move |output| print_selected_landmark(output, print_landmark)))
}

fn build_detector(cli: &Cli) -> Result<Option<Box<dyn DetectorAdapter>>, Box<dyn std::error::Error>> {
    match cli.detector.kind() {
        Some(DetectorKind::Hand) => {
            let palm = resolve_model(&PALM_MODEL)?;
            let landmark = resolve_model(&HAND_LANDMARK_MODEL)?;
            let detector = create_hand_detector(&palm, &landmark, cli.hand_config(), cli.draw_options())?;
            Ok(Some(Box::new(detector)))
        }
        Some(DetectorKind::Face) => {
            let face = resolve_model(&FACE_MODEL)?;
            Ok(Some(Box::new(create_face_detector(&face, !cli.no_draw)?)))
        }
        None => Ok(None),
    }
}

fn resolve_model(spec: &ModelSpec) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", spec.name);
    let name = spec.name;
    let path = model_resolver::resolve(
        spec,
        None,
        Some(Box::new(move |downloaded, total| download_progress(name, downloaded, total))),
    )?;
    Ok(path)
}

fn print_selected_landmark(output: &PipelineOutput, index: usize) {
    if let Some(lm) = output.detection.landmarks().get(index) {
        println!("[{}, {}, {}]", lm.index, lm.x, lm.y);
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &cli.file {
        if !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
    }
    cli.hand_config().validate()?;
    if cli.print_landmark >= HAND_LANDMARK_COUNT {
        return Err(format!(
            "Landmark index must be below {HAND_LANDMARK_COUNT}, got {}",
            cli.print_landmark
        )
        .into());
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    Ok(())
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camsight_core::shared::frame::Frame;
    use camsight_core::shared::source_info::SourceInfo;
    use camsight_core::video::domain::frame_source::SourceError;

    /// A camera that never runs out of frames.
    struct LiveFeed {
        closed: Arc<AtomicBool>,
    }

    impl FrameSource for LiveFeed {
        fn open(&mut self, spec: &SourceSpec) -> Result<SourceInfo, SourceError> {
            Ok(SourceInfo {
                width: 8,
                height: 8,
                fps: 30.0,
                total_frames: None,
                codec: "raw".to_string(),
                source: spec.clone(),
            })
        }

        fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_> {
            Box::new((0..).map(|i| {
                std::thread::sleep(std::time::Duration::from_millis(1));
                Ok(Frame::solid(8, 8, [0, 0, 0], i))
            }))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("camsight").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_to_camera_zero_with_hands() {
        let cli = parse(&[]);
        assert_eq!(cli.source_spec(), SourceSpec::Camera(0));
        assert_eq!(cli.detector, DetectorArg::Hand);
        assert_eq!(cli.hand_config(), HandModelConfig::default());
        assert_eq!(cli.draw_options(), HandDrawOptions::default());
        assert_eq!(cli.print_landmark, 4);
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_file_source_and_face_detector() {
        let cli = parse(&["--file", "clip.mp4", "--detector", "face"]);
        assert_eq!(cli.source_spec(), SourceSpec::File(PathBuf::from("clip.mp4")));
        assert_eq!(cli.detector.kind(), Some(DetectorKind::Face));
    }

    #[test]
    fn test_camera_and_file_conflict() {
        let result = Cli::try_parse_from(["camsight", "--camera", "1", "--file", "a.mp4"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_draw_keeps_hand_index() {
        let cli = parse(&["--no-draw", "--hand-index", "1"]);
        assert_eq!(cli.draw_options(), HandDrawOptions::no_draw(1));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(validate(&parse(&["--max-hands", "0"])).is_err());
        assert!(validate(&parse(&["--detection-confidence", "1.5"])).is_err());
        assert!(validate(&parse(&["--print-landmark", "21"])).is_err());
        assert!(validate(&parse(&["--max-frames", "0"])).is_err());
        assert!(validate(&parse(&["--file", "/nonexistent/clip.mp4"])).is_err());
    }

    #[test]
    fn test_interrupt_flag_ends_live_run() {
        let cli = parse(&["--detector", "none"]);
        let closed = Arc::new(AtomicBool::new(false));
        let (_tx, rx) = control_channel();
        let cancelled = Arc::new(AtomicBool::new(true));

        let summary = run_use_case(
            &cli,
            Box::new(LiveFeed { closed: closed.clone() }),
            cli.source_spec(),
            FramePipeline::new(ActiveDetector::None, rx),
            Box::new(LogDisplaySink::default()),
            cancelled,
        )
        .execute()
        .unwrap();

        assert_eq!(summary.end, EndReason::Cancelled);
        assert!(closed.load(Ordering::SeqCst));
    }
}
