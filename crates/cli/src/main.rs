use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use liveguard_core::detection::domain::face_detector::FaceDetector;
use liveguard_core::detection::infrastructure::replay_face_detector::ReplayFaceDetector;
use liveguard_core::liveness::domain::candidate_gate::CaptureEvent;
use liveguard_core::liveness::domain::capture_countdown::{CaptureCountdown, CountdownStep};
use liveguard_core::liveness::domain::liveness_config::LivenessConfig;
use liveguard_core::liveness::domain::liveness_error::LivenessError;
use liveguard_core::liveness::infrastructure::onnx_spoof_classifier::OnnxSpoofClassifier;
use liveguard_core::pipeline::infrastructure::latest_frame_worker::{
    LatestFrameWorker, SessionEvent,
};
use liveguard_core::pipeline::liveness_session::{FaceVerdict, LivenessSession};
use liveguard_core::pipeline::session_logger::StdoutSessionLogger;
use liveguard_core::shared::constants::{IMAGE_EXTENSIONS, LIVENESS_MODEL_NAME};
use liveguard_core::shared::frame::Frame;
use liveguard_core::shared::model_resolver;

/// Replay recorded camera frames through the face liveness engine.
#[derive(Parser)]
#[command(name = "liveguard")]
struct Cli {
    /// Directory of frame images, processed in file-name order.
    frames_dir: PathBuf,

    /// Recorded face detections (JSON keyed by frame index).
    #[arg(long)]
    detections: PathBuf,

    /// Spoof classifier model (resolved from cache/bundled dir if omitted).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Download URL used when the model is not found locally.
    #[arg(long)]
    model_url: Option<String>,

    /// Liveness config file (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera frame rate used to timestamp frames.
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Run the engine on a worker thread with latest-frame delivery.
    #[arg(long)]
    threaded: bool,

    /// Save captured face crops to this directory.
    #[arg(long)]
    capture_dir: Option<PathBuf>,
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

    let config = match &cli.config {
        Some(path) => LivenessConfig::load(path)?,
        None => LivenessConfig::default(),
    };
    let frame_paths = list_frames(&cli.frames_dir)?;
    log::info!(
        "Found {} frames in {}",
        frame_paths.len(),
        cli.frames_dir.display()
    );

    let mut detector = ReplayFaceDetector::from_json_file(&cli.detections)?;
    let countdown = CaptureCountdown::from_config(&config);
    let session = build_session(&cli, config)?;

    if let Some(dir) = &cli.capture_dir {
        fs::create_dir_all(dir)?;
    }

    let mut captures = PendingCapture::new(countdown);
    let result = if cli.threaded {
        run_threaded(&cli, &frame_paths, &mut detector, session, &mut captures)
    } else {
        run_sequential(&cli, &frame_paths, &mut detector, session, &mut captures)
    };
    captures.finish();
    result
}

/// A capture request waiting out its countdown.
struct PendingCapture {
    countdown: CaptureCountdown,
    event: Option<CaptureEvent>,
}

impl PendingCapture {
    fn new(countdown: CaptureCountdown) -> Self {
        Self {
            countdown,
            event: None,
        }
    }

    fn request(&mut self, event: CaptureEvent) {
        if self.countdown.start(event.track_id, event.timestamp) {
            println!(
                "capture requested: track {} at {:.3}s",
                event.track_id,
                event.timestamp.as_secs_f64()
            );
            self.event = Some(event);
        }
    }

    fn advance(
        &mut self,
        cli: &Cli,
        now: Duration,
        is_tracked_live: impl FnOnce(u32) -> bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match self.countdown.advance(now, is_tracked_live) {
            CountdownStep::Idle | CountdownStep::Waiting => {}
            CountdownStep::Tick { remaining } => println!("capture in {remaining}..."),
            CountdownStep::Cancelled { track_id } => {
                println!("capture cancelled: track {track_id} lost or not live");
                self.event = None;
            }
            CountdownStep::Elapsed { .. } => {
                if let Some(event) = self.event.take() {
                    save_capture(cli, &event, now)?;
                }
            }
        }
        Ok(())
    }

    fn finish(&self) {
        if let Some(track_id) = self.countdown.tracked_id() {
            log::warn!("Input ended during the capture countdown for track {track_id}");
        }
    }
}

fn run_sequential(
    cli: &Cli,
    frame_paths: &[PathBuf],
    detector: &mut dyn FaceDetector,
    mut session: LivenessSession,
    captures: &mut PendingCapture,
) -> Result<(), Box<dyn std::error::Error>> {
    for (index, path) in frame_paths.iter().enumerate() {
        let frame = load_frame(path, index, cli.fps)?;
        let faces = detector
            .detect(&frame)
            .map_err(|e| LivenessError::Detector(e.to_string()))?;
        let outcome = session.process_frame(&frame, &faces)?;
        print_verdicts(index, &outcome.verdicts);
        if let Some(event) = outcome.capture {
            captures.request(event);
        }
        captures.advance(cli, frame.timestamp(), |tid| session.confirm_capture(tid))?;
    }
    session.stop();
    Ok(())
}

fn run_threaded(
    cli: &Cli,
    frame_paths: &[PathBuf],
    detector: &mut dyn FaceDetector,
    session: LivenessSession,
    captures: &mut PendingCapture,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut worker, events) = LatestFrameWorker::spawn(session);
    let mut failure = None;

    for (index, path) in frame_paths.iter().enumerate() {
        let frame = load_frame(path, index, cli.fps)?;
        let faces = detector
            .detect(&frame)
            .map_err(|e| LivenessError::Detector(e.to_string()))?;
        if !worker.submit(frame, faces) {
            break;
        }
        for event in events.try_iter() {
            if let Some(message) = handle_event(cli, event, captures)? {
                failure = Some(message);
            }
        }
    }

    let dropped = worker.dropped_frames();
    worker.stop();
    for event in events.try_iter() {
        if let Some(message) = handle_event(cli, event, captures)? {
            failure = Some(message);
        }
    }
    log::info!("{dropped} frames dropped by latest-frame delivery");

    match failure {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}

/// Returns the error message for a fatal session event.
fn handle_event(
    cli: &Cli,
    event: SessionEvent,
    captures: &mut PendingCapture,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    match event {
        SessionEvent::Verdicts {
            frame_index,
            verdicts,
        } => {
            print_verdicts(frame_index, &verdicts);
            captures.advance(cli, frame_timestamp(frame_index, cli.fps), |tid| {
                verdicts
                    .iter()
                    .any(|v| v.track_id == Some(tid) && v.verdict.is_live_frame)
            })?;
        }
        SessionEvent::Capture(capture) => captures.request(capture),
        SessionEvent::Error(message) => return Ok(Some(message)),
    }
    Ok(None)
}

fn print_verdicts(frame_index: usize, verdicts: &[FaceVerdict]) {
    if verdicts.is_empty() {
        println!("frame {frame_index:5}: no face");
    }
    for v in verdicts {
        let track = v
            .track_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let label = if v.verdict.is_live_frame { "live" } else { "spoof" };
        println!(
            "frame {frame_index:5}: track {track:>3} {label:5} (classifier {}, still {}, blink {}, history {})",
            v.verdict.classifier_live,
            v.verdict.too_still,
            v.verdict.has_blinked,
            v.verdict.sufficient_history,
        );
    }
}

fn save_capture(
    cli: &Cli,
    event: &CaptureEvent,
    now: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "capture: track {} at {:.3}s",
        event.track_id,
        now.as_secs_f64()
    );
    if let Some(dir) = &cli.capture_dir {
        let path = dir.join(format!(
            "track{}_frame{:05}.png",
            event.track_id,
            event.crop.index()
        ));
        let crop = &event.crop;
        image::RgbImage::from_raw(crop.width(), crop.height(), crop.data().to_vec())
            .ok_or("capture crop has inconsistent dimensions")?
            .save(&path)?;
        log::info!("Saved capture to {}", path.display());
    }
    Ok(())
}

fn build_session(
    cli: &Cli,
    config: LivenessConfig,
) -> Result<LivenessSession, Box<dyn std::error::Error>> {
    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {LIVENESS_MODEL_NAME}");
            model_resolver::resolve(
                LIVENESS_MODEL_NAME,
                Some(Path::new("models")),
                cli.model_url.as_deref(),
            )?
        }
    };
    let classifier = OnnxSpoofClassifier::new(&model_path, config.classifier_input_size)?;
    Ok(LivenessSession::new(
        config,
        Box::new(classifier),
        Box::new(StdoutSessionLogger::default()),
    ))
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_image(p))
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(format!("No image frames found in {}", dir.display()).into());
    }
    Ok(paths)
}

fn load_frame(path: &Path, index: usize, fps: f64) -> Result<Frame, Box<dyn std::error::Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let timestamp = frame_timestamp(index, fps);
    Ok(Frame::new(rgb.into_raw(), width, height, 3, index, timestamp))
}

fn frame_timestamp(index: usize, fps: f64) -> Duration {
    Duration::from_secs_f64(index as f64 / fps)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.frames_dir.is_dir() {
        return Err(format!("Frames directory not found: {}", cli.frames_dir.display()).into());
    }
    if !cli.detections.exists() {
        return Err(format!("Detections file not found: {}", cli.detections.display()).into());
    }
    if !(cli.fps.is_finite() && cli.fps > 0.0) {
        return Err(format!("Frame rate must be positive, got {}", cli.fps).into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
