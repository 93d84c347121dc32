use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use thiserror::Error;

use crate::detection::domain::detector_adapter::DetectionError;
use crate::display::domain::display_sink::DisplaySink;
use crate::pipeline::capture_worker::{CaptureEvent, CaptureOptions, CaptureWorker};
use crate::pipeline::frame_pipeline::{FramePipeline, PipelineOutput};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::source_info::SourceInfo;
use crate::shared::source_spec::SourceSpec;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// How long the runner waits for an event before re-checking cancellation.
const EVENT_POLL: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error("display failed: {0}")]
    Display(String),
    #[error("failed to start capture thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    EndOfStream,
    MaxFrames,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub frames: usize,
    /// Frames on which the active detector found something.
    pub frames_with_detection: usize,
    pub end: EndReason,
    pub source: Option<SourceInfo>,
}

pub type DetectionCallback = Box<dyn FnMut(&PipelineOutput) + Send>;

/// Runs source → detector → sink without a GUI until the stream ends,
/// `max_frames` is reached, or the cancel flag is set.
pub struct RunPipelineUseCase {
    source: Box<dyn FrameSource>,
    spec: SourceSpec,
    pipeline: FramePipeline,
    sink: Box<dyn DisplaySink>,
    logger: Box<dyn PipelineLogger>,
    capture: CaptureOptions,
    max_frames: Option<usize>,
    cancelled: Arc<AtomicBool>,
    on_output: Option<DetectionCallback>,
}

impl RunPipelineUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        spec: SourceSpec,
        pipeline: FramePipeline,
        sink: Box<dyn DisplaySink>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        let capture = CaptureOptions::headless(&spec);
        Self {
            source,
            spec,
            pipeline,
            sink,
            logger,
            capture,
            max_frames: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            on_output: None,
        }
    }

    pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn with_capture_options(mut self, capture: CaptureOptions) -> Self {
        self.capture = capture;
        self
    }

    /// Called with every processed frame, before it is presented.
    pub fn on_output(mut self, callback: DetectionCallback) -> Self {
        self.on_output = Some(callback);
        self
    }

    pub fn execute(self) -> Result<RunSummary, PipelineError> {
        let Self {
            source,
            spec,
            mut pipeline,
            mut sink,
            mut logger,
            capture,
            max_frames,
            cancelled,
            on_output,
        } = self;

        let mut worker = CaptureWorker::spawn(source, spec, capture)?;
        let mut run = RunState {
            pipeline: &mut pipeline,
            sink: sink.as_mut(),
            logger: logger.as_mut(),
            on_output,
            frames: 0,
            frames_with_detection: 0,
            source: None,
        };

        let result = run.drive(&worker, max_frames, &cancelled);
        let (frames, frames_with_detection, source) =
            (run.frames, run.frames_with_detection, run.source.take());
        worker.stop();

        let closed = sink.close();
        let end = result?;
        closed.map_err(|e| PipelineError::Display(e.to_string()))?;

        logger.summary();
        Ok(RunSummary {
            frames,
            frames_with_detection,
            end,
            source,
        })
    }
}

struct RunState<'a> {
    pipeline: &'a mut FramePipeline,
    sink: &'a mut dyn DisplaySink,
    logger: &'a mut dyn PipelineLogger,
    on_output: Option<DetectionCallback>,
    frames: usize,
    frames_with_detection: usize,
    source: Option<SourceInfo>,
}

impl RunState<'_> {
    fn drive(
        &mut self,
        worker: &CaptureWorker,
        max_frames: Option<usize>,
        cancelled: &AtomicBool,
    ) -> Result<EndReason, PipelineError> {
        loop {
            if cancelled.load(Ordering::Relaxed) {
                self.logger.info("Cancelled");
                return Ok(EndReason::Cancelled);
            }
            if max_frames.is_some_and(|max| self.frames >= max) {
                return Ok(EndReason::MaxFrames);
            }

            let event = match worker.events().recv_timeout(EVENT_POLL) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(EndReason::EndOfStream),
            };

            match event {
                CaptureEvent::Opened(info) => {
                    self.logger.info(&format!(
                        "Reading {} ({}x{}, {:.1} fps)",
                        info.source, info.width, info.height, info.fps
                    ));
                    self.sink.source_opened(&info);
                    self.source = Some(info);
                }
                CaptureEvent::Frame(frame) => {
                    let t0 = Instant::now();
                    let output = self.pipeline.process(&frame, t0)?;
                    self.logger
                        .timing("detect", t0.elapsed().as_secs_f64() * 1000.0);
                    self.logger
                        .metric("landmarks", output.detection.landmarks().len() as f64);

                    if let Some(callback) = self.on_output.as_mut() {
                        callback(&output);
                    }

                    let t1 = Instant::now();
                    self.sink
                        .present(&output.frame, output.fps)
                        .map_err(|e| PipelineError::Display(e.to_string()))?;
                    self.logger
                        .timing("display", t1.elapsed().as_secs_f64() * 1000.0);

                    self.frames += 1;
                    if !output.detection.is_empty() {
                        self.frames_with_detection += 1;
                    }
                    let total = self.source.as_ref().and_then(|s| s.total_frames);
                    self.logger.progress(self.frames, total);
                }
                CaptureEvent::EndOfStream => return Ok(EndReason::EndOfStream),
                CaptureEvent::Failed(e) => return Err(e.into()),
            }
        }
    }
}
