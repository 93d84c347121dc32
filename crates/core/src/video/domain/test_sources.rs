//! In-memory frame sources for pipeline tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::shared::frame::Frame;
use crate::shared::source_info::SourceInfo;
use crate::shared::source_spec::SourceSpec;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// Plays back a fixed list of frame results, then ends.
pub(crate) struct ScriptedSource {
    items: Vec<Result<Frame, SourceError>>,
    open_error: Option<SourceError>,
    opened: bool,
    pub closed: Arc<AtomicBool>,
}

impl ScriptedSource {
    pub fn solid(count: usize, width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::with_items((0..count).map(|i| Ok(Frame::solid(width, height, rgb, i))).collect())
    }

    pub fn with_items(items: Vec<Result<Frame, SourceError>>) -> Self {
        Self {
            items,
            open_error: None,
            opened: false,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing_open(error: SourceError) -> Self {
        Self {
            open_error: Some(error),
            ..Self::with_items(vec![])
        }
    }
}

impl FrameSource for ScriptedSource {
    fn open(&mut self, spec: &SourceSpec) -> Result<SourceInfo, SourceError> {
        if let Some(err) = self.open_error.take() {
            return Err(err);
        }
        self.opened = true;
        let (width, height) = match self.items.first() {
            Some(Ok(frame)) => (frame.width(), frame.height()),
            _ => (0, 0),
        };
        Ok(SourceInfo {
            width,
            height,
            fps: 30.0,
            total_frames: Some(self.items.len()),
            codec: "raw".to_string(),
            source: spec.clone(),
        })
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_> {
        if !self.opened {
            return Box::new(std::iter::once(Err(SourceError::NotOpened)));
        }
        Box::new(std::mem::take(&mut self.items).into_iter())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Produces frames until closed, like a camera.
pub(crate) struct EndlessSource {
    pub produced: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
}

impl EndlessSource {
    pub fn new() -> Self {
        Self {
            produced: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl FrameSource for EndlessSource {
    fn open(&mut self, spec: &SourceSpec) -> Result<SourceInfo, SourceError> {
        Ok(SourceInfo {
            width: 8,
            height: 8,
            fps: 0.0,
            total_frames: None,
            codec: "raw".to_string(),
            source: spec.clone(),
        })
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_> {
        let produced = self.produced.clone();
        Box::new(std::iter::repeat_with(move || {
            let index = produced.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(1));
            Ok(Frame::solid(8, 8, [0, 0, 0], index))
        }))
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
