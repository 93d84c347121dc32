use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError};

use crate::shared::frame::Frame;
use crate::shared::source_info::SourceInfo;
use crate::shared::source_spec::SourceSpec;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// How often a blocked sender re-checks the cancel flag.
const SEND_POLL: Duration = Duration::from_millis(50);

#[derive(Clone, Debug, PartialEq)]
pub enum CaptureEvent {
    Opened(SourceInfo),
    Frame(Frame),
    EndOfStream,
    Failed(SourceError),
}

/// What happens when the consumer falls behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Evict the oldest queued frame so the newest one always gets in.
    DropOldest,
    /// Wait for the consumer; no frame is lost.
    Block,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureOptions {
    pub policy: DeliveryPolicy,
    pub capacity: usize,
    /// Pace file playback to the source's nominal frame rate.
    pub realtime: bool,
}

impl CaptureOptions {
    /// Interactive display: stay current, play files at their own speed.
    pub fn interactive() -> Self {
        Self {
            policy: DeliveryPolicy::DropOldest,
            capacity: 2,
            realtime: true,
        }
    }

    /// Headless processing: every frame, as fast as possible. Live sources
    /// still drop frames rather than fall behind the device.
    pub fn headless(spec: &SourceSpec) -> Self {
        Self {
            policy: if spec.is_live() {
                DeliveryPolicy::DropOldest
            } else {
                DeliveryPolicy::Block
            },
            capacity: 8,
            realtime: false,
        }
    }
}

/// Everything pending on the channel, collapsed.
#[derive(Debug, Default)]
pub struct Drained {
    pub opened: Option<SourceInfo>,
    pub latest: Option<Frame>,
    /// `EndOfStream` or `Failed`, if the stream has finished.
    pub terminal: Option<CaptureEvent>,
    /// Frames superseded by `latest` in this drain.
    pub skipped: usize,
}

/// Owns a frame source on a dedicated `frame-capture` thread.
///
/// The source is opened, read and closed on that thread. Events arrive on a
/// bounded channel; the stream always ends with `EndOfStream` or `Failed`
/// unless the worker was stopped.
pub struct CaptureWorker {
    rx: Receiver<CaptureEvent>,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    pub fn spawn(
        source: Box<dyn FrameSource>,
        spec: SourceSpec,
        options: CaptureOptions,
    ) -> Result<Self, std::io::Error> {
        // Drop-oldest keeps one extra slot so `Opened` and the newest frame
        // can sit in the queue together.
        let capacity = match options.policy {
            DeliveryPolicy::DropOldest => options.capacity.max(1) + 1,
            DeliveryPolicy::Block => options.capacity.max(1),
        };
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        let cancelled = Arc::new(AtomicBool::new(false));

        let delivery = Delivery {
            tx,
            evict_rx: rx.clone(),
            policy: options.policy,
            cancelled: cancelled.clone(),
            dropped: 0,
        };
        let handle = std::thread::Builder::new()
            .name("frame-capture".into())
            .spawn(move || capture_loop(source, spec, delivery, options.realtime))?;

        Ok(Self {
            rx,
            cancelled,
            handle: Some(handle),
        })
    }

    pub fn events(&self) -> &Receiver<CaptureEvent> {
        &self.rx
    }

    /// A handle that stops the worker when set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Collapses all pending events without blocking.
    pub fn drain(&self) -> Drained {
        let mut drained = Drained::default();
        for event in self.rx.try_iter() {
            match event {
                CaptureEvent::Opened(info) => drained.opened = Some(info),
                CaptureEvent::Frame(frame) => {
                    if drained.latest.replace(frame).is_some() {
                        drained.skipped += 1;
                    }
                }
                terminal => drained.terminal = Some(terminal),
            }
        }
        drained
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Signals the thread to stop and waits for it to close the source.
    pub fn stop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Capture thread panicked");
            }
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Delivery {
    tx: Sender<CaptureEvent>,
    evict_rx: Receiver<CaptureEvent>,
    policy: DeliveryPolicy,
    cancelled: Arc<AtomicBool>,
    dropped: usize,
}

impl Delivery {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns false once the event can no longer be delivered.
    fn send(&mut self, event: CaptureEvent) -> bool {
        match self.policy {
            DeliveryPolicy::Block => self.send_blocking(event),
            DeliveryPolicy::DropOldest => self.send_evicting(event),
        }
    }

    fn send_blocking(&self, mut event: CaptureEvent) -> bool {
        loop {
            match self.tx.send_timeout(event, SEND_POLL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(back)) => {
                    if self.is_cancelled() {
                        return false;
                    }
                    event = back;
                }
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }

    fn send_evicting(&mut self, mut event: CaptureEvent) -> bool {
        loop {
            match self.tx.try_send(event) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => {
                    if !self.evict_oldest_frame() {
                        return self.send_blocking(back);
                    }
                    event = back;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }

    /// Removes the oldest queued frame. Control events are never evicted:
    /// if one is at the head, the queue is taken out and re-sent in order
    /// minus its oldest frame. Returns false if no frame was queued.
    fn evict_oldest_frame(&mut self) -> bool {
        let head = match self.evict_rx.try_recv() {
            Ok(head) => head,
            // The consumer emptied the queue in the meantime.
            Err(_) => return true,
        };
        if matches!(head, CaptureEvent::Frame(_)) {
            self.dropped += 1;
            return true;
        }

        let mut queued: Vec<CaptureEvent> = std::iter::once(head)
            .chain(self.evict_rx.try_iter())
            .collect();
        let evicted = match queued
            .iter()
            .position(|e| matches!(e, CaptureEvent::Frame(_)))
        {
            Some(pos) => {
                queued.remove(pos);
                self.dropped += 1;
                true
            }
            None => false,
        };
        for event in queued {
            if self.tx.try_send(event).is_err() {
                log::warn!("Lost a queued capture event while evicting");
            }
        }
        evicted
    }
}

fn capture_loop(mut source: Box<dyn FrameSource>, spec: SourceSpec, mut delivery: Delivery, realtime: bool) {
    let info = match source.open(&spec) {
        Ok(info) => info,
        Err(e) => {
            log::error!("Failed to open {spec}: {e}");
            delivery.send(CaptureEvent::Failed(e));
            return;
        }
    };
    log::info!(
        "Opened {}: {}x{} @ {:.2} fps ({})",
        spec,
        info.width,
        info.height,
        info.fps,
        info.codec
    );

    let frame_interval = (realtime && !spec.is_live() && info.fps > 0.0)
        .then(|| Duration::from_secs_f64(1.0 / info.fps));
    if !delivery.send(CaptureEvent::Opened(info)) {
        source.close();
        return;
    }

    let mut terminal = Some(CaptureEvent::EndOfStream);
    let mut next_due = Instant::now();
    for result in source.frames() {
        if delivery.is_cancelled() {
            terminal = None;
            break;
        }
        match result {
            Ok(frame) => {
                if let Some(interval) = frame_interval {
                    let now = Instant::now();
                    if next_due > now {
                        std::thread::sleep(next_due - now);
                    }
                    next_due = next_due.max(now) + interval;
                }
                if !delivery.send(CaptureEvent::Frame(frame)) {
                    terminal = None;
                    break;
                }
            }
            Err(e) => {
                log::error!("Capture from {spec} failed: {e}");
                terminal = Some(CaptureEvent::Failed(e));
                break;
            }
        }
    }
    source.close();

    if delivery.dropped > 0 {
        log::debug!("Dropped {} stale events from {spec}", delivery.dropped);
    }
    if let Some(event) = terminal {
        delivery.send(event);
    }
}
