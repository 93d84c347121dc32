use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use iced::widget::{button, column, container, image, row, text};
use iced::{ContentFit, Element, Length, Subscription, Task};

use camsight_core::detection::domain::detector_adapter::DetectorKind;
use camsight_core::display::domain::display_sink::DisplaySink;
use camsight_core::pipeline::active_detector::{ActiveDetector, ControlMessage};
use camsight_core::pipeline::capture_worker::{CaptureEvent, CaptureOptions, CaptureWorker};
use camsight_core::pipeline::frame_pipeline::{control_channel, FramePipeline};
use camsight_core::shared::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS,
};
use camsight_core::shared::frame::Frame;
use camsight_core::shared::source_spec::SourceSpec;
use camsight_core::video::infrastructure::source_for;

use crate::preview_surface::PreviewSurface;
use crate::settings::{Settings, SettingsPersistence, StartupDetector};
use crate::workers::detector_builder::{self, BuildMessage, BuildParams};
use crate::workers::model_cache::ModelCache;

/// UI refresh interval; each tick shows the newest captured frame.
const TICK: Duration = Duration::from_millis(15);

#[derive(Debug, Clone)]
pub enum Message {
    OpenCamera,
    OpenFile,
    FileSelected(Option<PathBuf>),
    ToggleFace,
    ToggleHand,
    ToggleMenu,
    Exit,
    Tick,
    SettingsSaved,
}

pub struct App {
    settings: Settings,
    persistence: SettingsPersistence,
    pipeline: FramePipeline,
    control_tx: Sender<ControlMessage>,
    /// Selection including toggles the pipeline has not applied yet.
    requested: ActiveDetector,
    capture: Option<CaptureWorker>,
    surface: PreviewSurface,
    status: String,
    menu_open: bool,
    builder_rx: Receiver<BuildMessage>,
    builder_cancel: Arc<AtomicBool>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let (control_tx, control_rx) = control_channel();
        let requested = ActiveDetector::from_kind(settings.detector.kind());
        let (builder_rx, builder_cancel) = detector_builder::spawn(BuildParams {
            hand_config: settings.hand_config(),
            model_cache: ModelCache::new(),
        });

        (
            Self {
                pipeline: FramePipeline::new(requested, control_rx),
                persistence: SettingsPersistence::new(settings.clone()),
                settings,
                control_tx,
                requested,
                capture: None,
                surface: PreviewSurface::new(),
                status: "Open a camera or file to start".to_string(),
                menu_open: false,
                builder_rx,
                builder_cancel,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenCamera => {
                self.menu_open = false;
                self.start_source(SourceSpec::Camera(self.settings.camera_index));
            }
            Message::OpenFile => {
                self.menu_open = false;
                let start_dir = self
                    .settings
                    .last_file
                    .as_ref()
                    .and_then(|p| p.parent().map(|d| d.to_path_buf()));
                return Task::perform(
                    async move {
                        let extensions: Vec<&str> = VIDEO_EXTENSIONS
                            .iter()
                            .chain(IMAGE_EXTENSIONS)
                            .copied()
                            .collect();
                        let mut dialog = rfd::AsyncFileDialog::new()
                            .set_title("Open video or image")
                            .add_filter("Media Files", &extensions);
                        if let Some(dir) = start_dir {
                            dialog = dialog.set_directory(dir);
                        }
                        dialog.pick_file().await.map(|h| h.path().to_path_buf())
                    },
                    Message::FileSelected,
                );
            }
            Message::FileSelected(Some(path)) => {
                self.settings.last_file = Some(path.clone());
                self.start_source(SourceSpec::File(path));
            }
            Message::FileSelected(None) => {}
            Message::ToggleFace => self.toggle(DetectorKind::Face),
            Message::ToggleHand => self.toggle(DetectorKind::Hand),
            Message::ToggleMenu => {
                self.menu_open = !self.menu_open;
            }
            Message::Exit => {
                self.shutdown();
                return iced::exit();
            }
            Message::Tick => {
                self.poll_builder();
                self.poll_capture();
            }
            Message::SettingsSaved => {}
        }
        self.persist_settings()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let file_menu = button(text("File").size(13))
            .on_press(Message::ToggleMenu)
            .style(button::text)
            .padding([4, 10]);
        let mut layout = column![row![file_menu]].spacing(6);

        if self.menu_open {
            let items = column![
                menu_item("Open File…", Message::OpenFile),
                menu_item("Open Camera", Message::OpenCamera),
                menu_item("Exit", Message::Exit),
            ]
            .spacing(2);
            layout = layout.push(container(items).padding(4).style(container::bordered_box));
        }

        let video: Element<'_, Message> = match self.surface.handle() {
            Some(handle) => image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => text("No video").size(16).into(),
        };
        let video_area = container(video)
            .center_x(Length::Fixed(DISPLAY_WIDTH as f32))
            .center_y(Length::Fixed(DISPLAY_HEIGHT as f32))
            .style(container::bordered_box);

        let status = text(format!(
            "{}  |  Detector: {}  |  {}",
            self.surface.fps_label(),
            self.requested,
            self.status
        ))
        .size(13);

        let buttons = row![
            button(text("Open Camera")).on_press(Message::OpenCamera),
            button(text("Toggle Face Detection")).on_press(Message::ToggleFace),
            button(text("Toggle Hand Detection")).on_press(Message::ToggleHand),
        ]
        .spacing(8);

        layout
            .push(video_area)
            .push(status)
            .push(buttons)
            .padding(12)
            .into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        iced::time::every(TICK).map(|_| Message::Tick)
    }

    fn start_source(&mut self, spec: SourceSpec) {
        self.stop_capture();
        self.surface.clear();
        self.pipeline.reset_timing();

        match CaptureWorker::spawn(source_for(&spec), spec.clone(), CaptureOptions::interactive()) {
            Ok(worker) => {
                self.status = format!("Opening {spec}…");
                self.capture = Some(worker);
            }
            Err(e) => self.status = format!("Failed to start capture: {e}"),
        }
    }

    fn stop_capture(&mut self) {
        if let Some(mut worker) = self.capture.take() {
            worker.stop();
        }
    }

    fn toggle(&mut self, kind: DetectorKind) {
        let message = ControlMessage::Toggle(kind);
        self.requested = self.requested.apply(message);
        if self.control_tx.send(message).is_err() {
            log::error!("Detector control channel closed");
        }
        self.settings.detector = StartupDetector::from_kind(self.requested.kind());

        if let Some(kind) = self.requested.kind() {
            if !self.pipeline.is_installed(kind) {
                self.status = format!("Loading {kind} detector…");
            }
        }
    }

    /// Writes changed settings on the executor, off the UI thread.
    fn persist_settings(&mut self) -> Task<Message> {
        match self.persistence.pending(&self.settings) {
            Some(snapshot) => Task::perform(async move { snapshot.save() }, |()| Message::SettingsSaved),
            None => Task::none(),
        }
    }

    fn poll_builder(&mut self) {
        for message in self.builder_rx.try_iter() {
            match message {
                BuildMessage::DownloadProgress(kind, downloaded, total) => {
                    let pct = downloaded as f64 / total.max(1) as f64 * 100.0;
                    self.status = format!("Downloading {kind} model… {pct:.0}%");
                }
                BuildMessage::Ready(adapter) => {
                    let kind = adapter.kind();
                    self.pipeline.install(adapter);
                    self.status = format!("{} detector ready", capitalize(&kind.to_string()));
                }
                BuildMessage::Failed(kind, reason) => {
                    log::error!("Failed to build {kind} detector: {reason}");
                    self.status = format!("{} detector unavailable: {reason}", capitalize(&kind.to_string()));
                }
            }
        }
    }

    fn poll_capture(&mut self) {
        let Some(worker) = self.capture.as_ref() else {
            return;
        };
        let drained = worker.drain();

        if let Some(info) = drained.opened {
            self.status = format!(
                "{} ({}x{}, {})",
                info.source, info.width, info.height, info.codec
            );
        }
        if let Some(frame) = drained.latest {
            self.show(&frame);
        }
        match drained.terminal {
            Some(CaptureEvent::EndOfStream) => {
                self.status = "End of stream".to_string();
                self.stop_capture();
            }
            Some(CaptureEvent::Failed(e)) => {
                self.status = e.to_string();
                self.stop_capture();
            }
            _ => {}
        }
    }

    fn show(&mut self, frame: &Frame) {
        let result = match self.pipeline.process(frame, Instant::now()) {
            Ok(output) => self.surface.present(&output.frame, output.fps),
            Err(e) => {
                self.status = e.to_string();
                self.surface.present(frame, None)
            }
        };
        if let Err(e) = result {
            self.status = format!("Display failed: {e}");
        }
    }

    fn shutdown(&mut self) {
        self.builder_cancel.store(true, Ordering::Relaxed);
        self.stop_capture();
        if let Some(snapshot) = self.persistence.pending(&self.settings) {
            snapshot.save();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn menu_item(label: &str, message: Message) -> Element<'_, Message> {
    button(text(label).size(13))
        .on_press(message)
        .style(button::text)
        .width(Length::Fixed(140.0))
        .into()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
