use crate::detection::domain::detector_adapter::{
    Annotated, Detection, DetectionError, DetectorAdapter, DetectorKind,
};
use crate::detection::domain::face_detection_model::{FaceDetection, FaceDetectionModel};
use crate::overlay::canvas::{FrameCanvas, TextSize};
use crate::overlay::colors::MAGENTA;
use crate::shared::frame::Frame;

const OUTLINE_WIDTH: u32 = 2;
const CORNER_LENGTH: i32 = 30;
const CORNER_WIDTH: u32 = 5;
/// Gap between the top edge of the box and the score label's baseline.
const LABEL_OFFSET: i32 = 8;

/// Face detector adapter: outlines every face and reports the first one.
pub struct FaceDetector {
    model: Box<dyn FaceDetectionModel>,
    draw: bool,
}

impl FaceDetector {
    pub fn new(model: Box<dyn FaceDetectionModel>, draw: bool) -> Self {
        Self { model, draw }
    }

    /// Runs the model and returns a copy of `frame` with the faces drawn in.
    pub fn find_faces(&mut self, frame: &Frame) -> Result<(Frame, Vec<FaceDetection>), DetectionError> {
        let faces = self
            .model
            .detect(frame)
            .map_err(|e| DetectionError::inference(DetectorKind::Face, e))?;

        let mut annotated = frame.clone();
        if self.draw && !faces.is_empty() {
            let mut canvas = FrameCanvas::new(&mut annotated);
            for face in &faces {
                draw_face(&mut canvas, face);
            }
        }
        Ok((annotated, faces))
    }
}

fn draw_face(canvas: &mut FrameCanvas<'_>, face: &FaceDetection) {
    let b = face.bbox;
    if b.is_empty() {
        return;
    }
    canvas.rect_outline(&b, MAGENTA, OUTLINE_WIDTH);

    let (x1, y1) = (b.x, b.y);
    let (x2, y2) = (b.right() - 1, b.bottom() - 1);
    let len = CORNER_LENGTH.min(b.width / 2).min(b.height / 2);
    for (cx, cy, dx, dy) in [(x1, y1, 1, 1), (x2, y1, -1, 1), (x1, y2, 1, -1), (x2, y2, -1, -1)] {
        canvas.line((cx, cy), (cx + dx * len, cy), MAGENTA, CORNER_WIDTH);
        canvas.line((cx, cy), (cx, cy + dy * len), MAGENTA, CORNER_WIDTH);
    }

    let label = format!("{}%", (face.score * 100.0) as i32);
    canvas.text((x1, y1 - LABEL_OFFSET), &label, MAGENTA, TextSize::Small);
}

impl DetectorAdapter for FaceDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Face
    }

    fn annotate(&mut self, frame: &Frame) -> Result<Annotated, DetectionError> {
        let (annotated, faces) = self.find_faces(frame)?;
        Ok(Annotated {
            frame: annotated,
            detection: Detection::Face(faces.first().map(|f| f.bbox)),
        })
    }
}
