use crate::detection::domain::detector_adapter::{
    Annotated, Detection, DetectionError, DetectorAdapter, DetectorKind,
};
use crate::detection::domain::hand_landmark_model::{DetectedHand, HandLandmarkModel};
use crate::overlay::canvas::FrameCanvas;
use crate::overlay::colors::{BLUE, RED, WHITE};
use crate::shared::frame::Frame;
use crate::shared::landmark::Landmark;

/// Bones of the 21-point MediaPipe hand: palm, then each finger from thumb
/// to pinky.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),
    (0, 5),
    (5, 9),
    (9, 13),
    (13, 17),
    (0, 17),
    (1, 2),
    (2, 3),
    (3, 4),
    (5, 6),
    (6, 7),
    (7, 8),
    (9, 10),
    (10, 11),
    (11, 12),
    (13, 14),
    (14, 15),
    (15, 16),
    (17, 18),
    (18, 19),
    (19, 20),
];

const BONE_WIDTH: u32 = 2;
const JOINT_RADIUS: u32 = 3;
const POINT_RADIUS: u32 = 15;

/// Which overlays the hand adapter burns in, and which hand it reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandDrawOptions {
    /// Bones and joints for every detected hand.
    pub draw_skeleton: bool,
    /// A large filled circle on each landmark of the selected hand.
    pub draw_points: bool,
    pub hand_index: usize,
}

impl Default for HandDrawOptions {
    fn default() -> Self {
        Self {
            draw_skeleton: true,
            draw_points: true,
            hand_index: 0,
        }
    }
}

impl HandDrawOptions {
    /// Detect and report without touching the pixels.
    pub fn no_draw(hand_index: usize) -> Self {
        Self {
            draw_skeleton: false,
            draw_points: false,
            hand_index,
        }
    }
}

/// Hand landmark detector adapter.
pub struct HandDetector {
    model: Box<dyn HandLandmarkModel>,
    options: HandDrawOptions,
}

impl HandDetector {
    pub fn new(model: Box<dyn HandLandmarkModel>, options: HandDrawOptions) -> Self {
        Self { model, options }
    }

    pub fn options(&self) -> HandDrawOptions {
        self.options
    }

    /// Runs the model on a copy of `frame`, drawing each hand's skeleton
    /// when enabled.
    pub fn find_hands(&mut self, frame: &Frame) -> Result<(Frame, Vec<DetectedHand>), DetectionError> {
        let hands = self
            .model
            .detect(frame)
            .map_err(|e| DetectionError::inference(DetectorKind::Hand, e))?;

        let mut annotated = frame.clone();
        if self.options.draw_skeleton && !hands.is_empty() {
            let (w, h) = (frame.width(), frame.height());
            let mut canvas = FrameCanvas::new(&mut annotated);
            for hand in &hands {
                draw_skeleton(&mut canvas, hand, w, h);
            }
        }
        Ok((annotated, hands))
    }

    /// Pixel landmarks of hand `hand_index`, or an empty list when there is
    /// no such hand.
    pub fn find_position(
        hands: &[DetectedHand],
        hand_index: usize,
        width: u32,
        height: u32,
    ) -> Vec<Landmark> {
        let Some(hand) = hands.get(hand_index) else {
            return Vec::new();
        };
        hand.landmarks
            .iter()
            .enumerate()
            .map(|(index, lm)| {
                let (x, y) = lm.to_pixel(width, height);
                Landmark::new(index, x, y)
            })
            .collect()
    }
}

fn draw_skeleton(canvas: &mut FrameCanvas<'_>, hand: &DetectedHand, width: u32, height: u32) {
    let points: Vec<(i32, i32)> = hand
        .landmarks
        .iter()
        .map(|lm| lm.to_pixel(width, height))
        .collect();

    for &(a, b) in &HAND_CONNECTIONS {
        if let (Some(&from), Some(&to)) = (points.get(a), points.get(b)) {
            canvas.line(from, to, WHITE, BONE_WIDTH);
        }
    }
    for &point in &points {
        canvas.filled_circle(point, JOINT_RADIUS, RED);
    }
}

impl DetectorAdapter for HandDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Hand
    }

    fn annotate(&mut self, frame: &Frame) -> Result<Annotated, DetectionError> {
        let (mut annotated, hands) = self.find_hands(frame)?;
        let landmarks = Self::find_position(
            &hands,
            self.options.hand_index,
            frame.width(),
            frame.height(),
        );

        if self.options.draw_points && !landmarks.is_empty() {
            let mut canvas = FrameCanvas::new(&mut annotated);
            for lm in &landmarks {
                canvas.filled_circle((lm.x, lm.y), POINT_RADIUS, BLUE);
            }
        }

        Ok(Annotated {
            frame: annotated,
            detection: Detection::Hand(landmarks),
        })
    }

    fn reset(&mut self) {
        self.model.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::test_models::{diagonal_hand, FailingHandModel, StubHandModel};
    use crate::shared::landmark::NormalizedLandmark;
    use rstest::rstest;

    fn frame() -> Frame {
        Frame::solid(200, 100, [30, 60, 90], 7)
    }

    #[test]
    fn test_connections_cover_all_landmarks() {
        let mut seen = [false; 21];
        for &(a, b) in &HAND_CONNECTIONS {
            seen[a] = true;
            seen[b] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_no_hand_leaves_frame_untouched() {
        let mut detector = HandDetector::new(
            Box::new(StubHandModel::empty()),
            HandDrawOptions::default(),
        );
        let input = frame();
        let out = detector.annotate(&input).unwrap();
        assert_eq!(out.frame, input);
        assert_eq!(out.detection, Detection::Hand(vec![]));
    }

    #[test]
    fn test_landmarks_are_inside_frame() {
        // Endpoints deliberately overshoot the frame.
        let model = StubHandModel::with_hands(vec![diagonal_hand(-0.2, 1.3)]);
        let mut detector = HandDetector::new(Box::new(model), HandDrawOptions::default());
        let input = frame();
        let out = detector.annotate(&input).unwrap();

        let landmarks = out.detection.landmarks();
        assert_eq!(landmarks.len(), 21);
        for (i, lm) in landmarks.iter().enumerate() {
            assert_eq!(lm.index, i);
            assert!((0..200).contains(&lm.x), "x out of range: {lm:?}");
            assert!((0..100).contains(&lm.y), "y out of range: {lm:?}");
        }
    }

    #[test]
    fn test_annotate_does_not_mutate_input() {
        let model = StubHandModel::with_hands(vec![diagonal_hand(0.1, 0.9)]);
        let mut detector = HandDetector::new(Box::new(model), HandDrawOptions::default());
        let input = frame();
        let snapshot = input.clone();
        let out = detector.annotate(&input).unwrap();
        assert_eq!(input, snapshot);
        assert_ne!(out.frame, input);
    }

    #[test]
    fn test_points_drawn_in_blue() {
        let model = StubHandModel::with_hands(vec![diagonal_hand(0.5, 0.5)]);
        let mut detector = HandDetector::new(
            Box::new(model),
            HandDrawOptions {
                draw_skeleton: false,
                draw_points: true,
                hand_index: 0,
            },
        );
        let out = detector.annotate(&frame()).unwrap();
        assert_eq!(out.frame.pixel(100, 50), Some(BLUE));
    }

    #[test]
    fn test_no_draw_reports_but_keeps_pixels() {
        let model = StubHandModel::with_hands(vec![diagonal_hand(0.1, 0.9)]);
        let mut detector = HandDetector::new(Box::new(model), HandDrawOptions::no_draw(0));
        let input = frame();
        let out = detector.annotate(&input).unwrap();
        assert_eq!(out.frame, input);
        assert_eq!(out.detection.landmarks().len(), 21);
    }

    #[test]
    fn test_find_position_truncates() {
        let hand = DetectedHand {
            landmarks: vec![NormalizedLandmark::new(0.519, 0.25, 0.0)],
            score: 1.0,
            handedness: crate::detection::domain::hand_landmark_model::Handedness::Left,
        };
        let landmarks = HandDetector::find_position(&[hand], 0, 100, 200);
        assert_eq!(landmarks, vec![Landmark::new(0, 51, 50)]);
    }

    #[rstest]
    #[case::second_hand(1, true)]
    #[case::missing_hand(2, false)]
    fn test_find_position_hand_index(#[case] hand_index: usize, #[case] found: bool) {
        let hands = vec![diagonal_hand(0.1, 0.2), diagonal_hand(0.6, 0.8)];
        let landmarks = HandDetector::find_position(&hands, hand_index, 100, 100);
        assert_eq!(!landmarks.is_empty(), found);
        if found {
            assert_eq!(landmarks[0], Landmark::new(0, 60, 60));
        }
    }

    #[test]
    fn test_find_hands_returns_all_hands() {
        let model = StubHandModel::with_hands(vec![diagonal_hand(0.1, 0.2), diagonal_hand(0.6, 0.8)]);
        let mut detector = HandDetector::new(Box::new(model), HandDrawOptions::default());
        let (_, hands) = detector.find_hands(&frame()).unwrap();
        assert_eq!(hands.len(), 2);
    }

    #[test]
    fn test_model_failure_is_inference_error() {
        let mut detector = HandDetector::new(Box::new(FailingHandModel), HandDrawOptions::default());
        let err = detector.annotate(&frame()).unwrap_err();
        assert!(matches!(
            err,
            DetectionError::Inference {
                kind: DetectorKind::Hand,
                ..
            }
        ));
    }
}
