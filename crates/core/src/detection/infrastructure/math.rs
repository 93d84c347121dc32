//! Shared math for the ONNX detection backends.
//!
//! SSD anchor generation, score activation, IoU and non-maximum suppression.

/// Center of one SSD anchor, normalized to the model input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub cx: f32,
    pub cy: f32,
}

/// Generates fixed-size SSD anchors for a square input.
///
/// `layers` lists `(stride, anchors_per_cell)`; each layer covers an
/// `input_size / stride` grid.
pub fn ssd_anchors(input_size: u32, layers: &[(usize, usize)]) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    for &(stride, per_cell) in layers {
        let grid = input_size as usize / stride;
        for y in 0..grid {
            for x in 0..grid {
                let cx = (x as f32 + 0.5) / grid as f32;
                let cy = (y as f32 + 0.5) / grid as f32;
                anchors.extend(std::iter::repeat(Anchor { cx, cy }).take(per_cell));
            }
        }
    }
    anchors
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// IoU between two boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// A decoded SSD detection before suppression.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    /// `[x1, y1, x2, y2]`
    pub rect: [f32; 4],
    pub score: f32,
    pub keypoints: Vec<[f32; 2]>,
}

/// Greedy NMS; the result is sorted by descending score.
pub fn nms(mut dets: Vec<RawDetection>, iou_thresh: f32) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets {
        if keep.iter().all(|k| bbox_iou(&k.rect, &det.rect) <= iou_thresh) {
            keep.push(det);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn det(rect: [f32; 4], score: f32) -> RawDetection {
        RawDetection {
            rect,
            score,
            keypoints: vec![],
        }
    }

    #[rstest]
    #[case::blazeface_short_range(128, &[(8, 2), (16, 6)], 896)]
    #[case::palm_lite(192, &[(8, 2), (16, 6)], 2016)]
    fn test_anchor_count(#[case] size: u32, #[case] layers: &[(usize, usize)], #[case] expected: usize) {
        assert_eq!(ssd_anchors(size, layers).len(), expected);
    }

    #[test]
    fn test_anchors_in_unit_range() {
        for a in ssd_anchors(192, &[(8, 2), (16, 6)]) {
            assert!(a.cx > 0.0 && a.cx < 1.0);
            assert!(a.cy > 0.0 && a.cy < 1.0);
        }
    }

    #[test]
    fn test_first_anchor_is_top_left_cell_center() {
        let anchors = ssd_anchors(128, &[(8, 2)]);
        assert_relative_eq!(anchors[0].cx, 0.5 / 16.0);
        assert_eq!(anchors[0], anchors[1]);
    }

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_bbox_iou_no_overlap() {
        assert_eq!(bbox_iou(&[0.0, 0.0, 10.0, 10.0], &[20.0, 20.0, 30.0, 30.0]), 0.0);
    }

    #[test]
    fn test_bbox_iou_partial_overlap() {
        let iou = bbox_iou(&[0.0, 0.0, 10.0, 10.0], &[5.0, 5.0, 15.0, 15.0]);
        assert_relative_eq!(iou, 25.0 / 175.0, epsilon = 1e-6);
    }

    #[test]
    fn test_nms_suppresses_overlap_and_sorts() {
        let kept = nms(
            vec![
                det([5.0, 5.0, 105.0, 105.0], 0.7),
                det([200.0, 200.0, 250.0, 250.0], 0.8),
                det([0.0, 0.0, 100.0, 100.0], 0.9),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 2);
        assert_relative_eq!(kept[0].score, 0.9);
        assert_relative_eq!(kept[1].score, 0.8);
    }

    #[test]
    fn test_nms_empty() {
        assert!(nms(vec![], 0.3).is_empty());
    }
}
