//! Association between predicted tracks and this frame's detections.

use ndarray::Array2;

use crate::result::RawEntity;
use crate::tracker::rect::Rect;

/// Device confidence that maps to a score of 1.0.
const CONFIDENCE_SCALE: f32 = 1000.0;

/// One raw detection as seen by the tracker.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: Rect,
    /// Detector confidence normalized to `0.0..=1.0`
    pub score: f32,
    /// Slot of the record in the frame's raw sequence
    pub index: usize,
}

impl Detection {
    pub fn from_entity(index: usize, entity: &RawEntity) -> Self {
        let bbox = Rect::from_center_size(
            f32::from(entity.position.x),
            f32::from(entity.position.y),
            f32::from(entity.size),
        );
        let score = (f32::from(entity.confidence) / CONFIDENCE_SCALE).clamp(0.0, 1.0);
        Self { bbox, score, index }
    }
}

/// Build detections for every record of a raw sequence.
pub fn detections_from<'a>(entities: impl IntoIterator<Item = &'a RawEntity>) -> Vec<Detection> {
    entities
        .into_iter()
        .enumerate()
        .map(|(index, entity)| Detection::from_entity(index, entity))
        .collect()
}

/// Compute IoU distance matrix between tracks and detections.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    let mut dists = Array2::zeros((track_boxes.len(), det_boxes.len()));
    for (i, t) in track_boxes.iter().enumerate() {
        for (j, d) in det_boxes.iter().enumerate() {
            dists[[i, j]] = 1.0 - t.iou(d);
        }
    }
    dists
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Solve the assignment problem, rejecting pairs whose cost exceeds `thresh`.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    // lapjv wants a square matrix
    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), 1e6);
    for ((i, j), &cost) in cost_matrix.indexed_iter() {
        padded[[i, j]] = f64::from(cost);
    }

    let mut result = AssignmentResult::default();
    let mut detection_free = vec![true; num_cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row, &col) in row_to_col.iter().enumerate().take(num_rows) {
                if col < num_cols && cost_matrix[[row, col]] <= thresh {
                    result.matches.push((row, col));
                    detection_free[col] = false;
                } else {
                    result.unmatched_tracks.push(row);
                }
            }
        }
        Err(err) => {
            tracing::warn!(?err, rows = num_rows, cols = num_cols, "Linear assignment failed");
            result.unmatched_tracks = (0..num_rows).collect();
        }
    }

    result.unmatched_detections = detection_free
        .iter()
        .enumerate()
        .filter_map(|(i, &free)| free.then_some(i))
        .collect();
    result
}

/// Weight IoU similarity by detection score.
pub fn fuse_score(cost_matrix: &mut Array2<f32>, detections: &[Detection]) {
    for ((_, j), cost) in cost_matrix.indexed_iter_mut() {
        let iou_sim = 1.0 - *cost;
        *cost = 1.0 - iou_sim * detections[j].score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_detection_from_entity() {
        let det = Detection::from_entity(3, &RawEntity::new(100, 80, 40, 750));
        assert_eq!(det.index, 3);
        assert_eq!(det.bbox, Rect::new(80.0, 60.0, 40.0, 40.0));
        assert!((det.score - 0.75).abs() < 1e-6);

        let clamped = Detection::from_entity(0, &RawEntity::new(0, 0, 10, 2500));
        assert_eq!(clamped.score, 1.0);
    }

    #[test]
    fn test_linear_assignment_threshold() {
        let cost = array![[0.1_f32, 0.9], [0.8, 0.95]];
        let result = linear_assignment(&cost, 0.5);
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_tracks, vec![1]);
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_linear_assignment_empty() {
        let cost = Array2::<f32>::zeros((0, 2));
        let result = linear_assignment(&cost, 0.5);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_detections, vec![0, 1]);
    }

    #[test]
    fn test_fuse_score() {
        let mut cost = array![[0.2_f32]];
        let dets = detections_from(&[RawEntity::new(0, 0, 10, 500)]);
        fuse_score(&mut cost, &dets);
        assert!((cost[[0, 0]] - 0.6).abs() < 1e-6);
    }
}
