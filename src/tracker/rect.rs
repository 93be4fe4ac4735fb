/// Axis-aligned box used for association.
///
/// The sensor reports every entity as a center point plus a single size, so
/// boxes built from detections are square. Two formats are supported:
/// - TLWH: Top-Left X, Top-Left Y, Width, Height
/// - CXYS: Center X, Center Y, Size (side of the square)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Square box centered on `(cx, cy)` with side `size`.
    #[inline]
    pub fn from_center_size(cx: f32, cy: f32, size: f32) -> Self {
        let half = size / 2.0;
        Self {
            x: cx - half,
            y: cy - half,
            width: size,
            height: size,
        }
    }

    /// Convert to CXYS format: (center_x, center_y, size).
    ///
    /// Non-square boxes report the mean of width and height as size.
    #[inline]
    pub fn to_cxys(&self) -> [f32; 3] {
        let (cx, cy) = self.center();
        [cx, cy, (self.width + self.height) / 2.0]
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection over Union with another box.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 { inter_area / union_area } else { 0.0 }
    }
}

use ndarray::Array2;

/// IoU matrix of shape (M, N) between `boxes_a` and `boxes_b`.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f32> {
    let mut ious = Array2::zeros((boxes_a.len(), boxes_b.len()));
    for (i, a) in boxes_a.iter().enumerate() {
        for (j, b) in boxes_b.iter().enumerate() {
            ious[[i, j]] = a.iou(b);
        }
    }
    ious
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_center_size() {
        let rect = Rect::from_center_size(100.0, 50.0, 40.0);
        assert_eq!(rect, Rect::new(80.0, 30.0, 40.0, 40.0));
        assert_eq!(rect.to_cxys(), [100.0, 50.0, 40.0]);
    }

    #[test]
    fn test_iou() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);

        // Intersection 25, union 175
        assert!((a.iou(&b) - 25.0 / 175.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_degenerate() {
        let a = Rect::from_center_size(5.0, 5.0, 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_iou_batch_shape() {
        let boxes = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(0.0, 0.0, 5.0, 5.0)];
        let ious = iou_batch(&boxes, &boxes[..1]);
        assert_eq!(ious.dim(), (2, 1));
        assert!((ious[[0, 0]] - 1.0).abs() < 1e-6);
        assert!((ious[[1, 0]] - 0.25).abs() < 1e-6);
    }
}
