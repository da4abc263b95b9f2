//! Rectangles, scored detections and non-maximum suppression.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        (self.width.max(0) * self.height.max(0)) as f64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// A scored, labelled detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub score: f64,
    pub label: String,
}

impl BBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32, score: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            score,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn center_distance(&self, other: &BBox) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (((ax - bx).pow(2) + (ay - by).pow(2)) as f64).sqrt()
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BBox) -> f64 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = ((x2 - x1) * (y2 - y1)) as f64;
        let area = |b: &BBox| (b.width * b.height) as f64;
        let union = area(self) + area(other) - intersection;

        intersection / union
    }
}

/// A collection of detections with batch filtering and suppression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detections {
    boxes: Vec<BBox>,
}

impl Detections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(boxes: Vec<BBox>) -> Self {
        Self { boxes }
    }

    pub fn push(&mut self, bbox: BBox) {
        self.boxes.push(bbox);
    }

    pub fn extend(&mut self, other: Detections) {
        self.boxes.extend(other.boxes);
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn as_slice(&self) -> &[BBox] {
        &self.boxes
    }

    /// Sort by score, best first. Ties break on label so the order is
    /// deterministic across runs.
    pub fn sort_by_score(&mut self) {
        self.boxes.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });
    }

    pub fn filter_by_score(mut self, threshold: f64) -> Self {
        self.boxes.retain(|bbox| bbox.score >= threshold);
        self
    }

    /// IoU-based non-maximum suppression across all labels.
    pub fn apply_nms(mut self, iou_threshold: f64) -> Self {
        if self.boxes.is_empty() {
            return self;
        }
        self.sort_by_score();

        let mut keep = Vec::new();
        let mut suppressed = vec![false; self.boxes.len()];
        for i in 0..self.boxes.len() {
            if suppressed[i] {
                continue;
            }
            keep.push(self.boxes[i].clone());
            for j in (i + 1)..self.boxes.len() {
                if !suppressed[j] && self.boxes[i].iou(&self.boxes[j]) > iou_threshold {
                    suppressed[j] = true;
                }
            }
        }
        Self::from_vec(keep)
    }

    /// Center-distance non-maximum suppression, applied jointly across all
    /// labels: two different templates matching the same sprite collapse to
    /// the better-scoring one.
    pub fn apply_distance_nms(mut self, distance: f64) -> Self {
        if self.boxes.is_empty() {
            return self;
        }
        self.sort_by_score();

        let mut keep: Vec<BBox> = Vec::new();
        for bbox in self.boxes {
            if keep.iter().all(|k| k.center_distance(&bbox) > distance) {
                keep.push(bbox);
            }
        }
        Self::from_vec(keep)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BBox> {
        self.boxes.iter()
    }
}

impl IntoIterator for Detections {
    type Item = BBox;
    type IntoIter = std::vec::IntoIter<BBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.into_iter()
    }
}

impl FromIterator<BBox> for Detections {
    fn from_iter<T: IntoIterator<Item = BBox>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}
