use serde::{Deserialize, Serialize};
use crate::common::DetectionBox;
use crate::detection_runners::nms::Nms;

/// One box that survived both confidence stages of a decode.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: usize,
    pub label: String,
    /// Objectness, `sigmoid(t_obj)`.
    pub confidence: f32,
    /// Best softmax class probability.
    pub class_score: f32,
    pub bbox: DetectionBox,
}

impl Nms for Detection {
    fn iou(&self, other: &Self) -> f32 {
        self.bbox.iou(&other.bbox)
    }

    fn confidence(&self) -> f32 {
        self.combined_score()
    }
}

impl Detection {
    pub fn new(class_id: usize, label: &str, bbox: DetectionBox, confidence: f32, class_score: f32) -> Self {
        Self {
            class_id,
            label: label.to_string(),
            confidence,
            class_score,
            bbox,
        }
    }

    /// Sets the bounding box's coordinates and dimensions using `(x, y, w, h)`.
    ///
    /// # Arguments
    ///
    /// * `x` - The x-coordinate of the top-left corner.
    /// * `y` - The y-coordinate of the top-left corner.
    /// * `w` - The width of the bounding box.
    /// * `h` - The height of the bounding box.
    pub fn with_x1y1_wh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.bbox = DetectionBox::default().with_x1y1_wh(x, y, w, h);
        self
    }

    pub fn with_confidence(mut self, conf: f32) -> Self {
        self.confidence = conf;
        self
    }

    pub fn with_class_score(mut self, score: f32) -> Self {
        self.class_score = score;
        self
    }

    /// Objectness multiplied by the best class probability.
    pub fn combined_score(&self) -> f32 {
        self.confidence * self.class_score
    }

    pub fn x(&self) -> f32 {
        self.bbox.x()
    }

    pub fn y(&self) -> f32 {
        self.bbox.y()
    }

    pub fn width(&self) -> f32 {
        self.bbox.width()
    }

    pub fn height(&self) -> f32 {
        self.bbox.height()
    }
}

impl std::fmt::Display for Detection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{:.2}% ({};{};{};{})",
            self.label,
            self.class_score * 100.,
            self.bbox.x1,
            self.bbox.y1,
            self.bbox.w,
            self.bbox.h
        )
    }
}
