//! Grid geometry, anchor priors and thresholds for one detector head.

use std::path::Path;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use crate::common::ClassNames;
use crate::error::DecodeError;

/// `tx, ty, tw, th, t_obj` precede the class logits of every box.
pub const BOX_INFO_FEATURE_COUNT: usize = 5;

/// tiny-YOLO-v2 VOC priors, `(width, height)` in cell units per box index.
pub const VOC_ANCHORS: [f32; 10] = [1.08, 1.19, 3.42, 4.41, 6.63, 11.38, 9.42, 5.11, 16.62, 10.52];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub boxes_per_cell: usize,
    pub class_count: usize,
    pub cell_width: f32,
    pub cell_height: f32,
    pub anchors: Vec<f32>,
    pub confidence_threshold: f32,
    pub class_names: Option<ClassNames>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 13,
            cols: 13,
            boxes_per_cell: 5,
            class_count: 20,
            cell_width: 32.,
            cell_height: 32.,
            anchors: VOC_ANCHORS.to_vec(),
            confidence_threshold: 0.3,
            class_names: Some(ClassNames::voc()),
        }
    }
}

impl GridConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_grid(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    pub fn with_boxes_per_cell(mut self, n: usize) -> Self {
        self.boxes_per_cell = n;
        self
    }

    /// Sets the class count. Names set earlier are dropped when their length no longer matches.
    pub fn with_class_count(mut self, n: usize) -> Self {
        self.class_count = n;
        if self.class_names.as_ref().is_some_and(|names| names.len() != n) {
            self.class_names = None;
        }
        self
    }

    pub fn with_cell_size(mut self, width: f32, height: f32) -> Self {
        self.cell_width = width;
        self.cell_height = height;
        self
    }

    pub fn with_anchors(mut self, anchors: &[f32]) -> Self {
        self.anchors = anchors.to_vec();
        self
    }

    pub fn with_confidence_threshold(mut self, x: f32) -> Self {
        self.confidence_threshold = x;
        self
    }

    pub fn with_names(mut self, names: &[&str]) -> Self {
        self.class_names = Some(ClassNames::from(names));
        self
    }

    pub fn with_class_names(mut self, names: Option<ClassNames>) -> Self {
        self.class_names = names;
        self
    }

    /// Parses a JSON config; omitted fields keep their defaults.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse grid config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read grid config {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Number of channels one box occupies in the tensor.
    pub fn box_stride(&self) -> usize {
        self.class_count + BOX_INFO_FEATURE_COUNT
    }

    /// Expected channel dimension of the output tensor.
    pub fn channels(&self) -> usize {
        self.boxes_per_cell * self.box_stride()
    }

    /// Upper bound on the number of detections one decode can emit.
    pub fn max_detections(&self) -> usize {
        self.rows * self.cols * self.boxes_per_cell
    }

    /// `(width, height)` prior of box `b`, in cell units.
    pub fn anchor(&self, b: usize) -> Option<(f32, f32)> {
        let pair = self.anchors.get(2 * b..2 * b + 2)?;
        Some((pair[0], pair[1]))
    }

    pub fn label(&self, class_id: usize) -> String {
        self.class_names
            .as_ref()
            .and_then(|names| names.name(class_id))
            .map(str::to_string)
            .unwrap_or_else(|| format!("# {}", class_id))
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(DecodeError::configuration(format!(
                "grid must have at least one cell, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.boxes_per_cell == 0 {
            return Err(DecodeError::configuration("boxes_per_cell must be positive"));
        }
        if self.class_count == 0 {
            return Err(DecodeError::configuration("class_count must be positive"));
        }
        if !is_positive(self.cell_width) || !is_positive(self.cell_height) {
            return Err(DecodeError::configuration(format!(
                "cell size must be positive, got {}x{}",
                self.cell_width, self.cell_height
            )));
        }
        if self.anchors.len() != 2 * self.boxes_per_cell {
            return Err(DecodeError::configuration(format!(
                "expected {} anchor values for {} boxes per cell, got {}",
                2 * self.boxes_per_cell,
                self.boxes_per_cell,
                self.anchors.len()
            )));
        }
        if let Some(i) = self.anchors.iter().position(|&a| !is_positive(a)) {
            return Err(DecodeError::configuration(format!(
                "anchor {} must be positive, got {}",
                i, self.anchors[i]
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(DecodeError::configuration(format!(
                "confidence threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if let Some(names) = &self.class_names {
            if names.len() != self.class_count {
                return Err(DecodeError::configuration(format!(
                    "{} class names given for {} classes",
                    names.len(),
                    self.class_count
                )));
            }
        }
        Ok(())
    }

    /// Checks a tensor's `(rows, cols, channels)` against this grid.
    pub fn check_tensor_dims(&self, dims: (usize, usize, usize)) -> Result<(), DecodeError> {
        let expected = (self.rows, self.cols, self.channels());
        if dims != expected {
            return Err(DecodeError::configuration(format!(
                "tensor dims {:?} do not match grid dims {:?}",
                dims, expected
            )));
        }
        Ok(())
    }
}

fn is_positive(x: f32) -> bool {
    x.is_finite() && x > 0.
}
