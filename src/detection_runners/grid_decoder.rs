//! YOLO-v2 style grid decoding.
//!
//! Every `(row, column, box)` triple of the output grid carries
//! `tx, ty, tw, th, t_obj` followed by `class_count` class logits. A box is kept
//! when its objectness reaches the threshold and its objectness times best class
//! probability exceeds it. Output follows grid order: rows, then columns, then
//! box index. No sorting and no suppression happen here.

use rayon::prelude::*;
use crate::common::{Detection, DetectionBox, GridConfig, BOX_INFO_FEATURE_COUNT};
use crate::data::GridTensorView;
use crate::detection_runners::activations::{argmax, sigmoid, softmax};
use crate::error::DecodeError;
use crate::Result;

/// Detections of one decode, plus the boxes skipped for non-finite values.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodeReport {
    pub detections: Vec<Detection>,
    pub degenerate: Vec<DecodeError>,
}

enum BoxOutcome {
    Rejected,
    Degenerate(DecodeError),
    Accepted(Detection),
}

/// Stateless decoder bound to one validated [`GridConfig`].
#[derive(Debug, Clone)]
pub struct DetectionDecoder {
    config: GridConfig,
}

impl DetectionDecoder {
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn decode<V: GridTensorView + ?Sized>(&self, tensor: &V) -> Result<Vec<Detection>> {
        Ok(self.decode_report(tensor)?.detections)
    }

    pub fn decode_report<V: GridTensorView + ?Sized>(&self, tensor: &V) -> Result<DecodeReport> {
        decode_grid(&self.config, tensor)
    }

    /// Decodes independent tensors in parallel, one result per tensor in input order.
    pub fn decode_batch<V: GridTensorView + Sync>(&self, tensors: &[V]) -> Vec<Result<Vec<Detection>>> {
        tensors.par_iter().map(|tensor| self.decode(tensor)).collect()
    }
}

/// Validates `config` and the tensor's dims against it, then decodes `tensor`.
pub fn decode<V: GridTensorView + ?Sized>(tensor: &V, config: &GridConfig) -> Result<Vec<Detection>> {
    config.validate()?;
    Ok(decode_grid(config, tensor)?.detections)
}

fn decode_grid<V: GridTensorView + ?Sized>(config: &GridConfig, tensor: &V) -> Result<DecodeReport> {
    config.check_tensor_dims(tensor.dims())?;
    let mut report = DecodeReport::default();

    for cx in 0..config.rows {
        for cy in 0..config.cols {
            for b in 0..config.boxes_per_cell {
                match decode_box(config, tensor, cx, cy, b)? {
                    BoxOutcome::Rejected => {}
                    BoxOutcome::Degenerate(err) => {
                        log::warn!("Skipping box: {}", err);
                        report.degenerate.push(err);
                    }
                    BoxOutcome::Accepted(detection) => {
                        log::trace!("{}", detection);
                        report.detections.push(detection);
                    }
                }
            }
        }
    }

    log::debug!(
        "Decoded {} detections ({} degenerate boxes skipped)",
        report.detections.len(),
        report.degenerate.len()
    );
    Ok(report)
}

fn decode_box<V: GridTensorView + ?Sized>(
    config: &GridConfig,
    tensor: &V,
    cx: usize,
    cy: usize,
    b: usize,
) -> Result<BoxOutcome> {
    let degenerate = |what: &'static str| BoxOutcome::Degenerate(DecodeError::NumericDegenerate { cx, cy, b, what });
    let threshold = config.confidence_threshold;
    let channel = b * config.box_stride();

    let tx = tensor.get(cx, cy, channel)?;
    let ty = tensor.get(cx, cy, channel + 1)?;
    let tw = tensor.get(cx, cy, channel + 2)?;
    let th = tensor.get(cx, cy, channel + 3)?;
    let t_obj = tensor.get(cx, cy, channel + 4)?;

    if !t_obj.is_finite() {
        return Ok(degenerate("objectness"));
    }
    let confidence = sigmoid(t_obj);
    if confidence < threshold {
        return Ok(BoxOutcome::Rejected);
    }

    let class_offset = channel + BOX_INFO_FEATURE_COUNT;
    let logits = (0..config.class_count)
        .map(|c| tensor.get(cx, cy, class_offset + c))
        .collect::<Result<Vec<f32>>>()?;

    if ![tx, ty, tw, th].iter().all(|v| v.is_finite()) {
        return Ok(degenerate("box offsets"));
    }
    if !logits.iter().all(|v| v.is_finite()) {
        return Ok(degenerate("class logits"));
    }

    let (anchor_w, anchor_h) = config
        .anchor(b)
        .ok_or_else(|| DecodeError::configuration(format!("no anchor for box {}", b)))?;

    // row index drives y, column index drives x
    let center_x = (cy as f32 + sigmoid(tx)) * config.cell_width;
    let center_y = (cx as f32 + sigmoid(ty)) * config.cell_height;
    let width = tw.exp() * anchor_w * config.cell_width;
    let height = th.exp() * anchor_h * config.cell_height;
    let bbox = DetectionBox::default().with_cxcy_wh(center_x, center_y, width, height);
    if !bbox.is_finite() {
        return Ok(degenerate("box size"));
    }

    let probs = softmax(&logits);
    let Some((class_id, class_score)) = argmax(&probs) else {
        return Ok(BoxOutcome::Rejected);
    };
    if class_score * confidence <= threshold {
        return Ok(BoxOutcome::Rejected);
    }

    Ok(BoxOutcome::Accepted(Detection::new(
        class_id,
        &config.label(class_id),
        bbox,
        confidence,
        class_score,
    )))
}
