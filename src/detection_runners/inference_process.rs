use std::sync::Arc;
use std::time::{Duration, Instant};
use image::RgbImage;
use ndarray::ArrayView4;
use parking_lot::Mutex;
use crate::common::{Detection, GridConfig};
use crate::data::{GridTensor, PreprocessConfig, TensorLayout, TimeCalc};
use crate::detection_runners::grid_decoder::DetectionDecoder;
use crate::detection_runners::{image_ops, nms};
use crate::utils;

pub const STAGE_PREPROCESS: usize = 0;
pub const STAGE_INFERENCE: usize = 1;
pub const STAGE_DECODE: usize = 2;
pub const STAGE_NMS: usize = 3;
pub const STAGE_NAMES: [&str; 4] = ["preprocess", "inference", "decode", "nms"];

/// A loaded model that turns one input tensor into one output grid.
pub trait InferenceEngine {
    /// Runs the model on a `[1, height, width, 3]` input.
    ///
    /// The output borrows the engine, so it must be dropped before the engine
    /// runs again and may reuse its buffer.
    fn execute<'a>(&'a mut self, input: ArrayView4<'_, f32>) -> anyhow::Result<ArrayView4<'a, f32>>;

    fn output_layout(&self) -> TensorLayout {
        TensorLayout::Nhwc
    }
}

/// Owns an engine and runs prepare → execute → decode for each frame.
#[derive(Debug)]
pub struct DetectionPipeline<E> {
    engine: E,
    decoder: DetectionDecoder,
    preprocess: PreprocessConfig,
    nms_iou: Option<f32>,
    timings: Arc<Mutex<TimeCalc>>,
}

impl<E: InferenceEngine> DetectionPipeline<E> {
    pub fn new(engine: E, grid: GridConfig, preprocess: PreprocessConfig) -> anyhow::Result<Self> {
        preprocess.validate()?;
        let decoder = DetectionDecoder::new(grid)?;

        log::info!(
            "Detection pipeline ready: input {}x{} ({:?}), grid {}x{}x{}, {} classes, threshold {}",
            preprocess.width,
            preprocess.height,
            preprocess.fit,
            decoder.config().rows,
            decoder.config().cols,
            decoder.config().boxes_per_cell,
            decoder.config().class_count,
            decoder.config().confidence_threshold
        );

        Ok(Self {
            engine,
            decoder,
            preprocess,
            nms_iou: None,
            timings: Arc::new(Mutex::new(TimeCalc::default())),
        })
    }

    /// Suppresses overlapping detections after decoding.
    pub fn with_nms(mut self, iou_threshold: f32) -> Self {
        self.nms_iou = Some(iou_threshold);
        self
    }

    pub fn decoder(&self) -> &DetectionDecoder {
        &self.decoder
    }

    pub fn timings(&self) -> Arc<Mutex<TimeCalc>> {
        Arc::clone(&self.timings)
    }

    pub fn process_frame(&mut self, frame: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        let start = Instant::now();
        let mut stages = [Duration::ZERO; 4];

        let input = image_ops::prepare_input(frame, &self.preprocess)?;
        let mut elapsed = utils::trace("TIME", "Preprocessing input", start, Duration::ZERO);
        stages[STAGE_PREPROCESS] = elapsed;

        let layout = self.engine.output_layout();
        let decoder = &self.decoder;
        let mut detections = {
            let output = self.engine.execute(input.view())?;
            let prev = elapsed;
            elapsed = utils::trace("TIME", "Detection run", start, prev);
            stages[STAGE_INFERENCE] = elapsed - prev;

            let tensor = GridTensor::new(output, layout)?;
            decoder.decode(&tensor)?
        };
        let prev = elapsed;
        elapsed = utils::trace("TIME", "Decoding", start, prev);
        stages[STAGE_DECODE] = elapsed - prev;

        if let Some(iou) = self.nms_iou {
            nms::nms(&mut detections, iou);
            stages[STAGE_NMS] = utils::trace("TIME", "NMS", start, elapsed) - elapsed;
        }

        let mut timings = self.timings.lock();
        for (i, d) in stages.into_iter().enumerate() {
            timings.add_or_push(i, d);
        }
        timings.finish_frame();

        Ok(detections)
    }

    /// Logs the average time per frame, overall and for each stage.
    pub fn log_timings(&self) {
        let timings = self.timings.lock();
        log::info!("{} frames, {:?} per frame", timings.frames(), timings.avg());
        for (i, name) in STAGE_NAMES.iter().enumerate() {
            if let Some(avg) = timings.avg_i(i) {
                log::info!("  {}: {:?}", name, avg);
            }
        }
    }

    /// Releases the engine.
    pub fn into_engine(self) -> E {
        self.engine
    }
}
