use image::RgbImage;
use crate::common::Detection;

/// Result of one frame sent back by the detection worker.
pub type FrameDetections = anyhow::Result<Vec<Detection>>;

/// Worker side of the frame/detection channels.
#[derive(Debug)]
pub struct DetectionState {
    pub frame_rx: crossbeam_channel::Receiver<Box<RgbImage>>,
    pub det_tx: crossbeam_channel::Sender<FrameDetections>,
}

/// Caller side of the frame/detection channels.
#[derive(Debug)]
pub struct SendState {
    pub frame_tx: crossbeam_channel::Sender<Box<RgbImage>>,
    pub det_rx: crossbeam_channel::Receiver<FrameDetections>,
}

/// Creates a connected pair of channel ends, `bound` frames may be queued.
pub fn detection_channels(bound: usize) -> (SendState, DetectionState) {
    let (frame_tx, frame_rx) = crossbeam_channel::bounded(bound);
    let (det_tx, det_rx) = crossbeam_channel::unbounded();
    (
        SendState { frame_tx, det_rx },
        DetectionState { frame_rx, det_tx },
    )
}
