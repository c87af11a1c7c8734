use std::thread::{self, JoinHandle};
use crate::data::send_channels::{detection_channels, DetectionState, SendState};
use crate::detection_runners::inference_process::{DetectionPipeline, InferenceEngine};

/// Runs `pipeline` on a background thread fed through channels.
///
/// The worker answers every frame with one message on `det_rx`, in arrival
/// order. It stops once every `frame_tx` is dropped (or `det_rx` is gone) and
/// hands the pipeline back through the join handle.
pub fn spawn_detection_worker<E>(
    pipeline: DetectionPipeline<E>,
    queue_bound: usize,
) -> anyhow::Result<(SendState, JoinHandle<DetectionPipeline<E>>)>
where
    E: InferenceEngine + Send + 'static,
{
    let (send_state, detection_state) = detection_channels(queue_bound);
    let handle = thread::Builder::new()
        .name("grid-detect-worker".to_string())
        .spawn(move || run_worker(pipeline, detection_state))?;
    Ok((send_state, handle))
}

fn run_worker<E: InferenceEngine>(mut pipeline: DetectionPipeline<E>, state: DetectionState) -> DetectionPipeline<E> {
    log::info!("Detection worker started");

    for frame in state.frame_rx.iter() {
        let result = pipeline.process_frame(&frame);
        if let Err(err) = &result {
            log::error!("Failed to process frame: {:#}", err);
        }
        if state.det_tx.send(result).is_err() {
            log::warn!("Detection receiver dropped, stopping worker");
            break;
        }
    }

    log::info!("Detection worker stopped");
    pipeline.log_timings();
    pipeline
}
