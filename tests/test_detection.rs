use std::sync::Arc;
use grid_detect::{decode, DecodeError, Detection, DetectionDecoder, GridConfig, GridTensor, TensorLayout};
use grid_detect::data::GridTensorF16;
use half::f16;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use grid_builder::{scenario_config, GridBuilder};

#[test]
fn single_confident_box() {
    let config = scenario_config(0.3);
    let mut grid = GridBuilder::for_config(&config);
    grid.set_box(0, 0, 0, [0., 0., 0., 0., 10.], &[5., 0.]);

    let result = decode(&grid.tensor(), &config).unwrap();
    assert_eq!(result.len(), 1);

    let det = &result[0];
    assert_eq!(det.class_id, 0);
    assert_eq!(det.label, "cat");
    assert_eq!(det.x(), 0.);
    assert_eq!(det.y(), 0.);
    assert_eq!(det.width(), 32.);
    assert_eq!(det.height(), 32.);
    assert_eq!(det.bbox.cx(), 16.);
    assert_eq!(det.bbox.cy(), 16.);
    assert!((det.confidence - 0.99995).abs() < 1e-4);
    assert!((det.class_score - 0.9933).abs() < 1e-3);
    assert!(det.combined_score() > 0.99);
}

#[test]
fn row_index_drives_y_and_column_index_drives_x() {
    let config = GridConfig::new()
        .with_grid(2, 3)
        .with_boxes_per_cell(1)
        .with_class_count(1)
        .with_cell_size(32., 16.)
        .with_anchors(&[1., 1.]);
    let mut grid = GridBuilder::for_config(&config);
    grid.set_box(1, 2, 0, [0., 0., 0., 0., 10.], &[1.]);

    let result = decode(&grid.tensor(), &config).unwrap();
    assert_eq!(result.len(), 1);

    // center x = (col 2 + 0.5) * 32, center y = (row 1 + 0.5) * 16
    let det = &result[0];
    assert_eq!(det.bbox.cx(), 80.);
    assert_eq!(det.bbox.cy(), 24.);
    assert_eq!((det.x(), det.y()), (64., 16.));
    assert_eq!(det.label, "# 0");
}

#[test]
fn anchors_and_offsets_scale_the_box() {
    let config = GridConfig::new()
        .with_grid(1, 1)
        .with_boxes_per_cell(2)
        .with_class_count(1)
        .with_anchors(&[1., 1., 2., 3.]);
    let mut grid = GridBuilder::for_config(&config);
    grid.set_box(0, 0, 1, [0., 0., 1., 0., 10.], &[0.]);

    let result = decode(&grid.tensor(), &config).unwrap();
    assert_eq!(result.len(), 1);

    let det = &result[0];
    let expected_w = 1f32.exp() * 2. * 32.;
    assert!((det.width() - expected_w).abs() < 1e-3);
    assert_eq!(det.height(), 96.);
    assert!((det.bbox.cx() - 16.).abs() < 1e-4);
}

#[test]
fn output_follows_grid_order() {
    let config = GridConfig::new()
        .with_grid(2, 2)
        .with_boxes_per_cell(2)
        .with_class_count(3)
        .with_anchors(&[1., 1., 1., 1.]);
    let mut grid = GridBuilder::for_config(&config);
    grid.set_box(1, 0, 0, [0., 0., 0., 0., 10.], &[0., 0., 9.]);
    grid.set_box(0, 1, 1, [0., 0., 0., 0., 10.], &[0., 9., 0.]);
    grid.set_box(0, 1, 0, [0., 0., 0., 0., 10.], &[9., 0., 0.]);

    let result = decode(&grid.tensor(), &config).unwrap();
    let classes: Vec<usize> = result.iter().map(|d| d.class_id).collect();
    assert_eq!(classes, vec![0, 1, 2]);
}

#[test]
fn default_config_uses_voc_names() {
    let config = GridConfig::default();
    let mut grid = GridBuilder::for_config(&config);
    let mut logits = vec![0.; 20];
    logits[14] = 8.;
    grid.set_box(6, 6, 2, [0., 0., 0., 0., 6.], &logits);

    let result = decode(&grid.tensor(), &config).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].label, "person");
    assert_eq!(result[0].class_id, 14);
}

#[test]
fn identical_inputs_give_identical_output() {
    let config = GridConfig::default().with_confidence_threshold(0.2);
    let mut rng = StdRng::seed_from_u64(42);
    let mut grid = GridBuilder::for_config(&config);
    grid.data.mapv_inplace(|_| rng.gen_range(-3.0..3.0));

    let decoder = DetectionDecoder::new(config).unwrap();
    let first = decoder.decode(&grid.tensor()).unwrap();
    let second = decoder.decode(&grid.tensor()).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.class_id, b.class_id);
        assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        assert_eq!(a.class_score.to_bits(), b.class_score.to_bits());
        assert_eq!(a.bbox.x1.to_bits(), b.bbox.x1.to_bits());
        assert_eq!(a.bbox.y1.to_bits(), b.bbox.y1.to_bits());
        assert_eq!(a.bbox.w.to_bits(), b.bbox.w.to_bits());
        assert_eq!(a.bbox.h.to_bits(), b.bbox.h.to_bits());
    }
}

#[test]
fn raising_threshold_never_adds_detections() {
    let base = GridConfig::new()
        .with_grid(4, 4)
        .with_boxes_per_cell(2)
        .with_class_count(3)
        .with_anchors(&[1., 1., 2., 2.]);
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..10 {
        let mut grid = GridBuilder::for_config(&base);
        grid.data.mapv_inplace(|_| rng.gen_range(-4.0..4.0));

        let mut previous = usize::MAX;
        for step in 0..=20 {
            let threshold = step as f32 / 20.;
            let config = base.clone().with_confidence_threshold(threshold);
            let count = decode(&grid.tensor(), &config).unwrap().len();
            assert!(count <= previous, "threshold {} gave {} > {}", threshold, count, previous);
            previous = count;
        }
    }
}

#[test]
fn nchw_and_f16_tensors_decode_like_nhwc() {
    let config = GridConfig::new()
        .with_grid(3, 2)
        .with_boxes_per_cell(1)
        .with_class_count(2)
        .with_anchors(&[1.5, 0.5])
        .with_confidence_threshold(0.25);
    let mut grid = GridBuilder::for_config(&config);
    grid.set_box(2, 1, 0, [0.5, -0.5, 0.25, 0.75, 4.], &[1., 3.]);
    grid.set_box(0, 0, 0, [1., 1., 0., 0., 3.], &[2., 0.]);

    let expected = decode(&grid.tensor(), &config).unwrap();
    assert_eq!(expected.len(), 2);

    let nchw = grid.data.view().permuted_axes([0, 3, 1, 2]);
    let nchw_tensor = GridTensor::nchw(nchw).unwrap();
    assert_eq!(decode(&nchw_tensor, &config).unwrap(), expected);

    let halves = grid.data.mapv(f16::from_f32);
    let half_tensor = GridTensorF16::nhwc(halves.view()).unwrap();
    let from_half = decode(&half_tensor, &config).unwrap();
    assert_eq!(from_half.len(), expected.len());
    for (a, b) in from_half.iter().zip(&expected) {
        assert_eq!(a.class_id, b.class_id);
        assert!((a.bbox.x1 - b.bbox.x1).abs() < 0.1);
        assert!((a.bbox.w - b.bbox.w).abs() < 0.1);
    }
}

#[test]
fn dynamic_rank_tensor() {
    let config = scenario_config(0.3);
    let mut grid = GridBuilder::for_config(&config);
    grid.set_box(0, 0, 0, [0., 0., 0., 0., 10.], &[0., 5.]);

    let dyn_view = grid.data.view().into_dyn();
    let tensor = GridTensor::from_dyn(dyn_view, TensorLayout::Nhwc).unwrap();
    let result = decode(&tensor, &config).unwrap();
    assert_eq!(result[0].label, "dog");

    let flat = ndarray::Array3::<f32>::zeros((1, 1, 7)).into_dyn();
    let err = GridTensor::from_dyn(flat.view(), TensorLayout::Nhwc).unwrap_err();
    assert!(matches!(err, DecodeError::Configuration { .. }));
}

#[test]
fn degenerate_boxes_are_skipped_and_reported() {
    let config = GridConfig::new()
        .with_grid(1, 3)
        .with_boxes_per_cell(1)
        .with_class_count(2)
        .with_anchors(&[1., 1.]);
    let mut grid = GridBuilder::for_config(&config);
    grid.set_box(0, 0, 0, [0., 0., 0., 0., f32::NAN], &[1., 0.]);
    grid.set_box(0, 1, 0, [0., 0., 100., 0., 10.], &[1., 0.]);
    grid.set_box(0, 2, 0, [0., 0., 0., 0., 10.], &[0., 4.]);

    let decoder = DetectionDecoder::new(config).unwrap();
    let report = decoder.decode_report(&grid.tensor()).unwrap();

    assert_eq!(report.detections.len(), 1);
    assert_eq!(report.detections[0].class_id, 1);
    assert_eq!(
        report.degenerate,
        vec![
            DecodeError::NumericDegenerate { cx: 0, cy: 0, b: 0, what: "objectness" },
            DecodeError::NumericDegenerate { cx: 0, cy: 1, b: 0, what: "box size" },
        ]
    );
    assert_eq!(decoder.decode(&grid.tensor()).unwrap(), report.detections);
}

#[test]
fn batch_decode_keeps_input_order() {
    let config = scenario_config(0.3);
    let mut grids = Vec::new();
    for i in 0..8 {
        let mut grid = GridBuilder::for_config(&config);
        let logits = if i % 2 == 0 { [5., 0.] } else { [0., 5.] };
        let t_obj = if i == 3 { -10. } else { 10. };
        grid.set_box(0, 0, 0, [0., 0., 0., 0., t_obj], &logits);
        grids.push(grid);
    }
    let tensors: Vec<_> = grids.iter().map(|g| g.tensor()).collect();

    let decoder = DetectionDecoder::new(config).unwrap();
    let results = decoder.decode_batch(&tensors);
    assert_eq!(results.len(), 8);

    for (i, result) in results.into_iter().enumerate() {
        let result = result.unwrap();
        if i == 3 {
            assert!(result.is_empty());
        } else {
            assert_eq!(result[0].class_id, i % 2);
        }
    }
}

#[test]
fn detections_round_trip_through_json() {
    let config = scenario_config(0.3);
    let mut grid = GridBuilder::for_config(&config);
    grid.set_box(0, 0, 0, [0.3, -0.2, 0.1, 0.4, 10.], &[5., 0.]);

    let result = decode(&grid.tensor(), &config).unwrap();
    let json = serde_json::to_string(&result).unwrap();
    let parsed: Vec<Detection> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, result);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_decodes_over_independent_tensors() {
    let config = GridConfig::default().with_confidence_threshold(0.2);
    let decoder = Arc::new(DetectionDecoder::new(config.clone()).unwrap());
    let mut rng = StdRng::seed_from_u64(3);

    let mut handles = Vec::new();
    let mut expected = Vec::new();
    for _ in 0..6 {
        let mut grid = GridBuilder::for_config(&config);
        grid.data.mapv_inplace(|_| rng.gen_range(-3.0..3.0));
        expected.push(decoder.decode(&grid.tensor()).unwrap());

        let decoder = Arc::clone(&decoder);
        handles.push(tokio::task::spawn_blocking(move || {
            decoder.decode(&grid.tensor()).unwrap()
        }));
    }

    for (handle, expected) in handles.into_iter().zip(expected) {
        assert_eq!(handle.await.unwrap(), expected);
    }
}
