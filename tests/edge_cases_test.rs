//! Comprehensive edge case and boundary condition tests.

use bbx::nms::{non_max_suppression, overlapping_groups, NmsConfig, Reduction};
use bbx::{boxes_in_window, concatenate, empty, intersection, iou, AspectPolicy, Boxes, FieldArray};

fn create_detections(coords: Vec<[f64; 4]>, scores: Vec<f64>) -> Boxes {
    Boxes::new(coords).with_field("scores", scores).unwrap()
}

// ============================================================================
// SUPPRESSION EDGE CASES
// ============================================================================

#[test]
fn test_empty_input() {
    let boxes = empty(&["scores"]);
    let kept = non_max_suppression(&boxes, &NmsConfig::default()).unwrap();
    assert!(kept.is_empty());
    assert_eq!(kept.get_field("scores").unwrap().len(), 0);
    assert_eq!(kept.get_field("size").unwrap().len(), 0);
}

#[test]
fn test_min_score_above_every_box() {
    let boxes = create_detections(vec![[0.0, 0.0, 1.0, 1.0], [5.0, 5.0, 6.0, 6.0]], vec![0.3, 0.4]);
    let config = NmsConfig::new().with_min_score(0.5);
    let kept = non_max_suppression(&boxes, &config).unwrap();
    assert!(kept.is_empty());
    assert!(kept.has_field("scores"));
    assert!(kept.has_field("size"));
}

#[test]
fn test_min_score_is_exclusive() {
    let boxes = create_detections(vec![[0.0, 0.0, 1.0, 1.0]], vec![0.5]);
    let config = NmsConfig::new().with_min_score(0.5);
    assert!(non_max_suppression(&boxes, &config).unwrap().is_empty());
}

#[test]
fn test_identical_scores_keep_input_order() {
    let boxes = create_detections(
        vec![[0.0, 0.0, 10.0, 10.0], [0.0, 0.0, 10.0, 10.0], [0.0, 0.0, 10.0, 10.0]],
        vec![0.5, 0.5, 0.5],
    )
    .with_field("id", vec![0.0, 1.0, 2.0])
    .unwrap();

    let groups: Vec<Boxes> = overlapping_groups(&boxes, 0.5, "scores").unwrap().collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].scalar_field("id").unwrap(), &[0.0, 1.0, 2.0]);
}

#[test]
fn test_zero_threshold_merges_disjoint_boxes() {
    // IoU >= 0 holds for every non-degenerate pair, even disjoint ones
    let boxes = create_detections(
        vec![[0.0, 0.0, 1.0, 1.0], [100.0, 100.0, 101.0, 101.0]],
        vec![0.9, 0.8],
    );
    let config = NmsConfig::new().with_iou_threshold(0.0);
    let kept = non_max_suppression(&boxes, &config).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept.scalar_field("size").unwrap(), &[2.0]);
}

#[test]
fn test_full_threshold_requires_identical_boxes() {
    let boxes = create_detections(
        vec![[0.0, 0.0, 10.0, 10.0], [0.0, 0.0, 10.0, 10.0], [0.0, 0.0, 10.0, 9.9]],
        vec![0.9, 0.8, 0.7],
    );
    let config = NmsConfig::new().with_iou_threshold(1.0);
    let kept = non_max_suppression(&boxes, &config).unwrap();
    assert_eq!(kept.scalar_field("size").unwrap(), &[2.0, 1.0]);
}

#[test]
fn test_max_groups_counts_surviving_groups() {
    let boxes = create_detections(
        vec![
            [0.0, 0.0, 1.0, 1.0],
            [10.0, 10.0, 20.0, 20.0],
            [10.0, 10.0, 20.0, 19.0],
            [50.0, 50.0, 60.0, 60.0],
            [50.0, 50.0, 60.0, 59.0],
        ],
        vec![0.99, 0.9, 0.8, 0.7, 0.6],
    );
    // The singleton is dropped and does not use up the group budget
    let config = NmsConfig::new().with_min_group_size(2).with_max_groups(1);
    let kept = non_max_suppression(&boxes, &config).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept.scalar_field("scores").unwrap(), &[0.9]);
}

#[test]
fn test_degenerate_boxes_are_not_errors() {
    let boxes = create_detections(vec![[5.0, 5.0, 5.0, 5.0], [5.0, 5.0, 5.0, 5.0]], vec![0.9, 0.8]);
    let kept = non_max_suppression(&boxes, &NmsConfig::default()).unwrap();
    // Zero-union IoU never reaches the threshold, so each box stands alone
    assert_eq!(kept.len(), 2);
    assert!(iou(&boxes, &boxes)[0][1].is_nan());
}

#[test]
fn test_mean_of_single_box_is_identity() {
    let boxes = create_detections(vec![[1.0, 2.0, 3.0, 4.0]], vec![0.5]);
    let config = NmsConfig::new().with_reduction(Reduction::Mean);
    let kept = non_max_suppression(&boxes, &config).unwrap();
    let c = kept.coords()[0];
    for (a, b) in c.iter().zip([1.0, 2.0, 3.0, 4.0]) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_mean_with_large_scores_is_stable() {
    let boxes = create_detections(
        vec![[0.0, 0.0, 10.0, 10.0], [0.0, 0.0, 10.0, 10.0]],
        vec![1000.0, 999.0],
    );
    let config = NmsConfig::new().with_reduction(Reduction::Mean);
    let kept = non_max_suppression(&boxes, &config).unwrap();
    assert!(kept.coords()[0].iter().all(|v| v.is_finite()));
}

// ============================================================================
// COLLECTION EDGE CASES
// ============================================================================

#[test]
fn test_zero_height_aspect_ratio() {
    let boxes = Boxes::new(vec![[0.0, 3.0, 10.0, 3.0]]);
    assert_eq!(boxes.aspect_ratio()[0], f64::INFINITY);

    // Expand keeps the width and grows the height
    let fixed = boxes.set_aspect_ratio(2.0, AspectPolicy::Expand);
    assert_eq!(fixed.width()[0], 10.0);
    assert_eq!(fixed.height()[0], 5.0);
}

#[test]
fn test_negative_coordinates() {
    let boxes = Boxes::new(vec![[-10.0, -10.0, -20.0, -5.0]]);
    assert_eq!(boxes.coords()[0], [-20.0, -10.0, -10.0, -5.0]);
    assert_eq!(boxes.area(), vec![50.0]);
}

#[test]
fn test_mean_reduction_with_infinite_score() {
    let boxes = create_detections(
        vec![[0.0, 0.0, 10.0, 10.0], [1.0, 1.0, 11.0, 11.0]],
        vec![f64::INFINITY, 0.5],
    );
    let config = NmsConfig::new().with_reduction(Reduction::Mean);
    let kept = non_max_suppression(&boxes, &config).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept.coords()[0], [0.0, 0.0, 10.0, 10.0]);
    assert!(kept.coords()[0].iter().all(|c| c.is_finite()));
}

#[test]
fn test_concatenate_empty_parts() {
    let a = create_detections(vec![[0.0, 0.0, 1.0, 1.0]], vec![0.5]);
    let merged = concatenate(&[empty(&["scores"]), a.clone(), empty(&["scores"])]).unwrap();
    assert_eq!(merged, a);
}

#[test]
fn test_concatenate_empty_part_with_vector_field() {
    // `empty` declares scalar fields; with no rows it must not fix the width
    let keypoints = FieldArray::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    let a = Boxes::new(vec![[0.0, 0.0, 1.0, 1.0], [2.0, 2.0, 3.0, 3.0]])
        .with_field("kp", keypoints)
        .unwrap();

    let merged = concatenate(&[empty(&["kp"]), a.clone()]).unwrap();
    assert_eq!(merged, a);
    assert_eq!(merged.get_field("kp").unwrap().width(), 2);

    let trailing = concatenate(&[a.clone(), empty(&["kp"])]).unwrap();
    assert_eq!(trailing, a);

    let only_empty = concatenate(&[empty(&["kp"]), empty(&["kp"])]).unwrap();
    assert!(only_empty.is_empty());
    assert_eq!(only_empty.get_field("kp").unwrap().width(), 1);
}

#[test]
fn test_vector_field_follows_slicing_and_concatenation() {
    let landmarks = FieldArray::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    let boxes = Boxes::new(vec![[0.0, 0.0, 1.0, 1.0], [2.0, 2.0, 3.0, 3.0]])
        .with_field("landmarks", landmarks)
        .unwrap();
    let swapped = concatenate(&[boxes.get(1).unwrap(), boxes.get(0).unwrap()]).unwrap();
    assert_eq!(swapped.get_field("landmarks").unwrap().row(0), &[4.0, 5.0, 6.0]);
    assert_eq!(swapped.get_field("landmarks").unwrap().width(), 3);
}

#[test]
fn test_intersection_never_negative() {
    let a = Boxes::new(vec![[0.0, 0.0, 1.0, 1.0]]);
    let b = Boxes::new(vec![[-100.0, 50.0, -90.0, 60.0], [2.0, -5.0, 3.0, -4.0]]);
    assert!(intersection(&a, &b)[0].iter().all(|&v| v == 0.0));
}

#[test]
fn test_window_containment_threshold() {
    let boxes = Boxes::new(vec![[0.0, 0.0, 10.0, 10.0]]);
    let half = Boxes::new(vec![[5.0, 0.0, 100.0, 100.0]]);
    assert_eq!(boxes_in_window(&boxes, &half, 0.5), vec![true]);
    assert_eq!(boxes_in_window(&boxes, &half, 0.51), vec![false]);
}
