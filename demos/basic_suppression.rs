//! Example demonstrating grouped non-maximum suppression on raw detections.
//!
//! Run with `RUST_LOG=bbx=trace` to see every emitted group.

use bbx::nms::{non_max_suppression, NmsConfig, Reduction};
use bbx::{boxes_in_window, Boxes};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Grouped Non-Maximum Suppression Example (bbx {}) ===\n", bbx::VERSION);

    // Three overlapping candidates for one object, two for another, one stray
    let detections = Boxes::new(vec![
        [100.0, 100.0, 200.0, 220.0],
        [104.0, 98.0, 205.0, 215.0],
        [96.0, 105.0, 198.0, 225.0],
        [400.0, 50.0, 480.0, 150.0],
        [405.0, 55.0, 482.0, 148.0],
        [700.0, 400.0, 720.0, 420.0],
    ])
    .with_field("scores", vec![0.92, 0.88, 0.61, 0.97, 0.70, 0.35])?
    .with_field("labels", vec![1.0, 1.0, 1.0, 2.0, 2.0, 3.0])?;

    println!("1. Input: {} candidate boxes", detections.len());
    for (coords, score) in detections.coords().iter().zip(detections.scalar_field("scores")?) {
        println!("   {:?} score={:.2}", coords, score);
    }
    println!();

    for reduction in [Reduction::Max, Reduction::Mean] {
        let config = NmsConfig::new()
            .with_iou_threshold(0.5)
            .with_min_score(0.3)
            .with_reduction(reduction);
        let kept = non_max_suppression(&detections, &config)?;

        println!("2. Reduction '{}': {} boxes kept", reduction, kept.len());
        let scores = kept.scalar_field("scores")?;
        let sizes = kept.scalar_field("size")?;
        for ((coords, score), size) in kept.coords().iter().zip(scores).zip(sizes) {
            println!(
                "   [{:>6.1}, {:>6.1}, {:>6.1}, {:>6.1}] score={:.2} size={}",
                coords[0], coords[1], coords[2], coords[3], score, size
            );
        }
        println!();
    }

    // Keep only groups backed by at least two candidates
    let config = NmsConfig::from_json(r#"{"min_group_size": 2, "reduction": "mean"}"#)?;
    let confirmed = non_max_suppression(&detections, &config)?;
    println!("3. Groups with at least two candidates: {}", confirmed.len());
    println!();

    // Which confirmed detections fall inside the left half of the frame?
    let window = Boxes::new(vec![[0.0, 0.0, 320.0, 480.0]]);
    let inside = boxes_in_window(&confirmed, &window, 0.9);
    println!("4. Inside left half of the frame: {:?}", inside);

    Ok(())
}
