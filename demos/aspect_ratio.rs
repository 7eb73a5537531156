//! Example demonstrating box transforms before cropping.

use bbx::{ops, AspectPolicy, Boxes};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Face detections of varying shape, to be cropped at a fixed 3:4 ratio
    let faces = Boxes::from_xywh(&[
        [120.0, 80.0, 60.0, 90.0],
        [300.0, 40.0, 110.0, 100.0],
        [20.0, 200.0, 45.0, 45.0],
    ])
    .with_field("scores", vec![0.99, 0.93, 0.81])?;

    println!("=== Aspect Ratio Correction Example ===\n");
    println!("   Policy      | Box 0 (w x h)   | Box 1 (w x h)   | Box 2 (w x h)");
    println!("   ------------|-----------------|-----------------|----------------");

    for policy in [
        AspectPolicy::KeepWidth,
        AspectPolicy::KeepHeight,
        AspectPolicy::KeepArea,
        AspectPolicy::Expand,
        AspectPolicy::Shrink,
    ] {
        let fixed = faces.set_aspect_ratio(0.75, policy);
        let cells: Vec<String> = fixed
            .width()
            .iter()
            .zip(fixed.height())
            .map(|(w, h)| format!("{:>6.1} x {:>6.1}", w, h))
            .collect();
        println!("   {:<11} | {}", policy, cells.join(" | "));
    }
    println!();

    // Add a margin and map into unit coordinates of a 640x480 frame
    let crops = faces
        .set_aspect_ratio(0.75, AspectPolicy::Expand)
        .resize(1.2);
    let unit = ops::normalized(&crops, 0.0, (1.0 / 640.0, 1.0 / 480.0));
    for (coords, score) in unit.coords().iter().zip(unit.scalar_field("scores")?) {
        println!(
            "   crop [{:.3}, {:.3}, {:.3}, {:.3}] score={:.2}",
            coords[0], coords[1], coords[2], coords[3], score
        );
    }

    Ok(())
}
