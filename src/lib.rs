//! # bbx
//!
//! Axis-aligned bounding box collections with per-box metadata, and grouped
//! non-maximum suppression for object detection pipelines.
//!
//! This library provides:
//! - **Boxes**: N boxes in `(x1, y1, x2, y2)` format plus named per-box fields
//! - **Transforms**: resize, shift, scale and aspect-ratio correction
//! - **Metrics**: pairwise intersection, IoU and IOA matrices
//! - **NMS**: greedy overlap grouping with `max` or `mean` reduction
//!
//! ## Quick Start
//!
//! ```rust
//! use bbx::{non_max_suppression, Boxes, NmsConfig, Reduction};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detections = Boxes::new(vec![
//!     [0.0, 0.0, 10.0, 10.0],
//!     [1.0, 1.0, 10.0, 10.0],
//!     [50.0, 50.0, 10.0, 10.0],
//! ])
//! .with_field("scores", vec![0.9, 0.8, 0.95])?;
//!
//! let config = NmsConfig::new().with_iou_threshold(0.5).with_reduction(Reduction::Max);
//! let kept = non_max_suppression(&detections, &config)?;
//!
//! assert_eq!(kept.len(), 2);
//! assert_eq!(kept.scalar_field("scores")?, &[0.95, 0.9]);
//! assert_eq!(kept.scalar_field("size")?, &[1.0, 2.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Corner Order
//!
//! Any two opposite corners are accepted. `[50, 50, 10, 10]` above is stored
//! as `[10, 10, 50, 50]`.

pub mod error;
pub mod field;
pub mod boxes;
pub mod ops;
pub mod metrics;
pub mod nms;

// Re-export commonly used types and functions
pub use error::{BbxError, Result};
pub use field::FieldArray;
pub use boxes::{concatenate, concatenate_fields, empty, empty_like, Boxes};
pub use ops::{AspectPolicy, Factor};
pub use metrics::{boxes_in_window, intersection, ioa, iou};
pub use nms::{non_max_suppression, overlapping_groups, NmsConfig, OverlappingGroups, Reduction};

/// Version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
