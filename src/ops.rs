//! Box transforms: resizing, shifting, scaling and aspect-ratio correction.
//!
//! Every transform returns a new collection with the same fields as its
//! input. Only the coordinates change.

use crate::boxes::Boxes;
use crate::error::{BbxError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-axis parameter of a transform.
///
/// A plain `f64` converts into a factor applied to both axes, an `(x, y)`
/// pair applies separately to each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub x: f64,
    pub y: f64,
}

impl Factor {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn uniform(value: f64) -> Self {
        Self { x: value, y: value }
    }
}

impl From<f64> for Factor {
    fn from(value: f64) -> Self {
        Self::uniform(value)
    }
}

impl From<(f64, f64)> for Factor {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Factor {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl TryFrom<&[f64]> for Factor {
    type Error = BbxError;

    fn try_from(values: &[f64]) -> Result<Self> {
        match *values {
            [v] => Ok(Self::uniform(v)),
            [x, y] => Ok(Self::new(x, y)),
            _ => Err(BbxError::ShapeMismatch(format!(
                "Expected 1 or 2 factor values, got {}",
                values.len()
            ))),
        }
    }
}

/// How [`set_aspect_ratio`] chooses the new width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectPolicy {
    /// Keep the width, derive the height.
    KeepWidth,
    /// Keep the height, derive the width.
    KeepHeight,
    /// Keep the area exactly.
    KeepArea,
    /// Never shrink either dimension.
    Expand,
    /// Never grow either dimension.
    Shrink,
}

impl AspectPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectPolicy::KeepWidth => "keep_width",
            AspectPolicy::KeepHeight => "keep_height",
            AspectPolicy::KeepArea => "keep_area",
            AspectPolicy::Expand => "expand",
            AspectPolicy::Shrink => "shrink",
        }
    }
}

impl fmt::Display for AspectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AspectPolicy {
    type Err = BbxError;

    /// Accepts `keep_width`, `KEEP_WIDTH`, `keep-width` and so on.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_width" => Ok(AspectPolicy::KeepWidth),
            "keep_height" => Ok(AspectPolicy::KeepHeight),
            "keep_area" => Ok(AspectPolicy::KeepArea),
            "expand" => Ok(AspectPolicy::Expand),
            "shrink" => Ok(AspectPolicy::Shrink),
            _ => Err(BbxError::InvalidPolicy(format!(
                "Unknown aspect ratio policy '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for AspectPolicy {
    type Error = BbxError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AspectPolicy> for String {
    fn from(policy: AspectPolicy) -> Self {
        policy.as_str().to_string()
    }
}

/// Rebuild boxes from per-box centers and sizes.
fn from_centers(boxes: &Boxes, sizes: impl Iterator<Item = (f64, f64)>) -> Boxes {
    let coords = boxes
        .center()
        .into_iter()
        .zip(sizes)
        .map(|([cx, cy], (w, h))| [cx - 0.5 * w, cy - 0.5 * h, cx + 0.5 * w, cy + 0.5 * h])
        .collect();
    boxes.with_coords(coords)
}

/// Resize every box by `factor` around its center.
///
/// Factors at or below zero are accepted and give degenerate boxes
/// (zero-sized, or mirrored and then re-normalized).
///
/// # Arguments
///
/// * `boxes` - Boxes to resize
/// * `factor` - Width and height multiplier, uniform or per axis
///
/// # Returns
///
/// New boxes with the same centers and fields
///
/// # Example
///
/// ```
/// use bbx::{ops, Boxes};
///
/// let boxes = Boxes::new(vec![[0.0, 0.0, 10.0, 10.0]]);
/// let bigger = ops::resize(&boxes, 2.0);
/// assert_eq!(bigger.coords()[0], [-5.0, -5.0, 15.0, 15.0]);
/// ```
#[must_use]
pub fn resize(boxes: &Boxes, factor: impl Into<Factor>) -> Boxes {
    let Factor { x: sx, y: sy } = factor.into();
    let sizes = boxes
        .width()
        .into_iter()
        .zip(boxes.height())
        .map(|(w, h)| (sx * w, sy * h));
    from_centers(boxes, sizes)
}

/// Move every box by `delta`.
///
/// With `relative` set, `delta` is a fraction of each box's own width and
/// height, so boxes of different sizes move by different amounts.
/// Otherwise the same absolute offset applies to all boxes.
///
/// # Arguments
///
/// * `boxes` - Boxes to move
/// * `delta` - Offset along x and y
/// * `relative` - Interpret `delta` as a fraction of each box's size
#[must_use]
pub fn shift(boxes: &Boxes, delta: impl Into<Factor>, relative: bool) -> Boxes {
    let Factor { x: dx, y: dy } = delta.into();
    let coords = boxes
        .coords()
        .iter()
        .map(|&[x1, y1, x2, y2]| {
            let (ox, oy) = if relative {
                (dx * (x2 - x1), dy * (y2 - y1))
            } else {
                (dx, dy)
            };
            [x1 + ox, y1 + oy, x2 + ox, y2 + oy]
        })
        .collect();
    boxes.with_coords(coords)
}

/// Multiply all corner coordinates by `factor`.
///
/// Unlike [`resize`] this moves the boxes as well, since the corners are
/// scaled about the origin rather than about each center.
///
/// # Returns
///
/// New boxes with every corner multiplied by `factor`, re-normalized
#[must_use]
pub fn scale(boxes: &Boxes, factor: impl Into<Factor>) -> Boxes {
    let Factor { x: sx, y: sy } = factor.into();
    let coords = boxes
        .coords()
        .iter()
        .map(|&[x1, y1, x2, y2]| [sx * x1, sy * y1, sx * x2, sy * y2])
        .collect();
    boxes.with_coords(coords)
}

/// Absolute [`shift`] by `delta` followed by [`scale`] by `factor`.
///
/// Typical use is mapping pixel boxes into unit coordinates, e.g.
/// `normalized(&b, (-left, -top), (1.0 / w, 1.0 / h))`.
#[must_use]
pub fn normalized(boxes: &Boxes, delta: impl Into<Factor>, factor: impl Into<Factor>) -> Boxes {
    scale(&shift(boxes, delta, false), factor)
}

/// Change each box so that `width / height == target_ratio`, keeping the center.
///
/// # Arguments
///
/// * `boxes` - Boxes to correct
/// * `target_ratio` - Desired width over height
/// * `policy` - Which dimension is preserved, see [`AspectPolicy`]
///
/// # Returns
///
/// New boxes whose width over height equals `target_ratio`
///
/// # Example
///
/// ```
/// use bbx::{ops, AspectPolicy, Boxes};
///
/// let boxes = Boxes::new(vec![[0.0, 0.0, 10.0, 10.0]]);
/// let wide = ops::set_aspect_ratio(&boxes, 2.0, AspectPolicy::KeepWidth);
/// assert_eq!(wide.coords()[0], [0.0, 2.5, 10.0, 7.5]);
/// ```
#[must_use]
pub fn set_aspect_ratio(boxes: &Boxes, target_ratio: f64, policy: AspectPolicy) -> Boxes {
    let keep_width = |w: f64| (w, w / target_ratio);
    let keep_height = |h: f64| (h * target_ratio, h);

    let sizes = boxes
        .width()
        .into_iter()
        .zip(boxes.height())
        .map(|(w, h)| match policy {
            AspectPolicy::KeepWidth => keep_width(w),
            AspectPolicy::KeepHeight => keep_height(h),
            AspectPolicy::KeepArea => {
                let area = w * h;
                let new_width = (area * target_ratio).sqrt();
                (new_width, area / new_width)
            }
            AspectPolicy::Expand => {
                if w / h > target_ratio {
                    keep_width(w)
                } else {
                    keep_height(h)
                }
            }
            AspectPolicy::Shrink => {
                if w / h > target_ratio {
                    keep_height(h)
                } else {
                    keep_width(w)
                }
            }
        });
    from_centers(boxes, sizes)
}

impl Boxes {
    /// See [`resize`].
    #[must_use]
    pub fn resize(&self, factor: impl Into<Factor>) -> Boxes {
        resize(self, factor)
    }

    /// See [`shift`].
    #[must_use]
    pub fn shift(&self, delta: impl Into<Factor>, relative: bool) -> Boxes {
        shift(self, delta, relative)
    }

    /// See [`scale`].
    #[must_use]
    pub fn scale(&self, factor: impl Into<Factor>) -> Boxes {
        scale(self, factor)
    }

    /// See [`set_aspect_ratio`].
    #[must_use]
    pub fn set_aspect_ratio(&self, target_ratio: f64, policy: AspectPolicy) -> Boxes {
        set_aspect_ratio(self, target_ratio, policy)
    }
}
