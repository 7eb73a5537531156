//! Grouped Non-Maximum Suppression (`NMS`)
//!
//! Boxes are partitioned greedily into overlap groups seeded by the highest
//! remaining score, and each group is reduced to a single output box.

use crate::boxes::{concatenate, empty, Boxes};
use crate::error::{BbxError, Result};
use crate::metrics::box_iou;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;
use tracing::{debug, trace};

/// Name of the score field on suppression output.
pub const SCORES_FIELD: &str = "scores";

/// Name of the group cardinality field on suppression output.
pub const SIZE_FIELD: &str = "size";

/// How a group of overlapping boxes is reduced to one box.
///
/// Names parse case-insensitively, both through [`FromStr`] and when a
/// config is deserialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Reduction {
    /// Coordinates of the highest-scoring box in the group.
    #[default]
    Max,
    /// Softmax-weighted average of the group's coordinates.
    ///
    /// When some scores are `+inf` the weights take their limit: the
    /// infinite-score boxes share the weight equally and the rest get none.
    Mean,
}

impl Reduction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reduction::Max => "max",
            Reduction::Mean => "mean",
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Reduction {
    type Err = BbxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(Reduction::Max),
            "mean" => Ok(Reduction::Mean),
            _ => Err(BbxError::InvalidPolicy(format!(
                "reduction must be 'max' or 'mean', got '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Reduction {
    type Error = BbxError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Reduction> for String {
    fn from(reduction: Reduction) -> Self {
        reduction.as_str().to_string()
    }
}

/// Parameters of [`non_max_suppression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NmsConfig {
    /// Boxes with `IoU >= iou_threshold` against a seed join its group
    pub iou_threshold: f64,
    /// Boxes scoring at or below this value are discarded up front
    pub min_score: f64,
    /// Scalar field holding the confidence scores
    pub score_field: String,
    pub reduction: Reduction,
    /// Stop after this many groups have been emitted
    pub max_groups: Option<usize>,
    /// Groups with fewer boxes are dropped
    pub min_group_size: usize,
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            min_score: 0.0,
            score_field: SCORES_FIELD.to_string(),
            reduction: Reduction::Max,
            max_groups: None,
            min_group_size: 1,
        }
    }
}

impl NmsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iou_threshold(mut self, iou_threshold: f64) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_score_field(mut self, score_field: impl Into<String>) -> Self {
        self.score_field = score_field.into();
        self
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_max_groups(mut self, max_groups: usize) -> Self {
        self.max_groups = Some(max_groups);
        self
    }

    pub fn with_min_group_size(mut self, min_group_size: usize) -> Self {
        self.min_group_size = min_group_size;
        self
    }

    /// Parse a configuration from JSON. Missing keys take their default value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolicy` for an unknown reduction name, `JsonError`
    /// for other malformed input and `InvalidThreshold` if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bbx::nms::{NmsConfig, Reduction};
    /// let config = NmsConfig::from_json(r#"{"iou_threshold": 0.3, "reduction": "mean"}"#).unwrap();
    /// assert_eq!(config.reduction, Reduction::Mean);
    /// assert_eq!(config.score_field, "scores");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(reduction) = value.get("reduction").and_then(|r| r.as_str()) {
            reduction.parse::<Reduction>()?;
        }
        let config: NmsConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the thresholds are usable.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(BbxError::InvalidThreshold(format!(
                "IoU threshold must be between 0 and 1, got {}",
                self.iou_threshold
            )));
        }
        if self.min_score.is_nan() {
            return Err(BbxError::InvalidThreshold(
                "Minimum score must not be NaN".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lazy sequence of overlap groups, produced by [`overlapping_groups`].
///
/// Boxes are visited in descending score order. Each call to `next` takes
/// the best unassigned box as the seed, pulls every unassigned box with
/// `IoU >= iou_threshold` against it into the group, and returns the group
/// as a new collection (seed first). Every box lands in exactly one group.
#[derive(Debug, Clone)]
pub struct OverlappingGroups {
    sorted: Boxes,
    unassigned: Vec<usize>,
    iou_threshold: f64,
}

impl Iterator for OverlappingGroups {
    type Item = Boxes;

    fn next(&mut self) -> Option<Boxes> {
        let (&seed, rest) = self.unassigned.split_first()?;
        let coords = self.sorted.coords();
        let seed_box = coords[seed];

        let mut members = vec![seed];
        let mut remaining = Vec::with_capacity(rest.len());
        for &candidate in rest {
            if box_iou(&seed_box, &coords[candidate]) >= self.iou_threshold {
                members.push(candidate);
            } else {
                remaining.push(candidate);
            }
        }
        self.unassigned = remaining;

        trace!(
            seed,
            size = members.len(),
            remaining = self.unassigned.len(),
            "emitting overlap group"
        );
        Some(self.sorted.gather(&members))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.unassigned.len();
        (left.min(1), Some(left))
    }
}

impl FusedIterator for OverlappingGroups {}

/// Partition boxes into overlap groups, ordered by the scalar field `order_by`.
///
/// Ties in `order_by` keep their input order, which makes the grouping
/// deterministic.
///
/// # Errors
///
/// Returns `MissingField` if `order_by` is absent and `ShapeMismatch` if
/// it is not a scalar field.
pub fn overlapping_groups(
    boxes: &Boxes,
    iou_threshold: f64,
    order_by: &str,
) -> Result<OverlappingGroups> {
    let sorted = boxes.sort_by_field(order_by, true)?;
    let unassigned = (0..sorted.len()).collect();
    Ok(OverlappingGroups {
        sorted,
        unassigned,
        iou_threshold,
    })
}

/// Apply grouped Non-Maximum Suppression.
///
/// Boxes scoring at or below `min_score` are dropped, the rest are grouped
/// with [`overlapping_groups`] and every group of at least `min_group_size`
/// boxes is reduced to one box. Grouping stops once `max_groups` boxes have
/// been produced.
///
/// # Returns
///
/// A new collection with one box per surviving group, in descending order
/// of seed score, carrying a `scores` field (the group's best score) and a
/// `size` field (the number of boxes in the group). The input is untouched.
///
/// # Errors
///
/// Returns `MissingField` if the score field is absent, `ShapeMismatch` if
/// it is not scalar, and `InvalidThreshold` if the config fails validation.
///
/// # Examples
///
/// ```
/// # use bbx::Boxes;
/// # use bbx::nms::{non_max_suppression, NmsConfig};
/// let boxes = Boxes::new(vec![
///     [10.0, 10.0, 50.0, 50.0],
///     [15.0, 15.0, 55.0, 55.0],
///     [100.0, 100.0, 150.0, 150.0],
/// ])
/// .with_field("scores", vec![0.9, 0.8, 0.95])
/// .unwrap();
///
/// let kept = non_max_suppression(&boxes, &NmsConfig::default()).unwrap();
/// assert_eq!(kept.len(), 2);
/// assert_eq!(kept.scalar_field("size").unwrap(), &[1.0, 2.0]);
/// ```
pub fn non_max_suppression(boxes: &Boxes, config: &NmsConfig) -> Result<Boxes> {
    config.validate()?;

    let scores = boxes.scalar_field(&config.score_field)?;
    let keep: Vec<bool> = scores.iter().map(|&s| s > config.min_score).collect();
    let candidates = boxes.filter(&keep)?;

    let mut groups = overlapping_groups(&candidates, config.iou_threshold, &config.score_field)?;
    let mut reduced = Vec::new();
    let mut visited = 0;
    while config.max_groups.map_or(true, |max| reduced.len() < max) {
        let Some(group) = groups.next() else {
            break;
        };
        visited += 1;
        if group.len() < config.min_group_size {
            continue;
        }
        reduced.push(reduce_group(&group, &config.score_field, config.reduction)?);
    }

    debug!(
        input = boxes.len(),
        candidates = candidates.len(),
        groups = visited,
        output = reduced.len(),
        reduction = %config.reduction,
        "non-maximum suppression finished"
    );

    if reduced.is_empty() {
        return Ok(empty(&[SCORES_FIELD, SIZE_FIELD]));
    }
    concatenate(&reduced)
}

/// Reduce a non-empty group to a single box with `scores` and `size` fields.
fn reduce_group(group: &Boxes, score_field: &str, reduction: Reduction) -> Result<Boxes> {
    let scores = group.scalar_field(score_field)?;
    let coords = group.coords();

    // First maximum, which is the seed for groups from `overlapping_groups`.
    let best = scores
        .iter()
        .enumerate()
        .fold(0, |best, (i, &s)| if s > scores[best] { i } else { best });
    let max_score = scores[best];

    let reduced = match reduction {
        Reduction::Max => coords[best],
        Reduction::Mean => {
            let weights = softmax(scores);
            let mut avg = [0.0; 4];
            for (c, w) in coords.iter().zip(&weights) {
                for k in 0..4 {
                    avg[k] += w * c[k];
                }
            }
            avg
        }
    };

    Boxes::new(vec![reduced])
        .with_field(SCORES_FIELD, vec![max_score])?
        .with_field(SIZE_FIELD, vec![group.len() as f64])
}

/// Softmax weights, shifted by the maximum for numerical stability.
fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::INFINITY {
        // inf - inf is NaN; use the limit instead
        let top = values.iter().filter(|&&v| v == max).count() as f64;
        return values
            .iter()
            .map(|&v| if v == max { 1.0 / top } else { 0.0 })
            .collect();
    }
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
