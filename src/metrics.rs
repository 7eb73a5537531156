//! Pairwise overlap metrics between two box collections.
//!
//! Every function returns an `(M, N)` matrix as a vector of rows, where
//! `result[i][j]` compares box `i` of the first collection with box `j`
//! of the second.

use crate::boxes::{box_area, Boxes};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Row-major `(M, N)` matrix of pairwise values.
pub type Matrix = Vec<Vec<f64>>;

/// Evaluate `metric(i, j)` for every pair of indices.
///
/// With the `parallel` feature rows are computed on the rayon pool. Each
/// element is still produced by the same scalar expression, so both paths
/// give identical numbers.
fn pairwise<F>(rows: usize, cols: usize, metric: F) -> Matrix
where
    F: Fn(usize, usize) -> f64 + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..rows)
            .into_par_iter()
            .map(|i| (0..cols).map(|j| metric(i, j)).collect())
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..rows)
            .map(|i| (0..cols).map(|j| metric(i, j)).collect())
            .collect()
    }
}

/// Intersection area of two `(x1, y1, x2, y2)` boxes, never negative.
pub(crate) fn intersection_area(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    w * h
}

/// IoU of two boxes. `NaN` when both boxes have zero area.
pub(crate) fn box_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let inter = intersection_area(a, b);
    inter / (box_area(a) + box_area(b) - inter)
}

/// Calculate the intersection area of every pair of boxes.
///
/// # Example
///
/// ```
/// use bbx::{metrics, Boxes};
///
/// let a = Boxes::new(vec![[0.0, 0.0, 10.0, 10.0]]);
/// let b = Boxes::new(vec![[5.0, 5.0, 15.0, 15.0], [20.0, 20.0, 30.0, 30.0]]);
/// let inter = metrics::intersection(&a, &b);
/// assert_eq!(inter, vec![vec![25.0, 0.0]]);
/// ```
#[must_use]
pub fn intersection(a: &Boxes, b: &Boxes) -> Matrix {
    let (ca, cb) = (a.coords(), b.coords());
    pairwise(ca.len(), cb.len(), |i, j| intersection_area(&ca[i], &cb[j]))
}

/// Calculate the Intersection over Union (IoU) of every pair of boxes.
///
/// IoU is the intersection area divided by the union area. It lies in
/// `[0, 1]` for boxes with positive area. When both boxes of a pair have
/// zero area the union is zero and the value is `NaN`.
#[must_use]
pub fn iou(a: &Boxes, b: &Boxes) -> Matrix {
    let (ca, cb) = (a.coords(), b.coords());
    pairwise(ca.len(), cb.len(), |i, j| box_iou(&ca[i], &cb[j]))
}

/// Calculate the intersection over the area of the box from `a` (IOA).
///
/// Unlike IoU this is asymmetric: `ioa(a, b)[i][j] == 1` whenever box
/// `a[i]` lies entirely inside `b[j]`.
#[must_use]
pub fn ioa(a: &Boxes, b: &Boxes) -> Matrix {
    let (ca, cb) = (a.coords(), b.coords());
    let area_a = a.area();
    pairwise(ca.len(), cb.len(), |i, j| {
        intersection_area(&ca[i], &cb[j]) / area_a[i]
    })
}

/// For each box in `a`, whether its largest IOA against any `window` box
/// reaches `min_overlap`.
///
/// Boxes are never inside an empty window set. Zero-area boxes have an
/// undefined IOA and are reported as outside.
#[must_use]
pub fn boxes_in_window(a: &Boxes, window: &Boxes, min_overlap: f64) -> Vec<bool> {
    ioa(a, window)
        .into_iter()
        .map(|row| row.into_iter().fold(f64::NEG_INFINITY, f64::max) >= min_overlap)
        .collect()
}
