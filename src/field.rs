//! Per-box field storage.

use crate::error::{BbxError, Result};
use serde::{Deserialize, Serialize};

/// Numeric values attached to a box collection, one row per box.
///
/// All rows share the same width. Scalar fields (scores, labels, sizes)
/// have width 1; vector fields such as landmarks or embeddings are stored
/// row-major in a single buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldRepr", into = "FieldRepr")]
pub struct FieldArray {
    width: usize,
    data: Vec<f64>,
}

impl FieldArray {
    /// Create a scalar field with one value per box.
    pub fn scalars(values: impl Into<Vec<f64>>) -> Self {
        Self {
            width: 1,
            data: values.into(),
        }
    }

    /// Create a field from a row-major buffer where every row has `width` values.
    pub fn from_flat(width: usize, data: Vec<f64>) -> Result<Self> {
        if width == 0 {
            return Err(BbxError::ShapeMismatch(
                "Field rows must hold at least one value".to_string(),
            ));
        }
        if data.len() % width != 0 {
            return Err(BbxError::ShapeMismatch(format!(
                "Buffer of {} values cannot be split into rows of width {}",
                data.len(),
                width
            )));
        }
        Ok(Self { width, data })
    }

    /// Create a field from explicit rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.first().map_or(1, Vec::len);
        if let Some(bad) = rows.iter().find(|row| row.len() != width) {
            return Err(BbxError::ShapeMismatch(format!(
                "Expected rows of width {}, found a row of width {}",
                width,
                bad.len()
            )));
        }
        Self::from_flat(width, rows.concat())
    }

    /// Zero-length field with the given row width. A width of zero is treated as one.
    pub fn empty(width: usize) -> Self {
        Self {
            width: width.max(1),
            data: Vec::new(),
        }
    }

    /// Number of rows (boxes) in the field.
    pub fn len(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of values stored per box.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_scalar(&self) -> bool {
        self.width == 1
    }

    /// Values of row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn row(&self, index: usize) -> &[f64] {
        &self.data[index * self.width..(index + 1) * self.width]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.width)
    }

    /// Raw row-major buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// View a scalar field as one value per box.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the field stores more than one value per box.
    pub fn as_scalars(&self) -> Result<&[f64]> {
        if !self.is_scalar() {
            return Err(BbxError::ShapeMismatch(format!(
                "Expected a scalar field, got rows of width {}",
                self.width
            )));
        }
        Ok(&self.data)
    }

    /// Copy the given rows into a new field. Indices must already be in range.
    pub(crate) fn gather(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.width);
        for &index in indices {
            data.extend_from_slice(self.row(index));
        }
        Self {
            width: self.width,
            data,
        }
    }

    /// Stack fields in order. All non-empty parts must share one row width.
    ///
    /// Zero-length parts contribute no rows and do not constrain the width.
    pub(crate) fn concat(name: &str, parts: &[&FieldArray]) -> Result<Self> {
        let width = parts
            .iter()
            .find(|part| !part.is_empty())
            .or_else(|| parts.first())
            .map_or(1, |part| part.width);
        let mut data = Vec::with_capacity(parts.iter().map(|part| part.data.len()).sum());
        for part in parts.iter().filter(|part| !part.is_empty()) {
            if part.width != width {
                return Err(BbxError::ShapeMismatch(format!(
                    "Field '{}' has row width {} in one collection and {} in another",
                    name, width, part.width
                )));
            }
            data.extend_from_slice(&part.data);
        }
        Ok(Self { width, data })
    }
}

impl From<Vec<f64>> for FieldArray {
    fn from(values: Vec<f64>) -> Self {
        Self::scalars(values)
    }
}

impl From<&[f64]> for FieldArray {
    fn from(values: &[f64]) -> Self {
        Self::scalars(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for FieldArray {
    fn from(values: [f64; N]) -> Self {
        Self::scalars(values.to_vec())
    }
}

impl From<&FieldArray> for FieldArray {
    fn from(values: &FieldArray) -> Self {
        values.clone()
    }
}

#[derive(Serialize, Deserialize)]
struct FieldRepr {
    width: usize,
    data: Vec<f64>,
}

impl TryFrom<FieldRepr> for FieldArray {
    type Error = BbxError;

    fn try_from(repr: FieldRepr) -> Result<Self> {
        Self::from_flat(repr.width, repr.data)
    }
}

impl From<FieldArray> for FieldRepr {
    fn from(field: FieldArray) -> Self {
        Self {
            width: field.width,
            data: field.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_field() {
        let field = FieldArray::scalars(vec![0.1, 0.2, 0.3]);
        assert_eq!(field.len(), 3);
        assert!(field.is_scalar());
        assert_eq!(field.as_scalars().unwrap(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_vector_rows() {
        let field = FieldArray::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(field.len(), 3);
        assert_eq!(field.width(), 2);
        assert_eq!(field.row(1), &[3.0, 4.0]);
        assert!(field.as_scalars().is_err());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = FieldArray::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(BbxError::ShapeMismatch(_))));
    }

    #[test]
    fn test_flat_buffer_must_divide() {
        assert!(FieldArray::from_flat(3, vec![1.0; 7]).is_err());
        assert!(FieldArray::from_flat(0, vec![]).is_err());
        assert_eq!(FieldArray::from_flat(3, vec![1.0; 9]).unwrap().len(), 3);
    }

    #[test]
    fn test_gather_repeats_and_reorders() {
        let field = FieldArray::from_rows(&[vec![1.0, 1.5], vec![2.0, 2.5]]).unwrap();
        let picked = field.gather(&[1, 0, 1]);
        assert_eq!(picked.as_slice(), &[2.0, 2.5, 1.0, 1.5, 2.0, 2.5]);
    }

    #[test]
    fn test_concat_width_mismatch() {
        let a = FieldArray::scalars(vec![1.0]);
        let b = FieldArray::from_flat(2, vec![1.0, 2.0]).unwrap();
        assert!(FieldArray::concat("x", &[&a, &b]).is_err());
    }

    #[test]
    fn test_concat_skips_empty_parts_for_width() {
        let none = FieldArray::empty(1);
        let pairs = FieldArray::from_flat(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let merged = FieldArray::concat("kp", &[&none, &pairs, &none]).unwrap();
        assert_eq!(merged.width(), 2);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_deserialize_validates() {
        let bad = r#"{"width": 2, "data": [1.0, 2.0, 3.0]}"#;
        assert!(serde_json::from_str::<FieldArray>(bad).is_err());
        let good = r#"{"width": 1, "data": [1.0, 2.0, 3.0]}"#;
        let field: FieldArray = serde_json::from_str(good).unwrap();
        assert_eq!(field.len(), 3);
    }
}
