//! The box collection: coordinates plus named per-box fields.

use crate::error::{BbxError, Result};
use crate::field::FieldArray;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A collection of axis-aligned boxes in `(x1, y1, x2, y2)` format.
///
/// Coordinates are normalized on construction so that `x1 <= x2` and
/// `y1 <= y2` whatever pair of opposite corners was supplied. Each named
/// field holds exactly one row per box. Slicing, concatenation and every
/// transform copy their data into a new collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoxesRepr", into = "BoxesRepr")]
pub struct Boxes {
    coords: Vec<[f64; 4]>,
    fields: BTreeMap<String, FieldArray>,
}

fn normalize([a, b, c, d]: [f64; 4]) -> [f64; 4] {
    [a.min(c), b.min(d), a.max(c), b.max(d)]
}

impl Boxes {
    /// Create a collection from corner coordinates, without fields.
    ///
    /// # Example
    ///
    /// ```
    /// use bbx::Boxes;
    ///
    /// let boxes = Boxes::new(vec![[10.0, 10.0, 0.0, 0.0]]);
    /// assert_eq!(boxes.coords()[0], [0.0, 0.0, 10.0, 10.0]);
    /// ```
    pub fn new(coords: Vec<[f64; 4]>) -> Self {
        Self {
            coords: coords.into_iter().map(normalize).collect(),
            fields: BTreeMap::new(),
        }
    }

    /// Create a collection from rows of arbitrary length.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if any row does not hold exactly 4 values.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let coords = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                <[f64; 4]>::try_from(row.as_slice()).map_err(|_| {
                    BbxError::ShapeMismatch(format!(
                        "Expected 4 coordinates in row {}, got {}",
                        i,
                        row.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(coords))
    }

    /// Create a collection from a flat N×4 buffer.
    pub fn from_flat(data: &[f64]) -> Result<Self> {
        if data.len() % 4 != 0 {
            return Err(BbxError::ShapeMismatch(format!(
                "Expected a multiple of 4 coordinates, got {}",
                data.len()
            )));
        }
        Ok(Self::new(
            data.chunks_exact(4)
                .map(|c| [c[0], c[1], c[2], c[3]])
                .collect(),
        ))
    }

    /// Create one box per point set, each the tightest box around its points.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if any point set is empty.
    pub fn from_points<P: AsRef<[[f64; 2]]>>(sets: &[P]) -> Result<Self> {
        let coords = sets
            .iter()
            .enumerate()
            .map(|(i, set)| {
                let points = set.as_ref();
                if points.is_empty() {
                    return Err(BbxError::ShapeMismatch(format!("Point set {} is empty", i)));
                }
                Ok(points.iter().fold(
                    [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY],
                    |[x1, y1, x2, y2], &[x, y]| [x1.min(x), y1.min(y), x2.max(x), y2.max(y)],
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(coords))
    }

    /// Create a collection from `(x, y, width, height)` rows.
    pub fn from_xywh(rows: &[[f64; 4]]) -> Self {
        Self::new(
            rows.iter()
                .map(|&[x, y, w, h]| [x, y, x + w, y + h])
                .collect(),
        )
    }

    /// Coordinates as `(x, y, width, height)` rows.
    #[must_use]
    pub fn to_xywh(&self) -> Vec<[f64; 4]> {
        self.coords
            .iter()
            .map(|&[x1, y1, x2, y2]| [x1, y1, x2 - x1, y2 - y1])
            .collect()
    }

    /// Builder form of [`Boxes::set_field`] that overwrites existing fields.
    pub fn with_field(mut self, name: impl Into<String>, values: impl Into<FieldArray>) -> Result<Self> {
        self.set_field(name, values, true)?;
        Ok(self)
    }

    /// Parse a collection from JSON. Coordinates are normalized and field
    /// lengths are checked exactly as for the in-memory constructors.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON, the inverse of [`Boxes::from_json`].
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Normalized `(x1, y1, x2, y2)` coordinates.
    pub fn coords(&self) -> &[[f64; 4]] {
        &self.coords
    }

    /// `(x1, y1)` of every box.
    #[must_use]
    pub fn top_left(&self) -> Vec<[f64; 2]> {
        self.coords.iter().map(|c| [c[0], c[1]]).collect()
    }

    /// `(x2, y2)` of every box.
    #[must_use]
    pub fn bottom_right(&self) -> Vec<[f64; 2]> {
        self.coords.iter().map(|c| [c[2], c[3]]).collect()
    }

    /// Corners of every box in top-left, top-right, bottom-right, bottom-left order.
    pub fn corners(&self) -> Vec<[[f64; 2]; 4]> {
        self.coords
            .iter()
            .map(|&[x1, y1, x2, y2]| [[x1, y1], [x2, y1], [x2, y2], [x1, y2]])
            .collect()
    }

    /// Midpoint of every box.
    #[must_use]
    pub fn center(&self) -> Vec<[f64; 2]> {
        self.coords
            .iter()
            .map(|&[x1, y1, x2, y2]| [(x1 + x2) / 2.0, (y1 + y2) / 2.0])
            .collect()
    }

    /// `x2 - x1` of every box.
    #[must_use]
    pub fn width(&self) -> Vec<f64> {
        self.coords.iter().map(|c| c[2] - c[0]).collect()
    }

    /// `y2 - y1` of every box.
    #[must_use]
    pub fn height(&self) -> Vec<f64> {
        self.coords.iter().map(|c| c[3] - c[1]).collect()
    }

    #[must_use]
    pub fn area(&self) -> Vec<f64> {
        self.coords.iter().map(box_area).collect()
    }

    /// Width over height. Boxes with zero height give `inf` (or `NaN` when
    /// the width is zero as well).
    pub fn aspect_ratio(&self) -> Vec<f64> {
        self.coords
            .iter()
            .map(|c| (c[2] - c[0]) / (c[3] - c[1]))
            .collect()
    }

    /// Single box at `index` as a new one-element collection.
    pub fn get(&self, index: usize) -> Result<Boxes> {
        self.select(&[index])
    }

    /// New collection holding the boxes at `indices`, in that order.
    ///
    /// Indices may repeat. All fields are sliced the same way.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if any index is `>= self.len()`.
    pub fn select(&self, indices: &[usize]) -> Result<Boxes> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(BbxError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(self.gather(indices))
    }

    /// New collection with the boxes whose mask entry is `true`.
    pub fn filter(&self, mask: &[bool]) -> Result<Boxes> {
        if mask.len() != self.len() {
            return Err(BbxError::ShapeMismatch(format!(
                "Mask has {} entries for {} boxes",
                mask.len(),
                self.len()
            )));
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        Ok(self.gather(&indices))
    }

    pub(crate) fn gather(&self, indices: &[usize]) -> Boxes {
        Boxes {
            coords: indices.iter().map(|&i| self.coords[i]).collect(),
            fields: self
                .fields
                .iter()
                .map(|(name, field)| (name.clone(), field.gather(indices)))
                .collect(),
        }
    }

    /// Same fields, new coordinates. Used by the box transforms.
    pub(crate) fn with_coords(&self, coords: Vec<[f64; 4]>) -> Boxes {
        debug_assert_eq!(coords.len(), self.len());
        Boxes {
            coords: coords.into_iter().map(normalize).collect(),
            fields: self.fields.clone(),
        }
    }

    /// Sorted by a scalar field. The sort is stable, so boxes with equal
    /// values keep their relative order.
    pub fn sort_by_field(&self, field: &str, descending: bool) -> Result<Boxes> {
        let values = self.scalar_field(field)?;
        let mut order: Vec<usize> = (0..self.len()).collect();
        if descending {
            order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
        } else {
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        }
        Ok(self.gather(&order))
    }

    /// Set or replace a field.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the field does not have one row per box,
    /// and `DuplicateField` if the name exists and `overwrite` is false.
    pub fn set_field(
        &mut self,
        name: impl Into<String>,
        values: impl Into<FieldArray>,
        overwrite: bool,
    ) -> Result<()> {
        let name = name.into();
        let values = values.into();
        self.check_field(&name, &values, overwrite)?;
        self.fields.insert(name, values);
        Ok(())
    }

    /// Set several fields at once. Nothing is stored unless every field is valid.
    pub fn set_fields<I, S, V>(&mut self, fields: I, overwrite: bool) -> Result<()>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<FieldArray>,
    {
        let fields: Vec<(String, FieldArray)> = fields
            .into_iter()
            .map(|(name, values)| (name.into(), values.into()))
            .collect();
        let mut seen = BTreeSet::new();
        for (name, values) in &fields {
            self.check_field(name, values, overwrite)?;
            if !overwrite && !seen.insert(name.as_str()) {
                return Err(BbxError::DuplicateField(name.clone()));
            }
        }
        self.fields.extend(fields);
        Ok(())
    }

    fn check_field(&self, name: &str, values: &FieldArray, overwrite: bool) -> Result<()> {
        if values.len() != self.len() {
            return Err(BbxError::ShapeMismatch(format!(
                "Field '{}' has {} rows, expected {}",
                name,
                values.len(),
                self.len()
            )));
        }
        if !overwrite && self.fields.contains_key(name) {
            return Err(BbxError::DuplicateField(name.to_string()));
        }
        Ok(())
    }

    /// Field stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if no such field exists.
    pub fn get_field(&self, name: &str) -> Result<&FieldArray> {
        self.fields
            .get(name)
            .ok_or_else(|| BbxError::MissingField(name.to_string()))
    }

    /// Values of a scalar field, one per box.
    pub fn scalar_field(&self, name: &str) -> Result<&[f64]> {
        self.get_field(name)?.as_scalars().map_err(|_| {
            BbxError::ShapeMismatch(format!("Field '{}' is not a scalar field", name))
        })
    }

    /// Take a field out of the collection.
    pub fn remove_field(&mut self, name: &str) -> Result<FieldArray> {
        self.fields
            .remove(name)
            .ok_or_else(|| BbxError::MissingField(name.to_string()))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in sorted order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Iterate over `(name, values)` pairs in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldArray)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }
}

pub(crate) fn box_area(c: &[f64; 4]) -> f64 {
    (c[2] - c[0]) * (c[3] - c[1])
}

/// Empty collection carrying the given scalar fields.
pub fn empty<S: AsRef<str>>(field_names: &[S]) -> Boxes {
    Boxes {
        coords: Vec::new(),
        fields: field_names
            .iter()
            .map(|name| (name.as_ref().to_string(), FieldArray::empty(1)))
            .collect(),
    }
}

/// Empty collection with the same fields (and field widths) as `other`.
pub fn empty_like(other: &Boxes) -> Boxes {
    Boxes {
        coords: Vec::new(),
        fields: other
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), FieldArray::empty(field.width())))
            .collect(),
    }
}

/// Stack collections in order, keeping only the fields present in all of them.
///
/// Concatenating `a.select(0..k)` with `a.select(k..n)` reproduces `a`.
/// Concatenating nothing gives an empty collection without fields.
pub fn concatenate(collections: &[Boxes]) -> Result<Boxes> {
    let mut common: BTreeSet<&str> = match collections.first() {
        Some(first) => first.fields.keys().map(String::as_str).collect(),
        None => BTreeSet::new(),
    };
    for boxes in collections.iter().skip(1) {
        common.retain(|name| boxes.has_field(name));
    }
    let dropped = collections
        .iter()
        .flat_map(|boxes| boxes.fields.keys())
        .filter(|name| !common.contains(name.as_str()))
        .count();
    if dropped > 0 {
        debug!(dropped, kept = common.len(), "concatenate dropped fields not shared by all inputs");
    }
    let names: Vec<&str> = common.into_iter().collect();
    concatenate_fields(collections, &names)
}

/// Stack collections in order, carrying exactly the requested fields.
///
/// # Errors
///
/// Returns `MissingField` if a requested field is absent from some input and
/// `ShapeMismatch` if a field's row width differs between inputs.
pub fn concatenate_fields<S: AsRef<str>>(collections: &[Boxes], fields: &[S]) -> Result<Boxes> {
    let coords: Vec<[f64; 4]> = collections
        .iter()
        .flat_map(|boxes| boxes.coords.iter().copied())
        .collect();

    let mut merged = BTreeMap::new();
    for name in fields {
        let name = name.as_ref();
        let parts = collections
            .iter()
            .map(|boxes| boxes.get_field(name))
            .collect::<Result<Vec<_>>>()?;
        merged.insert(name.to_string(), FieldArray::concat(name, &parts)?);
    }

    Ok(Boxes {
        coords,
        fields: merged,
    })
}

#[derive(Serialize, Deserialize)]
struct BoxesRepr {
    coords: Vec<[f64; 4]>,
    #[serde(default)]
    fields: BTreeMap<String, FieldArray>,
}

impl TryFrom<BoxesRepr> for Boxes {
    type Error = BbxError;

    fn try_from(repr: BoxesRepr) -> Result<Self> {
        let mut boxes = Boxes::new(repr.coords);
        boxes.set_fields(repr.fields, true)?;
        Ok(boxes)
    }
}

impl From<Boxes> for BoxesRepr {
    fn from(boxes: Boxes) -> Self {
        Self {
            coords: boxes.coords,
            fields: boxes.fields,
        }
    }
}
