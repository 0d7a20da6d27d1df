//! Intersection of two axis-aligned rectangles placed at an integer offset.
//!
//! Kernel placement and rebin truncation both reduce to the same question:
//! given a `source` grid whose pixel (0, 0) lands on `target` pixel
//! `(row_offset, col_offset)`, which sub-ranges of each grid coincide?

use std::ops::Range;

use crate::shape::GridShape;

/// Matching index ranges along one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Indices into the target axis
    pub target: Range<usize>,
    /// Indices into the source axis
    pub source: Range<usize>,
}

impl Span {
    /// Overlap of a source axis of length `source_len` starting at `offset`
    /// on a target axis of length `target_len`.
    ///
    /// Returns `None` when the ranges do not intersect, or when the two
    /// computed extents disagree.
    pub fn along_axis(offset: isize, source_len: usize, target_len: usize) -> Option<Self> {
        let n = target_len as isize;
        let k = source_len as isize;

        let min_t = offset.max(0);
        let max_t = offset.saturating_add(k).min(n);
        let min_s = offset.saturating_neg().max(0);
        let max_s = k.min(n.saturating_sub(offset));

        if min_t >= max_t || min_s >= max_s || max_t - min_t != max_s - min_s {
            return None;
        }

        Some(Self {
            target: min_t as usize..max_t as usize,
            source: min_s as usize..max_s as usize,
        })
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Matching rectangles in target and source grids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub rows: Span,
    pub cols: Span,
}

impl Overlap {
    /// Intersect `source` placed with its origin at `(row_offset, col_offset)`
    /// inside `target`.
    pub fn between(
        target: GridShape,
        source: GridShape,
        row_offset: isize,
        col_offset: isize,
    ) -> Option<Self> {
        let rows = Span::along_axis(row_offset, source.rows, target.rows)?;
        let cols = Span::along_axis(col_offset, source.cols, target.cols)?;
        Some(Self { rows, cols })
    }

    /// Intersect a `source` centered on target pixel `(center_row, center_col)`.
    ///
    /// For odd source dimensions this is the footprint of a kernel whose
    /// middle pixel lands on the given target pixel.
    pub fn centered(
        target: GridShape,
        source: GridShape,
        center_row: isize,
        center_col: isize,
    ) -> Option<Self> {
        let row_radius = (source.rows.saturating_sub(1) / 2) as isize;
        let col_radius = (source.cols.saturating_sub(1) / 2) as isize;
        Self::between(
            target,
            source,
            center_row.saturating_sub(row_radius),
            center_col.saturating_sub(col_radius),
        )
    }

    /// Shape of the shared region
    pub fn shape(&self) -> GridShape {
        GridShape::new(self.rows.len(), self.cols.len())
    }
}
