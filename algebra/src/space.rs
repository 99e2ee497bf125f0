// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Multi-dimensional spaces: Cartesian products of ranges.

use crate::range::{IncompatibleKinds, Range, RangeKind};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::trace;

/// A Cartesian product of ranges, one per dimension.
///
/// The schema of a space is the ordered list of its dimension kinds;
/// two spaces are compatible iff their schemas match.  Spaces are
/// immutable values: all operations produce new spaces.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Space {
    ranges: Vec<Range>,
}

impl Space {
    /// Creates a space from its dimension ranges, in schema order.
    pub fn new(ranges: impl IntoIterator<Item = Range>) -> Space {
        Space {
            ranges: ranges.into_iter().collect(),
        }
    }

    /// Returns the dimension ranges in schema order.
    #[must_use]
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Returns the schema: the ordered list of dimension kinds.
    #[must_use]
    pub fn schema(&self) -> Vec<RangeKind> {
        self.ranges.iter().map(Range::kind).collect()
    }

    /// Two spaces are compatible iff their schemas match pairwise.
    #[must_use]
    pub fn compatible(&self, other: &Space) -> bool {
        self.ranges.len() == other.ranges.len()
            && self
                .ranges
                .iter()
                .zip(&other.ranges)
                .all(|(a, b)| a.compatible(b))
    }

    fn ensure_compatible(&self, other: &Space) -> Result<(), IncompatibleKinds> {
        if self.compatible(other) {
            Ok(())
        } else {
            Err(IncompatibleKinds::Schema {
                left: self.schema(),
                right: other.schema(),
            })
        }
    }

    /// A space is empty as soon as any of its dimensions is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.iter().any(Range::is_empty)
    }

    /// Overlap test: false as soon as any dimension has no overlap.
    ///
    /// A dimension has no overlap when the range intersection is
    /// either absent (disjoint intervals) or empty (no shared label).
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when the schemas differ.
    pub fn intersects(&self, other: &Space) -> Result<bool, IncompatibleKinds> {
        self.ensure_compatible(other)?;
        for (dim_self, dim_other) in self.ranges.iter().zip(&other.ranges) {
            match dim_self.intersect(dim_other)? {
                None => return Ok(false),
                Some(shared) if shared.is_empty() => return Ok(false),
                Some(_) => {}
            }
        }
        Ok(true)
    }

    /// Constructive intersection: the dimension-wise intersection of
    /// the two spaces, or `None` when they do not overlap.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when the schemas differ.
    pub fn intersection(&self, other: &Space) -> Result<Option<Space>, IncompatibleKinds> {
        self.ensure_compatible(other)?;
        let mut ranges = Vec::with_capacity(self.ranges.len());
        for (dim_self, dim_other) in self.ranges.iter().zip(&other.ranges) {
            match dim_self.intersect(dim_other)? {
                None => return Ok(None),
                Some(shared) if shared.is_empty() => return Ok(None),
                Some(shared) => ranges.push(shared),
            }
        }
        Ok(Some(Space { ranges }))
    }

    /// Difference `self \ other`, decomposed into axis-aligned slabs.
    ///
    /// Without overlap the result is `self` alone.  Otherwise, for
    /// each dimension, every non-empty sub-range of the per-dimension
    /// difference produces a new space equal to `self` with that
    /// dimension replaced and all other dimensions unchanged.  The
    /// slabs cover `self \ other` but may overlap across dimensions;
    /// the space-set layer tolerates that.  Use
    /// [`Space::difference_disjoint`] for a pairwise-disjoint cover.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when the schemas differ.
    pub fn difference(&self, other: &Space) -> Result<Vec<Space>, IncompatibleKinds> {
        if !self.intersects(other)? {
            return Ok(vec![self.clone()]);
        }
        let mut spaces = Vec::new();
        for (index, (dim_self, dim_other)) in self.ranges.iter().zip(&other.ranges).enumerate() {
            for piece in dim_self.difference(dim_other)? {
                if piece.is_empty() {
                    continue;
                }
                let mut ranges = self.ranges.clone();
                ranges[index] = piece;
                spaces.push(Space { ranges });
            }
        }
        trace!(slabs = spaces.len(), "space difference decomposed");
        Ok(spaces)
    }

    /// Difference `self \ other` as pairwise-disjoint orthogonal
    /// slabs.
    ///
    /// The classical hyper-rectangle subtraction: dimensions are
    /// peeled one at a time, and every dimension already peeled is
    /// clamped to the overlap region in the slabs produced later.
    /// Yields at most `2 * n` spaces in `n` dimensions and supports
    /// cardinality reasoning downstream.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when the schemas differ.
    pub fn difference_disjoint(&self, other: &Space) -> Result<Vec<Space>, IncompatibleKinds> {
        if !self.intersects(other)? {
            return Ok(vec![self.clone()]);
        }
        let mut spaces = Vec::new();
        let mut current = self.ranges.clone();
        for (index, dim_other) in other.ranges.iter().enumerate() {
            let dim_self = current[index].clone();
            for piece in dim_self.difference(dim_other)? {
                if piece.is_empty() {
                    continue;
                }
                let mut ranges = current.clone();
                ranges[index] = piece;
                spaces.push(Space { ranges });
            }
            match dim_self.intersect(dim_other)? {
                Some(shared) if !shared.is_empty() => current[index] = shared,
                // cannot happen past the intersects() gate
                _ => return Ok(spaces),
            }
        }
        Ok(spaces)
    }
}

impl Display for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims: Vec<String> = self.ranges.iter().map(ToString::to_string).collect();
        write!(f, "({})", dims.join(";"))
    }
}

impl<const N: usize> From<[Range; N]> for Space {
    fn from(ranges: [Range; N]) -> Self {
        Space::new(ranges)
    }
}
