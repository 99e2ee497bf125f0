// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Unions of spaces with a canonical sorted form.

use crate::range::IncompatibleKinds;
use crate::space::Space;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// An ordered collection of spaces representing their union.
///
/// Construction sorts the members by the total order induced by the
/// per-dimension range order; that sorted sequence is the canonical
/// form, so two space sets built from the same members in any order
/// compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSet {
    spaces: Vec<Space>,
}

impl SpaceSet {
    /// Creates a space set, sorting the members into canonical order.
    pub fn new(spaces: impl IntoIterator<Item = Space>) -> SpaceSet {
        let mut spaces: Vec<Space> = spaces.into_iter().collect();
        spaces.sort();
        SpaceSet { spaces }
    }

    /// Returns the members in canonical order.
    #[must_use]
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    /// A space set is empty iff it has no members or every member is
    /// empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spaces.iter().all(Space::is_empty)
    }

    /// Difference against a single space, member-wise.
    ///
    /// Applies [`Space::difference`] to every member, flattens the
    /// resulting slabs and drops the empty ones.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when any member's schema differs
    /// from `other`'s.
    pub fn difference(&self, other: &Space) -> Result<SpaceSet, IncompatibleKinds> {
        let mut survivors = Vec::new();
        for space in &self.spaces {
            survivors.extend(
                space
                    .difference(other)?
                    .into_iter()
                    .filter(|s| !s.is_empty()),
            );
        }
        Ok(SpaceSet::new(survivors))
    }

    /// Like [`SpaceSet::difference`] but with the pairwise-disjoint
    /// decomposition of [`Space::difference_disjoint`].
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when any member's schema differs
    /// from `other`'s.
    pub fn difference_disjoint(&self, other: &Space) -> Result<SpaceSet, IncompatibleKinds> {
        let mut survivors = Vec::new();
        for space in &self.spaces {
            survivors.extend(
                space
                    .difference_disjoint(other)?
                    .into_iter()
                    .filter(|s| !s.is_empty()),
            );
        }
        Ok(SpaceSet::new(survivors))
    }

    /// Cheap membership probe: true iff any member intersects `other`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when any member's schema differs
    /// from `other`'s.
    pub fn intersects(&self, other: &Space) -> Result<bool, IncompatibleKinds> {
        for space in &self.spaces {
            if space.intersects(other)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Display for SpaceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members: Vec<String> = self.spaces.iter().map(ToString::to_string).collect();
        write!(f, "{}", members.join("\n"))
    }
}

impl FromIterator<Space> for SpaceSet {
    fn from_iter<T: IntoIterator<Item = Space>>(iter: T) -> Self {
        SpaceSet::new(iter)
    }
}

impl<const N: usize> From<[Space; N]> for SpaceSet {
    fn from(spaces: [Space; N]) -> Self {
        SpaceSet::new(spaces)
    }
}
