// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! One-dimensional typed ranges and their algebra.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::Display;

/// One past the highest valid port number.
pub const MAX_PORT_BOUND: u128 = 1 << 16;

/// Tag identifying the dimension a range belongs to.
///
/// Two ranges are compatible iff their kinds are equal; every
/// operation on a pair of ranges checks this first.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RangeKind {
    /// Integer-encoded IPv4/IPv6 addresses.
    Ip,
    /// Transport ports, `0..=65535`.
    Port,
    /// Protocol labels such as `TCP`, `UDP`, `ICMP`.
    Protocol,
}

impl RangeKind {
    /// True for kinds carried by a numeric interval.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, RangeKind::Ip | RangeKind::Port)
    }
}

impl Display for RangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeKind::Ip => write!(f, "ip"),
            RangeKind::Port => write!(f, "port"),
            RangeKind::Protocol => write!(f, "protocol"),
        }
    }
}

/// Error type for range constructors and the address/port parsers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRange {
    /// The interval start lies after its exclusive end.
    #[error("invalid range: start {start} is greater than end {end}")]
    StartAfterEnd { start: u128, end: u128 },
    /// A port bound exceeds the port domain.
    #[error("port bound {0} is out of range (max {MAX_PORT_BOUND})")]
    PortOutOfRange(u128),
    /// The exclusive end of the full IPv6 space does not fit 128 bits.
    #[error("address range too large for a 128-bit exclusive bound")]
    AddressOverflow,
    /// The address spec is neither a CIDR block nor a plain address.
    #[error("malformed address range: {0}")]
    MalformedAddress(String),
    /// The port spec is not of the form `P` or `P-Q` with valid ports.
    #[error("malformed port spec: {0}")]
    MalformedPortSpec(String),
    /// Numeric bounds were supplied for a nominal kind.
    #[error("range kind {0} is not numeric")]
    NotNumeric(RangeKind),
    /// Labels were supplied for a numeric kind.
    #[error("range kind {0} is not nominal")]
    NotNominal(RangeKind),
}

/// Error type for operations over incompatible operands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IncompatibleKinds {
    /// The two ranges belong to different dimensions.
    #[error("incompatible range kinds: {left} vs {right}")]
    Kind {
        /// Kind of the left operand.
        left: RangeKind,
        /// Kind of the right operand.
        right: RangeKind,
    },
    /// The two spaces have different schemas.
    #[error("incompatible space schemas: {left:?} vs {right:?}")]
    Schema {
        /// Schema of the left operand.
        left: Vec<RangeKind>,
        /// Schema of the right operand.
        right: Vec<RangeKind>,
    },
}

/// A half-open integer interval `[start, end)` tagged with its kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumericRange {
    kind: RangeKind,
    start: u128,
    end: u128,
}

impl NumericRange {
    /// Creates a numeric range after validating the kind domain.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRange::NotNumeric`] for nominal kinds,
    /// [`InvalidRange::StartAfterEnd`] for reversed bounds and
    /// [`InvalidRange::PortOutOfRange`] for port bounds past 65536.
    pub fn new(kind: RangeKind, start: u128, end_exclusive: u128) -> Result<Self, InvalidRange> {
        if !kind.is_numeric() {
            return Err(InvalidRange::NotNumeric(kind));
        }
        if start > end_exclusive {
            return Err(InvalidRange::StartAfterEnd {
                start,
                end: end_exclusive,
            });
        }
        if kind == RangeKind::Port && end_exclusive > MAX_PORT_BOUND {
            return Err(InvalidRange::PortOutOfRange(end_exclusive));
        }
        Ok(Self {
            kind,
            start,
            end: end_exclusive,
        })
    }

    /// Returns the kind tag.
    #[must_use]
    pub fn kind(&self) -> RangeKind {
        self.kind
    }

    /// Returns the inclusive start of the interval.
    #[must_use]
    pub fn start(&self) -> u128 {
        self.start
    }

    /// Returns the exclusive end of the interval.
    #[must_use]
    pub fn end(&self) -> u128 {
        self.end
    }

    /// A range is empty when it covers no value at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    // Bounds are clamped into [self.start, self.end] so flank
    // construction stays total even when the subtrahend swallows the
    // minuend.  Clamped-away flanks come out empty and are dropped by
    // the space layer.
    fn clamp(&self, value: u128) -> u128 {
        value.clamp(self.start, self.end)
    }
}

impl Display for NumericRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:[{}..{})", self.kind, self.start, self.end)
    }
}

/// An unordered set of discrete labels tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominalRange {
    kind: RangeKind,
    values: BTreeSet<String>,
}

impl NominalRange {
    /// Creates a nominal range after validating the kind.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRange::NotNominal`] for numeric kinds.
    pub fn new<I, S>(kind: RangeKind, values: I) -> Result<Self, InvalidRange>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if kind.is_numeric() {
            return Err(InvalidRange::NotNominal(kind));
        }
        Ok(Self {
            kind,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Returns the kind tag.
    #[must_use]
    pub fn kind(&self) -> RangeKind {
        self.kind
    }

    /// Returns the label set.
    #[must_use]
    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// A nominal range is empty when it holds no label.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Display for NominalRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.values.iter().map(String::as_str).collect();
        write!(f, "{}:{{{}}}", self.kind, labels.join(","))
    }
}

/// A one-dimensional typed value set.
///
/// Numeric variants represent half-open intervals; nominal variants
/// represent label sets.  All operations require the operands to be
/// compatible (same [`RangeKind`]) and fail with
/// [`IncompatibleKinds`] otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Range {
    /// Half-open integer interval.
    Numeric(NumericRange),
    /// Unordered label set.
    Nominal(NominalRange),
}

impl Range {
    /// Creates an IP range `[start, end_exclusive)`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRange::StartAfterEnd`] for reversed bounds.
    pub fn ip(start: u128, end_exclusive: u128) -> Result<Range, InvalidRange> {
        NumericRange::new(RangeKind::Ip, start, end_exclusive).map(Range::Numeric)
    }

    /// Creates a port range `[start, end_exclusive)`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRange::StartAfterEnd`] for reversed bounds and
    /// [`InvalidRange::PortOutOfRange`] for bounds past 65536.
    pub fn port(start: u32, end_exclusive: u32) -> Result<Range, InvalidRange> {
        NumericRange::new(
            RangeKind::Port,
            u128::from(start),
            u128::from(end_exclusive),
        )
        .map(Range::Numeric)
    }

    /// Creates the port range covering every port.
    #[must_use]
    pub fn full_port_range() -> Range {
        Range::Numeric(NumericRange {
            kind: RangeKind::Port,
            start: 0,
            end: MAX_PORT_BOUND,
        })
    }

    /// Creates a protocol range from an iterator of labels.
    ///
    /// Duplicate labels collapse; an empty iterator yields an empty
    /// range.
    pub fn protocols<I, S>(labels: I) -> Range
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Range::Nominal(NominalRange {
            kind: RangeKind::Protocol,
            values: labels.into_iter().map(Into::into).collect(),
        })
    }

    /// Returns the kind tag.
    #[must_use]
    pub fn kind(&self) -> RangeKind {
        match self {
            Range::Numeric(range) => range.kind,
            Range::Nominal(range) => range.kind,
        }
    }

    /// Returns the numeric payload, if this is a numeric range.
    #[must_use]
    pub fn as_numeric(&self) -> Option<&NumericRange> {
        match self {
            Range::Numeric(range) => Some(range),
            Range::Nominal(_) => None,
        }
    }

    /// Returns the nominal payload, if this is a nominal range.
    #[must_use]
    pub fn as_nominal(&self) -> Option<&NominalRange> {
        match self {
            Range::Numeric(_) => None,
            Range::Nominal(range) => Some(range),
        }
    }

    /// Two ranges are compatible iff their kinds are equal.
    #[must_use]
    pub fn compatible(&self, other: &Range) -> bool {
        self.kind() == other.kind()
    }

    fn ensure_compatible(&self, other: &Range) -> Result<(), IncompatibleKinds> {
        if self.compatible(other) {
            Ok(())
        } else {
            Err(IncompatibleKinds::Kind {
                left: self.kind(),
                right: other.kind(),
            })
        }
    }

    /// A range is empty when it covers no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Range::Numeric(range) => range.is_empty(),
            Range::Nominal(range) => range.is_empty(),
        }
    }

    /// Intersection of two compatible ranges.
    ///
    /// For numeric ranges `None` signals the absence of any overlap,
    /// which is distinct from `Some` of an empty range.  Nominal
    /// intersection always yields a set, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when the kinds differ.
    pub fn intersect(&self, other: &Range) -> Result<Option<Range>, IncompatibleKinds> {
        self.ensure_compatible(other)?;
        match (self, other) {
            (Range::Numeric(a), Range::Numeric(b)) => {
                if !a.overlaps(b) {
                    return Ok(None);
                }
                Ok(Some(Range::Numeric(NumericRange {
                    kind: a.kind,
                    start: a.start.max(b.start),
                    end: a.end.min(b.end),
                })))
            }
            (Range::Nominal(a), Range::Nominal(b)) => Ok(Some(Range::Nominal(NominalRange {
                kind: a.kind,
                values: a.values.intersection(&b.values).cloned().collect(),
            }))),
            _ => Err(IncompatibleKinds::Kind {
                left: self.kind(),
                right: other.kind(),
            }),
        }
    }

    /// Union of two compatible ranges.
    ///
    /// Numeric union is only defined when the intervals overlap;
    /// disjoint operands yield `None` since a single interval cannot
    /// represent the result (multi-region values live at the space-set
    /// layer).  Nominal union always yields the merged set.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when the kinds differ.
    pub fn union(&self, other: &Range) -> Result<Option<Range>, IncompatibleKinds> {
        self.ensure_compatible(other)?;
        match (self, other) {
            (Range::Numeric(a), Range::Numeric(b)) => {
                if !a.overlaps(b) {
                    return Ok(None);
                }
                Ok(Some(Range::Numeric(NumericRange {
                    kind: a.kind,
                    start: a.start.min(b.start),
                    end: a.end.max(b.end),
                })))
            }
            (Range::Nominal(a), Range::Nominal(b)) => Ok(Some(Range::Nominal(NominalRange {
                kind: a.kind,
                values: a.values.union(&b.values).cloned().collect(),
            }))),
            _ => Err(IncompatibleKinds::Kind {
                left: self.kind(),
                right: other.kind(),
            }),
        }
    }

    /// Containment test.
    ///
    /// For numeric ranges this is symmetric: it returns true when
    /// either operand contains the other.  Existing callers depend on
    /// that behavior, so it is kept; use [`Range::is_subset_of`] for
    /// the directional test.  Nominal containment is directional:
    /// true iff every label of `other` is in `self`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when the kinds differ.
    pub fn contains(&self, other: &Range) -> Result<bool, IncompatibleKinds> {
        self.ensure_compatible(other)?;
        match (self, other) {
            (Range::Numeric(a), Range::Numeric(b)) => Ok((a.start >= b.start
                && a.end <= b.end)
                || (b.start >= a.start && b.end <= a.end)),
            (Range::Nominal(a), Range::Nominal(b)) => Ok(b.values.is_subset(&a.values)),
            _ => Err(IncompatibleKinds::Kind {
                left: self.kind(),
                right: other.kind(),
            }),
        }
    }

    /// Strictly directional containment: true iff `self` is a subset
    /// of `other`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when the kinds differ.
    pub fn is_subset_of(&self, other: &Range) -> Result<bool, IncompatibleKinds> {
        self.ensure_compatible(other)?;
        match (self, other) {
            (Range::Numeric(a), Range::Numeric(b)) => {
                Ok(a.is_empty() || (a.start >= b.start && a.end <= b.end))
            }
            (Range::Nominal(a), Range::Nominal(b)) => Ok(a.values.is_subset(&b.values)),
            _ => Err(IncompatibleKinds::Kind {
                left: self.kind(),
                right: other.kind(),
            }),
        }
    }

    /// Difference `self \ other`.
    ///
    /// Without overlap, `self` comes back unchanged.  With overlap, a
    /// numeric difference yields the two flanks
    /// `[self.start, other.start)` and `[other.end, self.end)`, with
    /// bounds clamped into `self`; one or both flanks may be empty and
    /// are then dropped by the space layer.  Nominal difference is the
    /// label set difference.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleKinds`] when the kinds differ.
    pub fn difference(&self, other: &Range) -> Result<Vec<Range>, IncompatibleKinds> {
        self.ensure_compatible(other)?;
        match (self, other) {
            (Range::Numeric(a), Range::Numeric(b)) => {
                if !a.overlaps(b) {
                    return Ok(vec![self.clone()]);
                }
                let left = NumericRange {
                    kind: a.kind,
                    start: a.start,
                    end: a.clamp(b.start),
                };
                let right = NumericRange {
                    kind: a.kind,
                    start: a.clamp(b.end),
                    end: a.end,
                };
                Ok(vec![Range::Numeric(left), Range::Numeric(right)])
            }
            (Range::Nominal(a), Range::Nominal(b)) => Ok(vec![Range::Nominal(NominalRange {
                kind: a.kind,
                values: a.values.difference(&b.values).cloned().collect(),
            })]),
            _ => Err(IncompatibleKinds::Kind {
                left: self.kind(),
                right: other.kind(),
            }),
        }
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Range::Numeric(range) => write!(f, "{range}"),
            Range::Nominal(range) => write!(f, "{range}"),
        }
    }
}

// The total order canonicalizes space sets: numeric ranges compare by
// (start, end), nominal ranges by sorted-label lexicographic order
// with the shorter set first (the natural BTreeSet order).  Mixed
// kinds order by kind tag so the order stays total.
impl Ord for Range {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Range::Numeric(a), Range::Numeric(b)) => a
                .kind
                .cmp(&b.kind)
                .then_with(|| a.start.cmp(&b.start))
                .then_with(|| a.end.cmp(&b.end)),
            (Range::Nominal(a), Range::Nominal(b)) => {
                a.kind.cmp(&b.kind).then_with(|| a.values.cmp(&b.values))
            }
            (Range::Numeric(a), Range::Nominal(b)) => a.kind.cmp(&b.kind).then(Ordering::Less),
            (Range::Nominal(a), Range::Numeric(b)) => a.kind.cmp(&b.kind).then(Ordering::Greater),
        }
    }
}

impl PartialOrd for Range {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn port(start: u32, end: u32) -> Range {
        Range::port(start, end).unwrap()
    }

    fn protos<const N: usize>(labels: [&str; N]) -> Range {
        Range::protocols(labels)
    }

    // constructors

    #[test]
    fn test_port_range_rejects_reversed_bounds() {
        assert_eq!(
            Range::port(10, 5),
            Err(InvalidRange::StartAfterEnd { start: 10, end: 5 })
        );
    }

    #[test]
    fn test_port_range_rejects_out_of_domain_bound() {
        assert_eq!(
            Range::port(0, 65537),
            Err(InvalidRange::PortOutOfRange(65537))
        );
        assert!(Range::port(0, 65536).is_ok());
    }

    #[test]
    fn test_numeric_range_rejects_nominal_kind() {
        assert_eq!(
            NumericRange::new(RangeKind::Protocol, 0, 1),
            Err(InvalidRange::NotNumeric(RangeKind::Protocol))
        );
    }

    #[test]
    fn test_nominal_range_rejects_numeric_kind() {
        assert_eq!(
            NominalRange::new(RangeKind::Port, ["TCP"]).unwrap_err(),
            InvalidRange::NotNominal(RangeKind::Port)
        );
    }

    // intersect

    #[test]
    fn test_numeric_intersect_overlap() {
        let a = port(0, 100);
        let b = port(50, 200);
        assert_eq!(a.intersect(&b).unwrap(), Some(port(50, 100)));
    }

    #[test]
    fn test_numeric_intersect_is_commutative() {
        let a = port(0, 100);
        let b = port(50, 200);
        assert_eq!(a.intersect(&b).unwrap(), b.intersect(&a).unwrap());
    }

    #[test]
    fn test_numeric_intersect_adjacent_is_none() {
        // [0, 1) and [1, 2) share no point
        assert_eq!(port(0, 1).intersect(&port(1, 2)).unwrap(), None);
    }

    #[test]
    fn test_nominal_intersect() {
        let a = protos(["TCP", "UDP"]);
        let b = protos(["UDP", "ICMP"]);
        assert_eq!(a.intersect(&b).unwrap(), Some(protos(["UDP"])));
        assert_eq!(a.intersect(&b).unwrap(), b.intersect(&a).unwrap());
    }

    #[test]
    fn test_nominal_intersect_disjoint_is_empty_not_none() {
        let a = protos(["TCP"]);
        let b = protos(["UDP"]);
        let got = a.intersect(&b).unwrap().unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_intersect_incompatible_kinds() {
        let err = port(0, 1).intersect(&protos(["TCP"])).unwrap_err();
        assert_eq!(
            err,
            IncompatibleKinds::Kind {
                left: RangeKind::Port,
                right: RangeKind::Protocol
            }
        );
    }

    // union

    #[test]
    fn test_numeric_union_overlap_is_hull() {
        let a = port(0, 100);
        let b = port(50, 200);
        assert_eq!(a.union(&b).unwrap(), Some(port(0, 200)));
    }

    #[test]
    fn test_numeric_union_disjoint_is_none() {
        assert_eq!(port(0, 10).union(&port(20, 30)).unwrap(), None);
        // adjacency counts as disjoint too
        assert_eq!(port(0, 10).union(&port(10, 30)).unwrap(), None);
    }

    #[test]
    fn test_nominal_union() {
        let a = protos(["TCP"]);
        let b = protos(["UDP"]);
        assert_eq!(a.union(&b).unwrap(), Some(protos(["TCP", "UDP"])));
    }

    // contains / is_subset_of

    #[test]
    fn test_numeric_contains_is_symmetric() {
        let outer = port(0, 100);
        let inner = port(10, 20);
        assert!(outer.contains(&inner).unwrap());
        // the quirk existing callers depend on
        assert!(inner.contains(&outer).unwrap());
        assert!(!port(0, 10).contains(&port(5, 20)).unwrap());
    }

    #[test]
    fn test_numeric_is_subset_of_is_directional() {
        let outer = port(0, 100);
        let inner = port(10, 20);
        assert!(inner.is_subset_of(&outer).unwrap());
        assert!(!outer.is_subset_of(&inner).unwrap());
    }

    #[test]
    fn test_nominal_contains_is_directional() {
        let a = protos(["TCP", "UDP", "ICMP"]);
        let b = protos(["TCP", "UDP"]);
        assert!(a.contains(&b).unwrap());
        assert!(!b.contains(&a).unwrap());
        assert!(b.is_subset_of(&a).unwrap());
    }

    // difference

    #[test]
    fn test_numeric_difference_no_overlap_returns_self() {
        let a = port(0, 10);
        let b = port(20, 30);
        assert_eq!(a.difference(&b).unwrap(), vec![a.clone()]);
    }

    #[test]
    fn test_numeric_difference_middle_split() {
        let a = port(0, 100);
        let b = port(40, 60);
        assert_eq!(a.difference(&b).unwrap(), vec![port(0, 40), port(60, 100)]);
    }

    #[test]
    fn test_numeric_difference_right_overlap() {
        let a = port(0, 100);
        let b = port(60, 200);
        let pieces: Vec<Range> = a
            .difference(&b)
            .unwrap()
            .into_iter()
            .filter(|r| !r.is_empty())
            .collect();
        assert_eq!(pieces, vec![port(0, 60)]);
    }

    #[test]
    fn test_numeric_difference_left_overlap() {
        let a = port(50, 100);
        let b = port(0, 70);
        let pieces: Vec<Range> = a
            .difference(&b)
            .unwrap()
            .into_iter()
            .filter(|r| !r.is_empty())
            .collect();
        assert_eq!(pieces, vec![port(70, 100)]);
    }

    #[test]
    fn test_numeric_difference_with_self_is_all_empty() {
        let a = port(10, 20);
        assert!(a.difference(&a).unwrap().iter().all(Range::is_empty));
    }

    #[test]
    fn test_numeric_difference_swallowed_is_all_empty() {
        let a = port(40, 60);
        let b = port(0, 100);
        assert!(a.difference(&b).unwrap().iter().all(Range::is_empty));
    }

    #[test]
    fn test_nominal_difference() {
        let a = protos(["TCP", "UDP", "ICMP"]);
        let b = protos(["UDP"]);
        assert_eq!(a.difference(&b).unwrap(), vec![protos(["TCP", "ICMP"])]);
    }

    #[test]
    fn test_nominal_single_point_difference_empties_the_set() {
        let a = protos(["TCP"]);
        let b = protos(["TCP"]);
        let pieces = a.difference(&b).unwrap();
        assert_eq!(pieces.len(), 1);
        assert!(pieces[0].is_empty());
    }

    // ordering

    #[test]
    fn test_numeric_order_by_start_then_end() {
        assert!(port(0, 10) < port(1, 2));
        assert!(port(0, 10) < port(0, 20));
        assert_eq!(port(3, 4).cmp(&port(3, 4)), Ordering::Equal);
    }

    #[test]
    fn test_nominal_order_lexicographic_shorter_first() {
        assert!(protos(["ICMP"]) < protos(["TCP"]));
        assert!(protos(["TCP"]) < protos(["TCP", "UDP"]));
    }

    #[test]
    fn test_display() {
        assert_eq!(port(0, 65536).to_string(), "port:[0..65536)");
        assert_eq!(protos(["UDP", "TCP"]).to_string(), "protocol:{TCP,UDP}");
    }
}
