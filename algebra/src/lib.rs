// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![forbid(unsafe_code)] // pure value manipulation, no excuses
#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Range algebra over firewall reachability spaces.
//!
//! Reachability is modeled as set operations over multi-dimensional
//! spaces whose dimensions are IP ranges, port ranges and protocol
//! sets.  The building blocks, leaves first:
//!
//! - [`Range`]: a one-dimensional typed value set, either a half-open
//!   numeric interval or an unordered set of labels.
//! - [`Space`]: a Cartesian product of ranges, one per dimension.
//! - [`SpaceSet`]: a union of spaces with a canonical sorted form.
//!
//! All values are immutable; every operation produces a new value, so
//! everything here is trivially `Send` + `Sync`.

pub mod parse;
pub mod range;
pub mod set;
pub mod space;

pub use parse::{ip_range, port_range};
pub use range::{IncompatibleKinds, InvalidRange, NominalRange, NumericRange, Range, RangeKind};
pub use set::SpaceSet;
pub use space::Space;
