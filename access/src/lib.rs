// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Streaming access-domain queries over firewall rule models.
//!
//! The [`Firewaller`] answers "what can reach this address" (ingress)
//! and "what can this address reach" (egress) by turning the rules a
//! [`model::ModelManager`] yields into streams of [`EndpointDomain`]
//! records.  The [`reachability`] helpers expose the underlying space
//! algebra flow: subtract rule spaces from an initial reachable space
//! and probe the residual.

use algebra::{IncompatibleKinds, InvalidRange};
use model::ModelError;

pub mod domain;
pub mod firewaller;
pub mod reachability;
pub mod retry;

pub use domain::{EndpointDomain, IpRangeRecord, PortRangeRecord};
pub use firewaller::{DomainStream, Firewaller};
pub use reachability::{residual, rule_spaces};
pub use retry::Backoff;

/// Errors surfaced by access-domain queries.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Propagated model manager failure.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// A transient failure survived every retry attempt.
    #[error("retries exhausted after {attempts} attempts: {reason}")]
    RetriesExhausted {
        /// Attempts made before giving up.
        attempts: u32,
        /// Reason reported by the last failure.
        reason: String,
    },
    /// The model yielded a rule whose network or port spec does not
    /// parse.
    #[error("malformed rule from model: {0}")]
    InvalidRule(#[from] InvalidRange),
    /// A space operation was fed incompatible operands.
    #[error(transparent)]
    Algebra(#[from] IncompatibleKinds),
}
