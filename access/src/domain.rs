// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Endpoint domain records and their production from rule tuples.

use crate::AccessError;
use algebra::{InvalidRange, ip_range, port_range};
use model::{Direction, FirewallRule};
use std::fmt::Display;

/// An address block carried both as its original CIDR text and as
/// integer bounds, so consumers can pick either representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRangeRecord {
    /// The CIDR text the rule carried.
    pub cidr: String,
    /// First address of the block.
    pub start: u128,
    /// One past the last address of the block.
    pub end_exclusive: u128,
}

impl IpRangeRecord {
    /// Parses a CIDR spec into a record keeping the original text.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRange`] when the spec does not parse.
    pub fn from_spec(spec: &str) -> Result<IpRangeRecord, InvalidRange> {
        let range = ip_range(spec)?;
        let numeric = range.as_numeric().unwrap_or_else(|| unreachable!());
        Ok(IpRangeRecord {
            cidr: spec.to_string(),
            start: numeric.start(),
            end_exclusive: numeric.end(),
        })
    }
}

/// A port interval in half-open form.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PortRangeRecord {
    /// First port of the interval.
    pub start: u32,
    /// One past the last port of the interval.
    pub end_exclusive: u32,
}

impl PortRangeRecord {
    /// Parses a `P` or `P-Q` port spec into a record.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRange`] when the spec does not parse.
    pub fn from_spec(spec: &str) -> Result<PortRangeRecord, InvalidRange> {
        let range = port_range(spec)?;
        let numeric = range.as_numeric().unwrap_or_else(|| unreachable!());
        Ok(PortRangeRecord {
            start: u32::try_from(numeric.start()).unwrap_or_else(|_| unreachable!()),
            end_exclusive: u32::try_from(numeric.end()).unwrap_or_else(|_| unreachable!()),
        })
    }
}

/// The unit of output of the access API: a reachable
/// `(address-range, port-range?, protocols)` tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDomain {
    /// The admitted address block.
    pub ip: IpRangeRecord,
    /// The admitted ports; absent when the rule admits all ports.
    pub ports: Option<PortRangeRecord>,
    /// The admitted protocol labels.
    pub protocols: Vec<String>,
}

impl Display for EndpointDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.ports {
            Some(ports) => write!(
                f,
                "{} ports [{}..{}) {}",
                self.ip.cidr,
                ports.start,
                ports.end_exclusive,
                self.protocols.join(",")
            ),
            None => write!(f, "{} {}", self.ip.cidr, self.protocols.join(",")),
        }
    }
}

/// Expands one rule tuple into its endpoint domains.
///
/// Ingress rules without port specs admit every port and yield a
/// single protocol-only record.  Egress rules are expected to carry
/// port specs; one without any yields nothing at all.  That asymmetry
/// is long-standing observable behavior and is kept as is.
///
/// # Errors
///
/// Returns [`AccessError::InvalidRule`] when the rule's network or a
/// port spec does not parse.
pub fn domains_for_rule(
    rule: &FirewallRule,
    direction: Direction,
) -> Result<Vec<EndpointDomain>, AccessError> {
    let ip = IpRangeRecord::from_spec(&rule.network)?;
    if rule.port_specs.is_empty() {
        return Ok(match direction {
            Direction::Ingress => vec![EndpointDomain {
                ip,
                ports: None,
                protocols: vec![rule.protocol.clone()],
            }],
            Direction::Egress => Vec::new(),
        });
    }
    rule.port_specs
        .iter()
        .map(|spec| {
            Ok(EndpointDomain {
                ip: ip.clone(),
                ports: Some(PortRangeRecord::from_spec(spec)?),
                protocols: vec![rule.protocol.clone()],
            })
        })
        .collect()
}
