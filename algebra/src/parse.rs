// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Textual address and port-spec parsers feeding the algebra.

use crate::range::{InvalidRange, Range};
use ipnet::IpNet;
use std::net::IpAddr;

/// Integer encoding of an address: IPv4 maps into the low 32 bits.
#[must_use]
pub fn addr_to_u128(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}

/// Parses a CIDR block (IPv4 or IPv6) or a plain address into an IP
/// range `[network, broadcast + 1)`.
///
/// A plain address is treated as a host block (`/32` or `/128`).
/// Host bits below the prefix are masked off.
///
/// # Errors
///
/// Returns [`InvalidRange::MalformedAddress`] for text that is neither
/// a CIDR block nor an address, and [`InvalidRange::AddressOverflow`]
/// for `::/0`, whose exclusive end does not fit 128 bits.
pub fn ip_range(spec: &str) -> Result<Range, InvalidRange> {
    let network = match spec.parse::<IpNet>() {
        Ok(network) => network,
        Err(_) => {
            let addr = spec
                .parse::<IpAddr>()
                .map_err(|_| InvalidRange::MalformedAddress(spec.to_string()))?;
            IpNet::from(addr)
        }
    };
    let start = addr_to_u128(network.network());
    let end = addr_to_u128(network.broadcast())
        .checked_add(1)
        .ok_or(InvalidRange::AddressOverflow)?;
    Range::ip(start, end)
}

/// Parses a port spec into a port range.
///
/// `"P"` yields `[P, P + 1)` and `"P-Q"` yields `[P, Q + 1)`, with
/// `0 <= P <= Q <= 65535`.  Whitespace is not tolerated.
///
/// # Errors
///
/// Returns [`InvalidRange::MalformedPortSpec`] for anything that does
/// not parse as one or two ports, and
/// [`InvalidRange::StartAfterEnd`] for a reversed pair.
pub fn port_range(spec: &str) -> Result<Range, InvalidRange> {
    let ports = spec
        .split('-')
        .map(str::parse::<u16>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| InvalidRange::MalformedPortSpec(spec.to_string()))?;
    let (start, last) = match ports.as_slice() {
        [port] => (*port, *port),
        [start, last] => (*start, *last),
        _ => return Err(InvalidRange::MalformedPortSpec(spec.to_string())),
    };
    if start > last {
        return Err(InvalidRange::StartAfterEnd {
            start: u128::from(start),
            end: u128::from(last),
        });
    }
    Range::port(u32::from(start), u32::from(last) + 1)
}
