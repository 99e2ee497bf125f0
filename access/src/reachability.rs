// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Residual reachable-space computation over rule sets.

use crate::AccessError;
use algebra::{Range, Space, SpaceSet, ip_range, port_range};
use model::FirewallRule;

/// Expands a rule into the spaces it blocks or admits: one
/// `(ip, port, protocols)` space per port spec, or a single space over
/// the whole port dimension when the rule carries none.
///
/// # Errors
///
/// Returns [`AccessError::InvalidRule`] when the rule's network or a
/// port spec does not parse.
pub fn rule_spaces(rule: &FirewallRule) -> Result<Vec<Space>, AccessError> {
    let network = ip_range(&rule.network)?;
    let protocols = Range::protocols([rule.protocol.as_str()]);
    if rule.port_specs.is_empty() {
        return Ok(vec![Space::new([
            network,
            Range::full_port_range(),
            protocols,
        ])]);
    }
    rule.port_specs
        .iter()
        .map(|spec| {
            Ok(Space::new([
                network.clone(),
                port_range(spec)?,
                protocols.clone(),
            ]))
        })
        .collect()
}

/// Folds a sequence of rules out of an initial reachable space:
/// the residual is what the rules leave untouched.
///
/// # Errors
///
/// Returns [`AccessError::InvalidRule`] for malformed rules and
/// [`AccessError::Algebra`] when a rule space does not match the
/// initial schema.
pub fn residual<'a>(
    initial: SpaceSet,
    rules: impl IntoIterator<Item = &'a FirewallRule>,
) -> Result<SpaceSet, AccessError> {
    let mut remaining = initial;
    for rule in rules {
        for space in rule_spaces(rule)? {
            remaining = remaining.difference(&space)?;
        }
    }
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rule(network: &str, protocol: &str, specs: &[&str]) -> FirewallRule {
        FirewallRule {
            network: network.to_string(),
            protocol: protocol.to_string(),
            port_specs: specs.iter().map(ToString::to_string).collect(),
        }
    }

    fn everything() -> SpaceSet {
        SpaceSet::from([Space::new([
            ip_range("0.0.0.0/0").unwrap(),
            Range::full_port_range(),
            Range::protocols(["TCP", "UDP", "ICMP"]),
        ])])
    }

    #[test]
    fn test_rule_without_specs_covers_all_ports() {
        let spaces = rule_spaces(&rule("10.0.0.0/8", "TCP", &[])).unwrap();
        assert_eq!(spaces.len(), 1);
        assert_eq!(spaces[0].ranges()[1], Range::full_port_range());
    }

    #[test]
    fn test_rule_with_specs_yields_one_space_per_spec() {
        let spaces = rule_spaces(&rule("10.0.0.0/8", "TCP", &["22", "80-90"])).unwrap();
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].ranges()[1], Range::port(22, 23).unwrap());
        assert_eq!(spaces[1].ranges()[1], Range::port(80, 91).unwrap());
    }

    #[test]
    fn test_residual_carves_out_rules() {
        let rules = [rule("10.0.0.0/8", "TCP", &[]), rule("10.0.0.0/8", "ICMP", &[])];
        let remaining = residual(everything(), &rules).unwrap();
        assert!(!remaining.is_empty());
        // UDP into 10/8 survives, TCP does not
        let udp_probe = Space::new([
            ip_range("10.1.2.3/32").unwrap(),
            Range::port(53, 54).unwrap(),
            Range::protocols(["UDP"]),
        ]);
        assert!(remaining.intersects(&udp_probe).unwrap());
        // TCP outside 10/8 survives
        let outside_probe = Space::new([
            ip_range("11.0.0.1/32").unwrap(),
            Range::port(80, 81).unwrap(),
            Range::protocols(["TCP"]),
        ]);
        assert!(remaining.intersects(&outside_probe).unwrap());
    }

    #[test]
    fn test_residual_of_everything_by_everything_is_empty() {
        let rules = [
            rule("0.0.0.0/0", "TCP", &[]),
            rule("0.0.0.0/0", "UDP", &[]),
            rule("0.0.0.0/0", "ICMP", &[]),
        ];
        let remaining = residual(everything(), &rules).unwrap();
        assert!(remaining.is_empty());
        // removing only two of the three protocols leaves a rest
        let partial = residual(everything(), &rules[..2]).unwrap();
        assert!(!partial.is_empty());
    }

    #[test]
    fn test_malformed_rule_is_rejected() {
        let err = residual(everything(), &[rule("256.1.2.3/8", "TCP", &[])]).unwrap_err();
        assert!(matches!(err, AccessError::InvalidRule(_)));
    }
}
