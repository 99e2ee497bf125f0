// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Firewall rule records and the dataset file format.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Query direction for rule applicability.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Access *to* an address.
    Ingress,
    /// Access *from* an address.
    Egress,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Ingress => write!(f, "ingress"),
            Direction::Egress => write!(f, "egress"),
        }
    }
}

/// A single firewall rule tuple as the data layer yields it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    /// Network the rule applies to, in CIDR text form.
    pub network: String,
    /// Protocol label, e.g. `TCP`.
    pub protocol: String,
    /// Port specs of the form `P` or `P-Q`; may be empty.
    #[serde(default)]
    pub port_specs: Vec<String>,
}

/// A tenant dataset: the rule lists for both directions, in the order
/// they should be yielded to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDataset {
    /// Rules applicable to ingress lookups.
    #[serde(default)]
    pub ingress: Vec<FirewallRule>,
    /// Rules applicable to egress lookups.
    #[serde(default)]
    pub egress: Vec<FirewallRule>,
}

impl ModelDataset {
    /// Returns the rule list for one direction.
    #[must_use]
    pub fn rules(&self, direction: Direction) -> &[FirewallRule] {
        match direction {
            Direction::Ingress => &self.ingress,
            Direction::Egress => &self.egress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dataset_yaml_roundtrip() {
        let yaml = r"
ingress:
  - network: 10.0.0.0/8
    protocol: TCP
    port_specs: ['80', '8000-8080']
  - network: 192.168.0.0/24
    protocol: ICMP
egress:
  - network: 0.0.0.0/0
    protocol: UDP
    port_specs: ['53']
";
        let dataset: ModelDataset = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(dataset.ingress.len(), 2);
        assert_eq!(dataset.ingress[0].port_specs, vec!["80", "8000-8080"]);
        // port specs default to empty when omitted
        assert_eq!(dataset.ingress[1].port_specs, Vec::<String>::new());
        assert_eq!(dataset.rules(Direction::Egress).len(), 1);
        assert_eq!(dataset.rules(Direction::Egress)[0].protocol, "UDP");
    }

    #[test]
    fn test_dataset_defaults_to_empty() {
        let dataset: ModelDataset = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(dataset, ModelDataset::default());
    }
}
