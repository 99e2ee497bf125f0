// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The gRPC face of the firewall engine.
//!
//! The wire types and service plumbing in [`firewall`] are generated
//! from `proto/firewall.proto` and checked in; [`server`] implements
//! the service over the access layer.

pub mod firewall;
pub mod server;

pub use server::{FirewallApi, HANDLE_KEY};
