// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Management surface of the firewall access engine: the gRPC service
//! and the thread that hosts it.

pub mod grpc;
pub mod launch;

pub use launch::{LaunchError, MgmtParams, start_mgmt};
