// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Model management for the firewall access engine.
//!
//! A model is a tenant's firewall rule dataset, selected by an opaque
//! handle.  The [`ModelManager`] hands out a scoped [`Session`]
//! together with a [`DataAccess`] adapter; the session is an RAII
//! guard and is released on every exit path, including cancellation.
//!
//! The shipped implementation, [`StaticModelManager`], serves datasets
//! loaded from a directory of YAML files, one file per model handle.

pub mod manager;
pub mod rules;
pub mod session;
pub mod store;

pub use manager::{DataAccess, ModelError, ModelHandle, ModelManager};
pub use rules::{Direction, FirewallRule, ModelDataset};
pub use session::Session;
pub use store::StaticModelManager;
