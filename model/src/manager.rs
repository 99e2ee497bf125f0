// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The model manager contract consumed by the access layer.

use crate::rules::{Direction, FirewallRule};
use crate::session::Session;
use algebra::InvalidRange;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors surfaced by model managers and data access adapters.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// No dataset is registered under the requested handle.
    #[error("unknown model: {0}")]
    ModelNotFound(String),
    /// A retryable failure; callers apply bounded backoff.
    #[error("transient model failure: {0}")]
    Transient(String),
    /// The lookup address did not parse.
    #[error("invalid lookup address: {0}")]
    InvalidAddress(#[from] InvalidRange),
    /// A dataset failed validation or deserialization.
    #[error("failed to load dataset {name}: {reason}")]
    DatasetLoad {
        /// Model name the dataset was meant for.
        name: String,
        /// Human-readable cause.
        reason: String,
    },
    /// The dataset directory could not be read.
    #[error("failed to read dataset directory {path:?}: {source}")]
    DatasetDir {
        /// Directory that was being scanned.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// A scoped session paired with the data access adapter bound to the
/// same model.
#[derive(Debug)]
pub struct ModelHandle {
    session: Session,
    data: Arc<dyn DataAccess>,
}

impl ModelHandle {
    /// Pairs a session with its data access adapter.
    #[must_use]
    pub fn new(session: Session, data: Arc<dyn DataAccess>) -> ModelHandle {
        ModelHandle { session, data }
    }

    /// The scoped session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The data access adapter.
    #[must_use]
    pub fn data_access(&self) -> &dyn DataAccess {
        self.data.as_ref()
    }
}

/// Hands out sessions and data access for named models.
#[async_trait]
pub trait ModelManager: Send + Sync {
    /// Opens a session against `model_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ModelNotFound`] for unknown handles and
    /// [`ModelError::Transient`] for retryable failures.
    async fn get(&self, model_name: &str) -> Result<ModelHandle, ModelError>;
}

/// Yields the firewall rules applicable to an address lookup.
///
/// Applicability, including the ingress/egress selection, lives
/// behind this trait; callers treat the returned rules opaquely and
/// must preserve their order.
#[async_trait]
pub trait DataAccess: Send + Sync + std::fmt::Debug {
    /// Returns the applicable rules for `address` in `direction`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidAddress`] when the address does
    /// not parse and [`ModelError::Transient`] for retryable
    /// failures.
    async fn firewall_rules(
        &self,
        session: &Session,
        address: &str,
        direction: Direction,
    ) -> Result<Vec<FirewallRule>, ModelError>;
}
