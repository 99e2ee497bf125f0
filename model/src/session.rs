// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Scoped model sessions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::debug;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A scoped session against one model.
///
/// Sessions are RAII guards over a manager-owned gauge of open
/// sessions: dropping the session releases it, on every exit path.
#[derive(Debug)]
pub struct Session {
    model: String,
    id: u64,
    open: Arc<AtomicUsize>,
}

impl Session {
    pub(crate) fn open(model: &str, gauge: &Arc<AtomicUsize>) -> Session {
        gauge.fetch_add(1, Ordering::SeqCst);
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        debug!(model, id, "model session opened");
        Session {
            model: model.to_string(),
            id,
            open: Arc::clone(gauge),
        }
    }

    /// Name of the model this session is scoped to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Process-unique session id, for log correlation.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
        debug!(model = %self.model, id = self.id, "model session released");
    }
}
