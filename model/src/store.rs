// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! In-memory model store backed by a directory of YAML datasets.

use crate::manager::{DataAccess, ModelError, ModelHandle, ModelManager};
use crate::rules::{Direction, FirewallRule, ModelDataset};
use crate::session::Session;
use algebra::{Range, ip_range, port_range};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Dataset file extensions picked up by [`StaticModelManager::from_dir`].
const DATASET_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

#[derive(Debug, Clone)]
struct StoredRule {
    rule: FirewallRule,
    network: Range,
}

#[derive(Debug)]
struct StoredModel {
    name: String,
    ingress: Vec<StoredRule>,
    egress: Vec<StoredRule>,
}

impl StoredModel {
    fn rules(&self, direction: Direction) -> &[StoredRule] {
        match direction {
            Direction::Ingress => &self.ingress,
            Direction::Egress => &self.egress,
        }
    }
}

/// A model manager serving immutable, pre-validated datasets.
///
/// Datasets are validated on insertion: every rule network and port
/// spec must parse, so lookups only deal with well-formed rules.
#[derive(Debug, Default)]
pub struct StaticModelManager {
    models: HashMap<String, Arc<StoredModel>>,
    open_sessions: Arc<AtomicUsize>,
}

impl StaticModelManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> StaticModelManager {
        StaticModelManager::default()
    }

    /// Registers a dataset under `name`, validating every rule.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DatasetLoad`] when any rule network or
    /// port spec fails to parse.
    pub fn insert(&mut self, name: &str, dataset: ModelDataset) -> Result<(), ModelError> {
        let ingress = Self::validate_rules(name, &dataset.ingress)?;
        let egress = Self::validate_rules(name, &dataset.egress)?;
        self.models.insert(
            name.to_string(),
            Arc::new(StoredModel {
                name: name.to_string(),
                ingress,
                egress,
            }),
        );
        Ok(())
    }

    /// Loads every `*.yaml` / `*.yml` file in `path` as a dataset;
    /// the file stem becomes the model handle.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DatasetDir`] when the directory cannot be
    /// read and [`ModelError::DatasetLoad`] for malformed datasets.
    pub fn from_dir(path: &Path) -> Result<StaticModelManager, ModelError> {
        let mut manager = StaticModelManager::new();
        let entries = std::fs::read_dir(path).map_err(|source| ModelError::DatasetDir {
            path: path.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| ModelError::DatasetDir {
                path: path.to_path_buf(),
                source,
            })?;
            let file = entry.path();
            let is_dataset = file
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| DATASET_EXTENSIONS.contains(&ext));
            if !is_dataset {
                continue;
            }
            let Some(name) = file.file_stem().and_then(|stem| stem.to_str()) else {
                warn!(?file, "skipping dataset with non-UTF-8 name");
                continue;
            };
            let text = std::fs::read_to_string(&file).map_err(|err| ModelError::DatasetLoad {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
            let dataset: ModelDataset =
                serde_yaml_ng::from_str(&text).map_err(|err| ModelError::DatasetLoad {
                    name: name.to_string(),
                    reason: err.to_string(),
                })?;
            manager.insert(name, dataset)?;
            info!(model = name, "loaded firewall rule dataset");
        }
        Ok(manager)
    }

    /// Number of currently open sessions, for observability and tests.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    fn validate_rules(name: &str, rules: &[FirewallRule]) -> Result<Vec<StoredRule>, ModelError> {
        rules
            .iter()
            .map(|rule| {
                let network = ip_range(&rule.network).map_err(|err| ModelError::DatasetLoad {
                    name: name.to_string(),
                    reason: format!("rule network {:?}: {err}", rule.network),
                })?;
                for spec in &rule.port_specs {
                    port_range(spec).map_err(|err| ModelError::DatasetLoad {
                        name: name.to_string(),
                        reason: format!("rule port spec {spec:?}: {err}"),
                    })?;
                }
                Ok(StoredRule {
                    rule: rule.clone(),
                    network,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ModelManager for StaticModelManager {
    async fn get(&self, model_name: &str) -> Result<ModelHandle, ModelError> {
        let model = self
            .models
            .get(model_name)
            .cloned()
            .ok_or_else(|| ModelError::ModelNotFound(model_name.to_string()))?;
        let session = Session::open(model_name, &self.open_sessions);
        Ok(ModelHandle::new(
            session,
            Arc::new(StaticDataAccess { model }),
        ))
    }
}

#[derive(Debug)]
struct StaticDataAccess {
    model: Arc<StoredModel>,
}

#[async_trait]
impl DataAccess for StaticDataAccess {
    async fn firewall_rules(
        &self,
        session: &Session,
        address: &str,
        direction: Direction,
    ) -> Result<Vec<FirewallRule>, ModelError> {
        debug_assert_eq!(session.model(), self.model.name);
        let probe = ip_range(address)?;
        let matched: Vec<FirewallRule> = self
            .model
            .rules(direction)
            .iter()
            .filter(|stored| {
                stored
                    .network
                    .intersect(&probe)
                    .unwrap_or_else(|_| unreachable!())
                    .is_some_and(|shared| !shared.is_empty())
            })
            .map(|stored| stored.rule.clone())
            .collect();
        debug!(
            session = session.id(),
            model = %self.model.name,
            address,
            %direction,
            matched = matched.len(),
            "firewall rule lookup"
        );
        Ok(matched)
    }
}
