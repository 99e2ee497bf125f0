// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The streaming access API.

use crate::AccessError;
use crate::domain::{EndpointDomain, domains_for_rule};
use crate::retry::Backoff;
use model::{Direction, FirewallRule, ModelError, ModelHandle, ModelManager};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// Bounded hand-off between the producer task and the consumer; a
/// slow consumer applies backpressure rather than buffering the whole
/// result.
const DOMAIN_CHANNEL_DEPTH: usize = 16;

/// A lazy, single-shot stream of endpoint domains.
///
/// Items arrive in the order the model manager yields rules, with
/// per-rule port-spec order preserved.  The first error terminates
/// the stream.  Dropping the stream cancels the producer: it stops
/// pulling from the model manager at its next emission and releases
/// the session.
pub type DomainStream = ReceiverStream<Result<EndpointDomain, AccessError>>;

/// Answers access-domain queries against a model manager.
pub struct Firewaller {
    manager: Arc<dyn ModelManager>,
}

impl Firewaller {
    /// Creates a firewaller over the given model manager.
    #[must_use]
    pub fn new(manager: Arc<dyn ModelManager>) -> Firewaller {
        Firewaller { manager }
    }

    /// Streams the endpoint domains admitted *to* `address` in the
    /// model selected by `handle`.
    #[must_use]
    pub fn access_by_address_ingress(&self, handle: &str, address: &str) -> DomainStream {
        self.stream_domains(handle, address, Direction::Ingress)
    }

    /// Streams the endpoint domains admitted *from* `address` in the
    /// model selected by `handle`.
    #[must_use]
    pub fn access_by_address_egress(&self, handle: &str, address: &str) -> DomainStream {
        self.stream_domains(handle, address, Direction::Egress)
    }

    fn stream_domains(&self, handle: &str, address: &str, direction: Direction) -> DomainStream {
        let (tx, rx) = mpsc::channel(DOMAIN_CHANNEL_DEPTH);
        let manager = Arc::clone(&self.manager);
        let handle = handle.to_string();
        let address = address.to_string();
        tokio::spawn(async move {
            if let Err(err) = produce(&*manager, &handle, &address, direction, &tx).await {
                // fail fast: surface the error and end the stream
                let _ = tx.send(Err(err)).await;
            }
        });
        ReceiverStream::new(rx)
    }
}

impl std::fmt::Debug for Firewaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firewaller").finish_non_exhaustive()
    }
}

/// Runs one access query to completion: session scope, rule fetch,
/// domain emission.  The session guard lives inside this function, so
/// it is released on every way out.
async fn produce(
    manager: &dyn ModelManager,
    handle: &str,
    address: &str,
    direction: Direction,
    tx: &mpsc::Sender<Result<EndpointDomain, AccessError>>,
) -> Result<(), AccessError> {
    let model = acquire_session(manager, handle).await?;
    let rules = fetch_rules(&model, address, direction).await?;
    for rule in &rules {
        for domain in domains_for_rule(rule, direction)? {
            if tx.send(Ok(domain)).await.is_err() {
                debug!(handle, address, "domain stream consumer went away, stopping");
                return Ok(());
            }
        }
    }
    Ok(())
}

async fn acquire_session(
    manager: &dyn ModelManager,
    handle: &str,
) -> Result<ModelHandle, AccessError> {
    let mut backoff = Backoff::new();
    loop {
        match manager.get(handle).await {
            Ok(model) => return Ok(model),
            Err(ModelError::Transient(reason)) => backoff.pause(&reason).await?,
            Err(err) => return Err(err.into()),
        }
    }
}

async fn fetch_rules(
    model: &ModelHandle,
    address: &str,
    direction: Direction,
) -> Result<Vec<FirewallRule>, AccessError> {
    let mut backoff = Backoff::new();
    loop {
        match model
            .data_access()
            .firewall_rules(model.session(), address, direction)
            .await
        {
            Ok(rules) => return Ok(rules),
            Err(ModelError::Transient(reason)) => backoff.pause(&reason).await?,
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use model::{ModelDataset, StaticModelManager};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_stream::StreamExt;

    fn rule(network: &str, protocol: &str, specs: &[&str]) -> FirewallRule {
        FirewallRule {
            network: network.to_string(),
            protocol: protocol.to_string(),
            port_specs: specs.iter().map(ToString::to_string).collect(),
        }
    }

    fn dataset() -> ModelDataset {
        ModelDataset {
            ingress: vec![
                rule("10.0.0.0/8", "TCP", &["22", "80"]),
                rule("10.0.0.0/16", "ICMP", &[]),
            ],
            egress: vec![
                rule("10.0.0.0/8", "UDP", &["53"]),
                rule("10.0.0.0/8", "ICMP", &[]),
            ],
        }
    }

    fn static_manager() -> Arc<StaticModelManager> {
        let mut manager = StaticModelManager::new();
        manager.insert("tenant", dataset()).unwrap();
        Arc::new(manager)
    }

    async fn collect(mut stream: DomainStream) -> Vec<Result<EndpointDomain, AccessError>> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_ingress_emits_per_spec_then_protocol_only() {
        let manager = static_manager();
        let firewaller = Firewaller::new(manager);
        let items = collect(firewaller.access_by_address_ingress("tenant", "10.0.0.1")).await;
        let domains: Vec<EndpointDomain> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(domains.len(), 3);
        // rule order, then port-spec order within the rule
        assert_eq!(domains[0].ports.unwrap().start, 22);
        assert_eq!(domains[1].ports.unwrap().start, 80);
        assert_eq!(domains[2].ports, None);
        assert_eq!(domains[2].protocols, vec!["ICMP"]);
    }

    #[tokio::test]
    async fn test_egress_skips_rules_without_specs() {
        let manager = static_manager();
        let firewaller = Firewaller::new(manager);
        let items = collect(firewaller.access_by_address_egress("tenant", "10.0.0.1")).await;
        let domains: Vec<EndpointDomain> = items.into_iter().map(Result::unwrap).collect();
        // the ICMP rule has no port specs and yields nothing on egress
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].protocols, vec!["UDP"]);
        assert_eq!(domains[0].ports.unwrap().start, 53);
    }

    #[tokio::test]
    async fn test_unknown_handle_fails_the_stream() {
        let firewaller = Firewaller::new(static_manager());
        let items = collect(firewaller.access_by_address_ingress("ghost", "10.0.0.1")).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(AccessError::Model(ModelError::ModelNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_bad_address_fails_the_stream() {
        let firewaller = Firewaller::new(static_manager());
        let items = collect(firewaller.access_by_address_ingress("tenant", "nonsense")).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(AccessError::Model(ModelError::InvalidAddress(_)))
        ));
    }

    #[tokio::test]
    async fn test_dropping_the_stream_releases_the_session() {
        let mut big = ModelDataset::default();
        for port in 0..256_u32 {
            big.ingress
                .push(rule("10.0.0.0/8", "TCP", &[port.to_string().as_str()]));
        }
        let mut inner = StaticModelManager::new();
        inner.insert("tenant", big).unwrap();
        let manager = Arc::new(inner);

        let firewaller = Firewaller::new(manager.clone());
        let mut stream = firewaller.access_by_address_ingress("tenant", "10.0.0.1");
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.ports.unwrap().start, 0);
        drop(stream);

        // the producer notices at its next send and drops the session
        for _ in 0..64 {
            if manager.open_sessions() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.open_sessions(), 0);
    }

    #[derive(Debug)]
    struct FlakyManager {
        inner: StaticModelManager,
        failures: AtomicU32,
    }

    #[async_trait]
    impl ModelManager for FlakyManager {
        async fn get(&self, model_name: &str) -> Result<ModelHandle, ModelError> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(ModelError::Transient("backend hiccup".to_string()));
            }
            self.inner.get(model_name).await
        }
    }

    fn flaky_manager(failures: u32) -> Arc<FlakyManager> {
        let mut inner = StaticModelManager::new();
        inner.insert("tenant", dataset()).unwrap();
        Arc::new(FlakyManager {
            inner,
            failures: AtomicU32::new(failures),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let firewaller = Firewaller::new(flaky_manager(3));
        let items = collect(firewaller.access_by_address_ingress("tenant", "10.0.0.1")).await;
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(Result::is_ok));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_exhaust_after_five_attempts() {
        let manager = flaky_manager(32);
        let firewaller = Firewaller::new(manager.clone());
        let items = collect(firewaller.access_by_address_ingress("tenant", "10.0.0.1")).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(AccessError::RetriesExhausted { attempts: 5, .. })
        ));
        // five attempts were actually consumed
        assert_eq!(manager.failures.load(Ordering::SeqCst), 32 - 5);
    }
}
