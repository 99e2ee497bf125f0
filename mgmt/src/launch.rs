// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Management service launch.

use crate::grpc::firewall::firewall_server::FirewallServer;
use crate::grpc::server::FirewallApi;
use access::Firewaller;
use args::GrpcAddress;
use model::ModelManager;
use std::sync::Arc;
use tokio_stream::wrappers::UnixListenerStream;
use tracing::{debug, info};

/// Errors ending the management thread.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Socket setup failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The gRPC server failed.
    #[error("gRPC serve error: {0}")]
    Serve(#[from] tonic::transport::Error),
}

/// Everything the management thread needs.
pub struct MgmtParams {
    /// Address to listen on, TCP or Unix socket.
    pub address: GrpcAddress,
    /// Model manager backing access queries.
    pub manager: Arc<dyn ModelManager>,
}

/// Serves the firewall gRPC API from a dedicated thread, on a TCP or
/// Unix socket.
///
/// The thread owns its own current-thread tokio runtime; the returned
/// handle resolves when the server exits.
///
/// # Errors
///
/// Returns an error when the thread cannot be spawned.
pub fn start_mgmt(
    params: MgmtParams,
) -> Result<std::thread::JoinHandle<Result<(), LaunchError>>, std::io::Error> {
    std::thread::Builder::new()
        .name("mgmt".to_string())
        .spawn(move || {
            debug!("management thread up, building runtime");

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_io()
                .enable_time()
                .build()
                .expect("management runtime could not be built");

            rt.block_on(async move {
                let api = FirewallApi::new(Firewaller::new(params.manager));
                let service = FirewallServer::new(api);
                match params.address {
                    GrpcAddress::Tcp(addr) => {
                        info!(%addr, "mgmt listening on tcp");
                        tonic::transport::Server::builder()
                            .add_service(service)
                            .serve(addr)
                            .await?;
                    }
                    GrpcAddress::UnixSocket(path) => {
                        info!(path, "mgmt listening on unix socket");
                        let listener = tokio::net::UnixListener::bind(&path)?;
                        let incoming = UnixListenerStream::new(listener);
                        tonic::transport::Server::builder()
                            .add_service(service)
                            .serve_with_incoming(incoming)
                            .await?;
                    }
                }
                Ok(())
            })
        })
}
