// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The firewall gRPC service over the access layer.

use access::{AccessError, EndpointDomain, Firewaller};
use model::{Direction, ModelError};
use std::pin::Pin;
use tokio_stream::{Stream, StreamExt};
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::grpc::firewall::firewall_server::Firewall;
use crate::grpc::firewall::{
    AccessRequest, EndpointDomain as WireEndpointDomain, IpRange as WireIpRange, PingReply,
    PingRequest, PortRange as WirePortRange,
};

/// Request metadata key carrying the model handle.
pub const HANDLE_KEY: &str = "handle";

type WireDomainStream = Pin<Box<dyn Stream<Item = Result<WireEndpointDomain, Status>> + Send>>;

/// gRPC handler for the firewall service.
#[derive(Debug)]
pub struct FirewallApi {
    firewaller: Firewaller,
}

impl FirewallApi {
    /// Wraps a firewaller for serving.
    #[must_use]
    pub fn new(firewaller: Firewaller) -> FirewallApi {
        FirewallApi { firewaller }
    }

    /// Extracts the model handle from the request metadata.
    fn handle_from<T>(request: &Request<T>) -> Result<String, Status> {
        let value = request
            .metadata()
            .get(HANDLE_KEY)
            .ok_or_else(|| Status::invalid_argument("missing request metadata: handle"))?;
        let value = value
            .to_str()
            .map_err(|_| Status::invalid_argument("handle metadata must be printable ascii"))?;
        Ok(value.to_string())
    }

    fn open_stream(
        &self,
        request: Request<AccessRequest>,
        direction: Direction,
    ) -> Result<Response<WireDomainStream>, Status> {
        let handle = Self::handle_from(&request)?;
        let address = request.into_inner().ipaddress;
        debug!(handle, address, %direction, "access-by-address query");
        let stream = match direction {
            Direction::Ingress => self.firewaller.access_by_address_ingress(&handle, &address),
            Direction::Egress => self.firewaller.access_by_address_egress(&handle, &address),
        };
        let wire = stream.map(|item| item.map(wire_domain).map_err(status_for));
        Ok(Response::new(Box::pin(wire)))
    }
}

#[tonic::async_trait]
impl Firewall for FirewallApi {
    async fn ping(&self, request: Request<PingRequest>) -> Result<Response<PingReply>, Status> {
        Ok(Response::new(PingReply {
            data: request.into_inner().data,
        }))
    }

    type AccessByAddressIngressStream = WireDomainStream;

    async fn access_by_address_ingress(
        &self,
        request: Request<AccessRequest>,
    ) -> Result<Response<Self::AccessByAddressIngressStream>, Status> {
        self.open_stream(request, Direction::Ingress)
    }

    type AccessByAddressEgressStream = WireDomainStream;

    async fn access_by_address_egress(
        &self,
        request: Request<AccessRequest>,
    ) -> Result<Response<Self::AccessByAddressEgressStream>, Status> {
        self.open_stream(request, Direction::Egress)
    }
}

/// Converts an endpoint domain to its wire form.  Integer bounds ride
/// as 16-byte big-endian strings; the original CIDR text rides along.
fn wire_domain(domain: EndpointDomain) -> WireEndpointDomain {
    WireEndpointDomain {
        ip_range: Some(WireIpRange {
            range: domain.ip.cidr,
            start: domain.ip.start.to_be_bytes().to_vec(),
            end_exclusive: domain.ip.end_exclusive.to_be_bytes().to_vec(),
        }),
        port_range: domain.ports.map(|ports| WirePortRange {
            start: ports.start,
            end_exclusive: ports.end_exclusive,
        }),
        protocols: domain.protocols,
    }
}

fn status_for(err: AccessError) -> Status {
    match err {
        AccessError::Model(ModelError::ModelNotFound(name)) => {
            Status::not_found(format!("unknown model: {name}"))
        }
        AccessError::Model(ModelError::InvalidAddress(err)) => {
            Status::invalid_argument(err.to_string())
        }
        AccessError::Model(ModelError::Transient(reason)) => Status::unavailable(reason),
        AccessError::Model(err) => Status::internal(err.to_string()),
        AccessError::RetriesExhausted { attempts, reason } => Status::unavailable(format!(
            "retries exhausted after {attempts} attempts: {reason}"
        )),
        AccessError::InvalidRule(err) => Status::internal(err.to_string()),
        AccessError::Algebra(err) => Status::internal(err.to_string()),
    }
}
