//! Client Identity Extraction
//!
//! Decides which rate limit bucket a request is counted against.

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use platform::client::extract_client_ip;

use crate::domain::client_identity::ClientIdentity;

/// Strategy for keying requests
pub trait ClientIdentityExtractor: Send + Sync {
    /// `None` when the request carries nothing to key on
    fn identify(&self, req: &Request<Body>) -> Option<ClientIdentity>;

    /// Identity, or the shared "unknown" bucket
    fn identify_or_unknown(&self, req: &Request<Body>) -> ClientIdentity {
        self.identify(req).unwrap_or_else(ClientIdentity::unknown)
    }
}

fn peer_ip(req: &Request<Body>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

/// Key by the connection's peer address
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteAddrIdentity;

impl ClientIdentityExtractor for RemoteAddrIdentity {
    fn identify(&self, req: &Request<Body>) -> Option<ClientIdentity> {
        peer_ip(req).map(ClientIdentity::from_ip)
    }
}

/// Key by the first `X-Forwarded-For` entry, falling back to the peer address
///
/// Only correct behind a proxy that overwrites the header.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardedForIdentity;

impl ClientIdentityExtractor for ForwardedForIdentity {
    fn identify(&self, req: &Request<Body>) -> Option<ClientIdentity> {
        extract_client_ip(req.headers(), peer_ip(req)).map(ClientIdentity::from_ip)
    }
}
