//! Resolution policy.
//!
//! Decides where a query goes once its transaction ID has been rewritten.
//! Only stub forwarding is active; authoritative and recursive modes are
//! placeholders that fall through to the stub resolver.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::debug;

/// Forwards queries verbatim to a single configured upstream resolver.
///
/// Fire-and-forget: sending is the only I/O here, nothing awaits the
/// response inline. Responses come back through the upstream socket's
/// receive path and are matched up by the multiplexer.
pub struct StubResolver {
    socket: Arc<UdpSocket>,
    upstream: SocketAddr,
}

impl StubResolver {
    pub fn new(socket: Arc<UdpSocket>, upstream: SocketAddr) -> Self {
        Self { socket, upstream }
    }

    pub async fn forward(&self, query: &[u8]) -> io::Result<usize> {
        debug!(upstream = %self.upstream, len = query.len(), "forwarding query upstream");
        self.socket.send_to(query, self.upstream).await
    }
}

/// Resolution mode dispatch.
///
/// Mirrors the intended mode hierarchy: authoritative answering and full
/// recursion are not implemented, so every query currently takes the
/// stub path.
pub struct Resolver {
    is_authoritative: bool,
    is_recursive: bool,
    stub: StubResolver,
}

impl Resolver {
    pub fn new(stub: StubResolver) -> Self {
        Self {
            is_authoritative: false,
            is_recursive: false,
            stub,
        }
    }

    pub async fn resolve_query(&self, query: &[u8]) -> io::Result<usize> {
        if self.is_authoritative {
            // TODO: route to the authoritative module once zone data exists.
        }

        if !self.is_authoritative && self.is_recursive {
            // TODO: route to the recursive resolver once implemented.
        }

        self.stub.forward(query).await
    }
}
