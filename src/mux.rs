//! Query multiplexing between clients and the upstream resolver.
//!
//! One event loop serves both sockets: client queries arrive on the
//! downstream socket, get their transaction ID rewritten and registered
//! in the in-flight table, and leave through the resolver; upstream
//! responses arrive on the upstream socket, are matched by rewritten ID
//! and returned to the recorded client with the original ID restored.
//!
//! The hot path never parses the full DNS message — only the first two
//! bytes. That keeps the router working for payloads the decoder would
//! reject; full decoding happens off-path for trace diagnostics only.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::{Level, debug, trace, warn};

use crate::inflight::InflightTable;
use crate::resolver::Resolver;
use crate::wire::Message;

/// Maximum size of a DNS packet (with some headroom).
pub const MAX_DNS_PACKET_SIZE: usize = 4096;

/// A datagram must carry at least a transaction ID to be routable.
const MIN_DATAGRAM_LEN: usize = 2;

/// Routes datagrams between clients and the upstream resolver.
pub struct Multiplexer {
    downstream: Arc<UdpSocket>,
    upstream: Arc<UdpSocket>,
    table: Arc<InflightTable>,
    resolver: Resolver,
}

impl Multiplexer {
    pub fn new(
        downstream: Arc<UdpSocket>,
        upstream: Arc<UdpSocket>,
        table: Arc<InflightTable>,
        resolver: Resolver,
    ) -> Self {
        Self {
            downstream,
            upstream,
            table,
            resolver,
        }
    }

    /// Main event loop: multiplexes the downstream and upstream sockets,
    /// one datagram at a time. Receive errors are logged and the loop
    /// carries on.
    pub async fn run(&self) -> io::Result<()> {
        let mut client_buf = [0u8; MAX_DNS_PACKET_SIZE];
        let mut upstream_buf = [0u8; MAX_DNS_PACKET_SIZE];

        loop {
            tokio::select! {
                result = self.downstream.recv_from(&mut client_buf) => {
                    match result {
                        Ok((len, src)) => {
                            self.handle_client_datagram(&mut client_buf[..len], src).await;
                        }
                        Err(e) => warn!(error = %e, "downstream recv error"),
                    }
                }
                result = self.upstream.recv_from(&mut upstream_buf) => {
                    match result {
                        Ok((len, _)) => {
                            self.handle_upstream_datagram(&mut upstream_buf[..len]).await;
                        }
                        Err(e) => warn!(error = %e, "upstream recv error"),
                    }
                }
            }
        }
    }

    /// A fresh query from a client: rewrite its transaction ID in place
    /// and forward the buffer otherwise unmodified.
    pub async fn handle_client_datagram(&self, buf: &mut [u8], src: SocketAddr) {
        if buf.len() < MIN_DATAGRAM_LEN {
            trace!(len = buf.len(), %src, "dropping short client datagram");
            return;
        }

        let original_id = u16::from_be_bytes([buf[0], buf[1]]);

        let rewritten_id = match self.table.register(original_id, src).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, %src, "dropping query");
                return;
            }
        };

        buf[..2].copy_from_slice(&rewritten_id.to_be_bytes());
        trace!(original_id, rewritten_id, %src, "query registered");

        if let Err(e) = self.resolver.resolve_query(buf).await {
            warn!(error = %e, "upstream send failed");
        }
    }

    /// A response returning from upstream: match it to an in-flight
    /// query, restore the original transaction ID and deliver it to the
    /// client. Unmatched responses are dropped silently — expected under
    /// timeout races.
    pub async fn handle_upstream_datagram(&self, buf: &mut [u8]) {
        if buf.len() < MIN_DATAGRAM_LEN {
            trace!(len = buf.len(), "dropping short upstream datagram");
            return;
        }

        let rewritten_id = u16::from_be_bytes([buf[0], buf[1]]);

        let Some(entry) = self.table.resolve(rewritten_id).await else {
            debug!(rewritten_id, "no matching query in flight, dropping response");
            return;
        };

        buf[..2].copy_from_slice(&entry.original_id.to_be_bytes());

        if tracing::enabled!(Level::TRACE) {
            self.trace_response(buf, entry.original_id);
        }

        debug!(
            original_id = entry.original_id,
            rewritten_id,
            client = %entry.client_addr,
            elapsed_ms = entry.received_at.elapsed().as_millis() as u64,
            "landing response"
        );

        if let Err(e) = self.downstream.send_to(buf, entry.client_addr).await {
            warn!(error = %e, client = %entry.client_addr, "downstream send failed");
        }
    }

    /// Off-path diagnostic decode of a response. Decode failures are a
    /// property of the payload, not of the router, so they are logged and
    /// ignored.
    fn trace_response(&self, buf: &[u8], original_id: u16) {
        match Message::decode(buf) {
            Ok(message) => trace!(
                original_id,
                rcode = message.header.response_code,
                answers = message.answers.len(),
                authority = message.authority.len(),
                additional = message.additional.len(),
                "decoded upstream response"
            ),
            Err(e) => trace!(original_id, error = %e, "upstream response failed decode"),
        }
    }
}
