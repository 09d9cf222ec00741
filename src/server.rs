//! Client ingress loop (C4) and upstream egress reader (C5).
//!
//! A single upstream UDP socket is shared across every in-flight client
//! query: the 16-bit transaction ID the forwarder writes onto the outbound
//! packet is not random, it is the pending-table slot index, so the egress
//! reader can find the right client by indexing straight into the table
//! instead of matching on a randomized ID (see DESIGN.md on why the
//! alternative, one-upstream-socket-per-query, design was not used here).

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::metrics::Metrics;
use crate::packet::{self, DnsHeader, RCODE_SERVFAIL};
use crate::pending::{PendingQuery, PendingTable};

const UDP_BUF_SIZE: usize = 4096;

pub struct Forwarder {
    pub client_socket: Arc<UdpSocket>,
    pub upstream_socket: Arc<UdpSocket>,
    pub cache: ResponseCache,
    pub pending: Arc<PendingTable>,
    pub metrics: Arc<Metrics>,
}

pub async fn run_ingress(forwarder: Arc<Forwarder>) {
    let mut buf = [0u8; UDP_BUF_SIZE];
    loop {
        let (len, src) = match forwarder.client_socket.recv_from(&mut buf).await {
            Ok(r) => r,
            Err(e) => {
                warn!("client socket recv error: {e}");
                continue;
            }
        };
        let datagram = buf[..len].to_vec();
        let forwarder = forwarder.clone();
        tokio::spawn(async move {
            handle_client_datagram(&forwarder, datagram, src).await;
        });
    }
}

async fn handle_client_datagram(forwarder: &Forwarder, mut datagram: Vec<u8>, src: SocketAddr) {
    let query = match packet::parse_query(&datagram) {
        Ok(q) => q,
        Err(e) => {
            debug!("dropping unparseable query from {src}: {e}");
            return;
        }
    };
    if query.questions.len() != 1 {
        debug!("dropping query from {src} with {} questions", query.questions.len());
        return;
    }
    let question = &query.questions[0];

    if let Some(raw) = forwarder
        .cache
        .get(&question.name, question.qtype, question.qclass)
        .await
    {
        forwarder.metrics.cache_hit();
        let mut reply = (*raw).clone();
        DnsHeader::rewrite_id(&mut reply, query.header.id);
        packet::truncate_for_udp(&mut reply, UDP_BUF_SIZE);
        if let Err(e) = forwarder.client_socket.send_to(&reply, src).await {
            debug!("failed to send cached reply to {src}: {e}");
        }
        return;
    }

    forwarder.metrics.cache_miss();

    let pending = PendingQuery {
        client_addr: src,
        original_id: query.header.id,
        name: question.name.clone(),
        qtype: question.qtype,
        qclass: question.qclass,
        deadline: forwarder.pending.deadline_from_now(),
    };

    let Some(slot_id) = forwarder.pending.allocate(pending) else {
        warn!("pending table saturated, replying SERVFAIL to {src}");
        let resp = packet::build_error_response(&query, RCODE_SERVFAIL);
        let _ = forwarder.client_socket.send_to(&resp, src).await;
        return;
    };

    DnsHeader::rewrite_id(&mut datagram, slot_id);
    if let Err(e) = forwarder.upstream_socket.send(&datagram).await {
        forwarder.pending.take(slot_id);
        forwarder.metrics.upstream_err();
        debug!("failed to forward query to upstream: {e}");
    }
}

pub async fn run_egress(forwarder: Arc<Forwarder>) {
    let mut buf = [0u8; UDP_BUF_SIZE];
    loop {
        let len = match forwarder.upstream_socket.recv(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("upstream socket recv error: {e}");
                continue;
            }
        };

        let Some(slot_id) = DnsHeader::read_id(&buf[..len]) else {
            continue;
        };
        let Some(pending) = forwarder.pending.take(slot_id) else {
            debug!("no pending entry for upstream id {slot_id}, dropping reply");
            continue;
        };

        let mut reply = buf[..len].to_vec();
        DnsHeader::rewrite_id(&mut reply, pending.original_id);

        match packet::parse_message(&reply) {
            Ok(parsed) if !parsed.answers.is_empty() => {
                let min_ttl = parsed.answers.iter().map(|r| r.ttl).min().unwrap_or(0);
                forwarder
                    .cache
                    .put(&pending.name, pending.qtype, pending.qclass, reply.clone(), min_ttl)
                    .await;
                forwarder.metrics.upstream_ok();
            }
            Ok(_) => {
                forwarder.metrics.upstream_ok();
            }
            Err(e) => {
                debug!("upstream reply for {} failed to parse: {e}", pending.name);
                forwarder.metrics.upstream_err();
            }
        }

        packet::truncate_for_udp(&mut reply, UDP_BUF_SIZE);
        if let Err(e) = forwarder
            .client_socket
            .send_to(&reply, pending.client_addr)
            .await
        {
            debug!("failed to deliver reply to {}: {e}", pending.client_addr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{RecordClass, RecordType};

    #[tokio::test]
    async fn pending_allocation_assigns_slot_usable_as_txid() {
        let pending = PendingTable::new(std::time::Duration::from_millis(250));
        let deadline = pending.deadline_from_now();
        let id = pending
            .allocate(PendingQuery {
                client_addr: "127.0.0.1:5353".parse().unwrap(),
                original_id: 0x4242,
                name: "example.com".to_string(),
                qtype: RecordType::A,
                qclass: RecordClass::IN,
                deadline,
            })
            .unwrap();
        let taken = pending.take(id).unwrap();
        assert_eq!(taken.original_id, 0x4242);
    }
}
