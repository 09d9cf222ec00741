//! Pending-query table: one slot per possible upstream transaction ID,
//! correlating an in-flight upstream query with the client that sent it.
//!
//! Allocation never randomizes the ID the way a direct-socket-per-query
//! forwarder would (see DESIGN.md on why that design is superseded here):
//! the slot index *is* the upstream transaction ID, rewritten onto the
//! outbound packet and restored on the matching reply.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::records::{RecordClass, RecordType};

const SLOT_COUNT: usize = 65_536;
const MAX_PROBE: usize = 1024;

#[derive(Clone)]
pub struct PendingQuery {
    pub client_addr: SocketAddr,
    pub original_id: u16,
    pub name: String,
    pub qtype: RecordType,
    pub qclass: RecordClass,
    pub deadline: Instant,
}

pub struct PendingTable {
    slots: Vec<Mutex<Option<PendingQuery>>>,
    cursor: AtomicUsize,
    timeout: Duration,
}

impl PendingTable {
    pub fn new(timeout: Duration) -> Self {
        let mut slots = Vec::with_capacity(SLOT_COUNT);
        slots.resize_with(SLOT_COUNT, || Mutex::new(None));
        Self {
            slots,
            cursor: AtomicUsize::new(0),
            timeout,
        }
    }

    /// Claim a free slot starting from the rotating cursor, probing at most
    /// `MAX_PROBE` slots. Returns the slot index (the upstream transaction
    /// ID to use) on success.
    pub fn allocate(&self, query: PendingQuery) -> Option<u16> {
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % SLOT_COUNT;
        for i in 0..MAX_PROBE {
            let idx = (start + i) % SLOT_COUNT;
            let mut slot = self.slots[idx].lock();
            if slot.is_none() {
                *slot = Some(query);
                return Some(idx as u16);
            }
        }
        None
    }

    /// Take the slot's contents if it is occupied, freeing it. Used by the
    /// upstream reader on a matching reply.
    pub fn take(&self, id: u16) -> Option<PendingQuery> {
        let mut slot = self.slots[id as usize].lock();
        slot.take()
    }

    /// Sweep every slot whose deadline has passed, clearing occupancy.
    /// Returns the number of slots reaped.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let mut reaped = 0;
        for slot in &self.slots {
            let mut guard = slot.lock();
            if let Some(pending) = guard.as_ref() {
                if pending.deadline <= now {
                    *guard = None;
                    reaped += 1;
                }
            }
        }
        reaped
    }

    pub fn deadline_from_now(&self) -> Instant {
        Instant::now() + self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn sample_query(deadline: Instant) -> PendingQuery {
        PendingQuery {
            client_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5353),
            original_id: 0xbeef,
            name: "example.com".to_string(),
            qtype: RecordType::A,
            qclass: RecordClass::IN,
            deadline,
        }
    }

    #[test]
    fn allocate_and_take_round_trip() {
        let table = PendingTable::new(Duration::from_millis(250));
        let deadline = table.deadline_from_now();
        let id = table.allocate(sample_query(deadline)).expect("slot available");
        let taken = table.take(id).expect("slot occupied");
        assert_eq!(taken.original_id, 0xbeef);
        assert!(table.take(id).is_none());
    }

    #[test]
    fn concurrent_allocations_never_collide() {
        let table = PendingTable::new(Duration::from_millis(250));
        let deadline = table.deadline_from_now();
        let mut ids = std::collections::HashSet::new();
        for _ in 0..500 {
            let id = table.allocate(sample_query(deadline)).expect("slot available");
            assert!(ids.insert(id), "slot {id} allocated twice before release");
        }
    }

    #[test]
    fn sweeper_frees_expired_slots() {
        let table = PendingTable::new(Duration::from_millis(1));
        let past = Instant::now() - Duration::from_millis(10);
        let id = table.allocate(sample_query(past)).expect("slot available");
        let reaped = table.sweep_expired(Instant::now());
        assert!(reaped >= 1);
        assert!(table.take(id).is_none());
    }

    #[test]
    fn slot_reusable_after_sweep() {
        let table = PendingTable::new(Duration::from_millis(1));
        let past = Instant::now() - Duration::from_millis(10);
        let first = table.allocate(sample_query(past)).unwrap();
        table.sweep_expired(Instant::now());
        // force the cursor back so we re-probe the same region
        let future = table.deadline_from_now();
        let second = table.allocate(sample_query(future)).unwrap();
        assert!(table.take(second).is_some());
        let _ = first;
    }
}
