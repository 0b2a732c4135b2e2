use std::collections::{HashSet, VecDeque};

use ledger_core::TxHash;

/// A bounded "recently relayed" set, addressing the design notes' gossip
/// dedup recommendation: the source relays and re-saves a transaction
/// every time it is offered, even by the same peer twice (§9 OQ5). This
/// cache lets the network layer short-circuit a repeat relay without
/// pretending duplicate handling is fully specified — it only covers the
/// last `capacity` hashes seen, so an old duplicate can still slip through.
pub struct SeenCache {
    capacity: usize,
    order: VecDeque<TxHash>,
    set: HashSet<TxHash>,
}

impl SeenCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            set: HashSet::with_capacity(capacity),
        }
    }

    /// Records `hash` as seen and returns `true` if it was already present.
    pub fn check_and_insert(&mut self, hash: TxHash) -> bool {
        if self.set.contains(&hash) {
            return true;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.set.remove(&oldest);
            }
        }
        self.order.push_back(hash);
        self.set.insert(hash);
        false
    }
}
