//! Flat routing table of known peers, ranked by XOR distance on demand.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::common::{target_bytes, Id, Node};

#[derive(Debug, Clone, Default)]
/// Concurrent map of known peers, keyed by [Id].
///
/// Entries are never pruned: there is no eviction, TTL, or liveness check.
/// Cloning shares the same underlying table.
pub struct RoutingTable {
    peers: Arc<RwLock<HashMap<Id, Node>>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    // === Public Methods ===

    /// Insert or overwrite a peer by its id, last write wins.
    ///
    /// A node with an empty address is ignored. Returns `true` if the id was
    /// not previously known.
    pub fn add(&self, node: Node) -> bool {
        if node.address.is_empty() {
            return false;
        }

        let mut peers = self.peers.write();
        let new = !peers.contains_key(&node.id);
        if new {
            debug!(id = %node.id, address = %node.address, "discovered new peer");
        } else {
            debug!(id = %node.id, address = %node.address, "peer already known");
        }
        peers.insert(node.id, node);

        new
    }

    /// A snapshot of the current entries. Enumeration order is unspecified.
    pub fn all(&self) -> Vec<Node> {
        self.peers.read().values().cloned().collect()
    }

    /// Up to `k` peers closest to `target` by XOR distance, ascending,
    /// excluding the peer whose id equals `exclude`.
    ///
    /// Ties are broken arbitrarily. If fewer than `k` eligible peers exist,
    /// all of them are returned.
    pub fn closest(&self, target: &str, k: usize, exclude: Option<&Id>) -> Vec<Node> {
        let target = target_bytes(target);

        let mut peers: Vec<Node> = self
            .peers
            .read()
            .values()
            .filter(|node| exclude != Some(&node.id))
            .cloned()
            .collect();

        peers.sort_by_key(|node| node.id.distance_to(&target));
        peers.truncate(k);
        peers
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::ID_SIZE;

    #[test]
    fn add_is_idempotent() {
        let table = RoutingTable::new();
        let node = Node::random();

        assert!(table.add(node.clone()));
        assert!(!table.add(node.clone()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn add_ignores_empty_address() {
        let table = RoutingTable::new();
        assert!(!table.add(Node::new(Id::random(), "")));
        assert!(table.is_empty());
    }

    #[test]
    fn readdressing_a_peer_overwrites() {
        let table = RoutingTable::new();
        let node = Node::random();

        table.add(node.clone());
        table.add(Node::new(node.id, "127.0.0.1:7777"));

        let all = table.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].address, "127.0.0.1:7777");
    }

    #[test]
    fn closest_orders_by_distance_and_caps_at_k() {
        let table = RoutingTable::new();
        // Ids chosen so distance to an all-zero target is their own value.
        for byte in [0x10u8, 0x01, 0xf0, 0x08] {
            let mut bytes = [0u8; ID_SIZE];
            bytes[0] = byte;
            table.add(Node::new(Id(bytes), format!("127.0.0.1:{byte}")));
        }

        let target = "00".repeat(ID_SIZE);
        let closest = table.closest(&target, 3, None);

        assert_eq!(closest.len(), 3);
        let first = [closest[0].id.0[0], closest[1].id.0[0], closest[2].id.0[0]];
        assert_eq!(first, [0x01, 0x08, 0x10]);

        let distances: Vec<u64> = table
            .closest(&target, 10, None)
            .iter()
            .map(|n| n.id.distance_to(&target_bytes(&target)))
            .collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn closest_excludes_the_given_id() {
        let table = RoutingTable::new();
        let a = Node::random();
        let b = Node::random();
        table.add(a.clone());
        table.add(b.clone());

        let closest = table.closest(&a.id.to_string(), 10, Some(&a.id));
        assert_eq!(closest.len(), 1);
        assert_eq!(closest[0].id, b.id);
    }
}
