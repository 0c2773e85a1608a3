//! Struct and implementation of the Node entry in the routing table.

use crate::common::Id;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A peer reachable over the network: an [Id] plus the address it advertises.
///
/// Identity for routing-table purposes is `id` alone; the address of a
/// re-registered id is overwritten, last write wins.
pub struct Node {
    pub id: Id,
    pub address: String,
}

impl Node {
    /// Creates a new Node from an id and a dialable `host:port` address.
    pub fn new(id: Id, address: impl Into<String>) -> Node {
        Node {
            id,
            address: address.into(),
        }
    }

    /// The Node a process listening on `listen` advertises to its peers.
    ///
    /// The id is derived from the advertised (normalized) address, so peers
    /// can always recompute it from the address they dial.
    pub fn local(listen: &str) -> Node {
        let address = advertised_address(listen);
        Node {
            id: Id::from_address(&address),
            address,
        }
    }

    #[cfg(test)]
    pub(crate) fn random() -> Node {
        let id = Id::random();
        Node::new(id, format!("127.0.0.1:{}", 1024 + (id.0[0] as u16)))
    }
}

/// Normalize a listen address into one other nodes can dial: a bare
/// `:port` advertises the loopback interface.
pub fn advertised_address(listen: &str) -> String {
    if listen.starts_with(':') {
        format!("127.0.0.1{listen}")
    } else {
        listen.to_string()
    }
}
