//! A single node: identity, routing table, local store, and the decision
//! protocol that routes PUT/GET between them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, warn};

use crate::common::{
    key_from_content, key_from_name, GetResponse, Id, Node, PutRequest, PutResponse,
};
use crate::config::Config;
use crate::names::NameMap;
use crate::routing_table::RoutingTable;
use crate::rpc::{self, Client, Relayed};
use crate::store::Store;
use crate::{Error, Result};

#[derive(Debug)]
/// One node of the store.
///
/// Owns the routing table and the local store; all interaction with other
/// nodes goes through the wire, never shared memory. Requests either resolve
/// against the local store or are forwarded exactly one hop to the peer with
/// the smallest XOR distance to the key.
pub struct Dht {
    node: Node,
    table: RoutingTable,
    store: Store,
    names: NameMap,
    client: Client,
    bootstrap: Option<String>,
}

/// How a PUT resolved: stored on this node, or relayed from the closest peer.
#[derive(Debug)]
pub enum PutOutcome {
    Stored { key: String },
    Forwarded(Relayed),
}

/// How a GET resolved locally, or the closest peer's verbatim answer.
#[derive(Debug)]
pub enum GetOutcome {
    Found { key: String, value: Vec<u8> },
    Missing { key: String },
    Forwarded(Relayed),
}

impl Dht {
    /// Build a node from its configuration: derive the identity from the
    /// advertised address, seed the routing table with it, and load any
    /// existing snapshots.
    pub fn new(config: &Config) -> Result<Dht> {
        let node = Node::local(&config.listen);

        let table = RoutingTable::new();
        table.add(node.clone());

        let store = Store::open(
            config
                .storage_dir
                .join(format!("store_{}.json", node.id)),
        );
        let names = NameMap::open(
            config
                .storage_dir
                .join(format!("names_{}.json", node.id)),
        );
        let client = Client::new(config.request_timeout)?;

        Ok(Dht {
            node,
            table,
            store,
            names,
            client,
            bootstrap: config.bootstrap.clone(),
        })
    }

    // === Getters ===

    pub fn id(&self) -> &Id {
        &self.node.id
    }

    /// This node's own peer record.
    pub fn local_node(&self) -> &Node {
        &self.node
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Snapshot of every known peer, including this node.
    pub fn peers(&self) -> Vec<Node> {
        self.table.all()
    }

    // === Public Methods ===

    /// Run the bootstrap join sequence, if a bootstrap peer is configured.
    ///
    /// Intended to run once, before the node starts serving requests.
    pub async fn join(&self) {
        if let Some(bootstrap) = &self.bootstrap {
            rpc::join(&self.client, bootstrap, &self.node, &self.table).await;
        }
    }

    /// Insert a peer announced via `/register`.
    pub fn register(&self, node: Node) -> bool {
        self.table.add(node)
    }

    /// Up to 3 known peers closest to `target`, excluding this node.
    pub fn find_node(&self, target: &str) -> Vec<Node> {
        self.table.closest(target, 3, Some(&self.node.id))
    }

    /// Store a value under its key, or forward the request verbatim to the
    /// closest known peer.
    ///
    /// The key is the explicit `key` field if present, else derived from
    /// `name` (recording the name→key mapping first). This node stores the
    /// value itself when the table names no one closer than self.
    pub async fn put(&self, req: PutRequest) -> Result<PutOutcome> {
        let key = match (req.key.as_deref(), req.name.as_deref()) {
            (Some(key), _) if !key.is_empty() => key.to_string(),
            (_, Some(name)) if !name.is_empty() => {
                let key = key_from_name(name);
                // Recorded before the value is stored, even when the value
                // ends up on another node.
                if let Err(err) = self.names.set(name, &key) {
                    warn!(name, %err, "failed to persist name mapping");
                }
                key
            }
            _ => return Err(Error::BadInput("must provide 'key' or 'name'")),
        };

        let value = BASE64
            .decode(req.value.as_bytes())
            .map_err(|_| Error::BadInput("'value' is not valid base64"))?;

        match self.closest_other(&key) {
            None => {
                debug!(%key, "storing locally (self is closest)");
                self.store.put(&key, value)?;
                Ok(PutOutcome::Stored { key })
            }
            Some(peer) => {
                debug!(%key, peer = %peer.id, address = %peer.address, "forwarding put");
                let relayed = self.client.forward_put(&peer.address, &req).await?;
                Ok(PutOutcome::Forwarded(relayed))
            }
        }
    }

    /// Look a key (or name) up locally first; on a local miss, forward to
    /// the closest known peer.
    ///
    /// A value this node holds is never forwarded away, even if another
    /// peer is nominally closer. A name unknown to the local name map is an
    /// [Error::UnknownName] before any key lookup happens.
    pub async fn get(&self, key: Option<&str>, name: Option<&str>) -> Result<GetOutcome> {
        let key = match (key, name) {
            (Some(key), _) if !key.is_empty() => key.to_string(),
            (_, Some(name)) if !name.is_empty() => self
                .names
                .resolve(name)
                .ok_or_else(|| Error::UnknownName(name.to_string()))?,
            _ => return Err(Error::BadInput("must provide 'key' or 'name'")),
        };

        if let Some(value) = self.store.get(&key) {
            debug!(%key, "found locally");
            return Ok(GetOutcome::Found { key, value });
        }

        match self.closest_other(&key) {
            None => {
                debug!(%key, "not found locally and self is closest");
                Ok(GetOutcome::Missing { key })
            }
            Some(peer) => {
                debug!(%key, peer = %peer.id, address = %peer.address, "forwarding get");
                let relayed = self.client.forward_get(&peer.address, &key).await?;
                Ok(GetOutcome::Forwarded(relayed))
            }
        }
    }

    /// Content-addressed put: store `value` under the hash of its bytes,
    /// through the same routing decision as [Dht::put].
    pub async fn put_bytes(&self, value: &[u8]) -> Result<String> {
        let key = key_from_content(value);
        let req = PutRequest {
            key: Some(key),
            name: None,
            value: BASE64.encode(value),
        };

        match self.put(req).await? {
            PutOutcome::Stored { key } => Ok(key),
            PutOutcome::Forwarded(relayed) => {
                if !relayed.status.is_success() {
                    return Err(Error::RemoteStatus(relayed.status.as_u16()));
                }
                let resp: PutResponse = serde_json::from_slice(&relayed.body)
                    .map_err(|_| Error::MalformedResponse("put acknowledgment"))?;
                Ok(resp.key)
            }
        }
    }

    /// Fetch the bytes stored under `key`, decoding a relayed answer when
    /// the request was forwarded.
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.get(Some(key), None).await? {
            GetOutcome::Found { value, .. } => Ok(Some(value)),
            GetOutcome::Missing { .. } => Ok(None),
            GetOutcome::Forwarded(relayed) => {
                if !relayed.status.is_success() {
                    return Err(Error::RemoteStatus(relayed.status.as_u16()));
                }
                let resp: GetResponse = serde_json::from_slice(&relayed.body)
                    .map_err(|_| Error::MalformedResponse("get response"))?;
                if !resp.found {
                    return Ok(None);
                }
                let encoded = resp.value.unwrap_or_default();
                let value = BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|_| Error::MalformedResponse("value is not valid base64"))?;
                Ok(Some(value))
            }
        }
    }

    // === Private Methods ===

    /// The peer this node should delegate `key` to, or None when this node
    /// is authoritative (empty table, or self wins the distance ranking;
    /// self is eligible because it is seeded into its own table).
    fn closest_other(&self, key: &str) -> Option<Node> {
        self.table
            .closest(key, 1, None)
            .into_iter()
            .next()
            .filter(|peer| peer.id != self.node.id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::ID_SIZE;

    fn lone_node(dir: &std::path::Path) -> Dht {
        Dht::new(&Config {
            listen: "127.0.0.1:39001".to_string(),
            storage_dir: dir.to_path_buf(),
            ..Config::default()
        })
        .unwrap()
    }

    fn put_request(key: Option<&str>, name: Option<&str>, value: &[u8]) -> PutRequest {
        PutRequest {
            key: key.map(str::to_string),
            name: name.map(str::to_string),
            value: BASE64.encode(value),
        }
    }

    #[tokio::test]
    async fn lone_node_resolves_everything_locally() {
        let dir = tempfile::tempdir().unwrap();
        let dht = lone_node(dir.path());

        let outcome = dht
            .put(put_request(Some("deadbeef"), None, b"hello"))
            .await
            .unwrap();
        assert!(matches!(outcome, PutOutcome::Stored { ref key } if key == "deadbeef"));
        assert!(dht.store().contains("deadbeef"));

        match dht.get(Some("deadbeef"), None).await.unwrap() {
            GetOutcome::Found { value, .. } => assert_eq!(value, b"hello"),
            other => panic!("expected local hit, got {other:?}"),
        }

        assert!(matches!(
            dht.get(Some("no-such-key"), None).await.unwrap(),
            GetOutcome::Missing { .. }
        ));
    }

    #[tokio::test]
    async fn name_put_records_mapping_and_derives_key() {
        let dir = tempfile::tempdir().unwrap();
        let dht = lone_node(dir.path());

        let outcome = dht
            .put(put_request(None, Some("doc1"), b"hello"))
            .await
            .unwrap();
        let expected = key_from_name("doc1");
        assert!(matches!(outcome, PutOutcome::Stored { ref key } if *key == expected));

        match dht.get(None, Some("doc1")).await.unwrap() {
            GetOutcome::Found { key, value } => {
                assert_eq!(key, expected);
                assert_eq!(value, b"hello");
            }
            other => panic!("expected local hit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_name_is_its_own_error() {
        let dir = tempfile::tempdir().unwrap();
        let dht = lone_node(dir.path());

        assert!(matches!(
            dht.get(None, Some("nobody")).await,
            Err(Error::UnknownName(_))
        ));
    }

    #[tokio::test]
    async fn explicit_key_wins_over_name() {
        let dir = tempfile::tempdir().unwrap();
        let dht = lone_node(dir.path());

        let outcome = dht
            .put(put_request(Some("deadbeef"), Some("doc1"), b"hello"))
            .await
            .unwrap();
        assert!(matches!(outcome, PutOutcome::Stored { ref key } if key == "deadbeef"));

        // The ignored name was not recorded.
        assert!(matches!(
            dht.get(None, Some("doc1")).await,
            Err(Error::UnknownName(_))
        ));
    }

    #[tokio::test]
    async fn rejects_missing_selector_and_bad_base64() {
        let dir = tempfile::tempdir().unwrap();
        let dht = lone_node(dir.path());

        assert!(matches!(
            dht.put(put_request(None, None, b"hello")).await,
            Err(Error::BadInput(_))
        ));
        assert!(matches!(
            dht.get(None, None).await,
            Err(Error::BadInput(_))
        ));

        let req = PutRequest {
            key: Some("deadbeef".to_string()),
            name: None,
            value: "not base64!!!".to_string(),
        };
        assert!(matches!(dht.put(req).await, Err(Error::BadInput(_))));
    }

    #[tokio::test]
    async fn unreachable_closest_peer_is_a_forward_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dht = lone_node(dir.path());

        // A peer at distance 0 from the key it is registered under, with an
        // address nothing listens on.
        let dead = Node::new(Id([0xab; ID_SIZE]), "127.0.0.1:1");
        dht.register(dead.clone());

        let key = dead.id.to_string();
        assert!(matches!(
            dht.put(put_request(Some(&key), None, b"hello")).await,
            Err(Error::Forward { .. })
        ));
        assert!(!dht.store().contains(&key));

        assert!(matches!(
            dht.get(Some(&key), None).await,
            Err(Error::Forward { .. })
        ));
    }

    #[tokio::test]
    async fn local_first_get_beats_a_closer_peer() {
        let dir = tempfile::tempdir().unwrap();
        let dht = lone_node(dir.path());

        dht.put(put_request(Some("deadbeef"), None, b"mine"))
            .await
            .unwrap();

        // A peer strictly closer to the key than this node, and unreachable:
        // a GET must still answer from the local store without forwarding.
        let closer = Node::new(Id([0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 0]), "127.0.0.1:1");
        dht.register(closer);

        match dht.get(Some("deadbeef"), None).await.unwrap() {
            GetOutcome::Found { value, .. } => assert_eq!(value, b"mine"),
            other => panic!("expected local hit, got {other:?}"),
        }
    }
}
