//! JSON bodies exchanged over the HTTP surface.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{Id, Node};
use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A peer record on the wire: `/ping`, `/peers`, `/register`, `/find_node`.
pub struct PeerInfo {
    pub node_id: String,
    pub address: String,
}

impl From<&Node> for PeerInfo {
    fn from(node: &Node) -> PeerInfo {
        PeerInfo {
            node_id: node.id.to_string(),
            address: node.address.clone(),
        }
    }
}

impl TryFrom<PeerInfo> for Node {
    type Error = Error;

    fn try_from(info: PeerInfo) -> Result<Node, Error> {
        let id = Id::from_str(&info.node_id)?;
        Ok(Node::new(id, info.address))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Body of `POST /put`. One of `key` or `name` must be set; `value` is
/// base64-encoded bytes.
pub struct PutRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Body of a successful `POST /put`: the key the value was stored under.
pub struct PutResponse {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Body of `GET /get`. `value` is present (base64) iff `found` is true.
pub struct GetResponse {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub found: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn peer_info_round_trip() {
        let node = Node::random();
        let info = PeerInfo::from(&node);
        assert_eq!(Node::try_from(info).unwrap(), node);
    }

    #[test]
    fn rejects_malformed_node_id() {
        let info = PeerInfo {
            node_id: "".to_string(),
            address: "127.0.0.1:9".to_string(),
        };
        assert!(Node::try_from(info).is_err());
    }

    #[test]
    fn put_request_tolerates_missing_fields() {
        let req: PutRequest = serde_json::from_str(r#"{"name":"doc1"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("doc1"));
        assert_eq!(req.key, None);
        assert_eq!(req.value, "");
    }

    #[test]
    fn get_response_omits_absent_value() {
        let resp = GetResponse {
            key: "ab".to_string(),
            value: None,
            found: false,
        };
        let encoded = serde_json::to_string(&resp).unwrap();
        assert_eq!(encoded, r#"{"key":"ab","found":false}"#);
    }
}
