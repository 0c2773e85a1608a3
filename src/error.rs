//! Main Crate Error

#[derive(thiserror::Error, Debug)]
/// Kadstore crate error enum.
pub enum Error {
    /// Malformed or missing request fields, rejected before any routing.
    #[error("bad request: {0}")]
    BadInput(&'static str),

    /// A name that has no entry in the local name map.
    #[error("unknown name: {0}")]
    UnknownName(String),

    /// The one-hop forward to a peer failed or timed out.
    ///
    /// Surfaced distinctly from a missing key so callers can tell a broken
    /// network path apart from "not found".
    #[error("request to {address} failed: {source}")]
    Forward {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    /// A forwarded request reached the peer but came back with a failure status.
    #[error("peer responded with status {0}")]
    RemoteStatus(u16),

    /// A peer answered with a body this client could not decode.
    #[error("malformed response from peer: {0}")]
    MalformedResponse(&'static str),

    /// A node id that is not exactly [crate::ID_SIZE] bytes of hex.
    #[error("invalid node id: {0:?}")]
    InvalidId(String),

    #[error(transparent)]
    /// Transparent [std::io::Error], typically a failed snapshot write.
    IO(#[from] std::io::Error),

    #[error("failed to encode snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error(transparent)]
    /// Failure constructing the outbound HTTP client.
    HttpClient(#[from] reqwest::Error),
}
