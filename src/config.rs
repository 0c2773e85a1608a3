use std::path::PathBuf;
use std::time::Duration;

/// Timeout for a single outbound call to a peer.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
/// Node configurations
pub struct Config {
    /// Address to listen on, `host:port` or bare `:port`.
    ///
    /// A bare `:port` binds every interface and advertises the loopback
    /// address to peers.
    pub listen: String,
    /// Bootstrap peer address to join through at startup.
    ///
    /// Defaults to None: the node starts alone and waits to be discovered.
    pub bootstrap: Option<String>,
    /// Directory holding the two per-node snapshot files (the value store
    /// and the name map).
    pub storage_dir: PathBuf,
    /// Outbound HTTP request timeout.
    ///
    /// Bounds how long a forwarded PUT/GET can stall on an unreachable
    /// peer; a timeout is reported the same way as a connection failure.
    ///
    /// Defaults to [DEFAULT_REQUEST_TIMEOUT].
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ":8080".to_string(),
            bootstrap: None,
            storage_dir: PathBuf::from("."),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
