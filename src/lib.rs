#![doc = include_str!("../README.md")]

mod common;
mod config;
mod dht;
mod error;
mod names;
mod routing_table;
mod store;

pub mod rpc;
pub mod server;

pub use crate::common::{key_from_content, key_from_name, Id, Node, ID_SIZE};
pub use crate::common::{GetResponse, PeerInfo, PutRequest, PutResponse};
pub use crate::config::{Config, DEFAULT_REQUEST_TIMEOUT};
pub use crate::dht::{Dht, GetOutcome, PutOutcome};
pub use crate::error::Error;
pub use crate::names::NameMap;
pub use crate::routing_table::RoutingTable;
pub use crate::store::Store;

/// Alias for the Result used through the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
