//! Outbound HTTP calls to other nodes.

mod join;

pub use join::join;

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;

use crate::common::{PeerInfo, PutRequest};
use crate::{Error, Result};

#[derive(Debug, Clone)]
/// HTTP client for the peer-to-peer surface, with a bounded per-request
/// timeout so one unreachable peer cannot stall a request indefinitely.
pub struct Client {
    http: reqwest::Client,
}

/// A peer's response, relayed byte-for-byte back to the original caller.
#[derive(Debug, Clone)]
pub struct Relayed {
    pub status: StatusCode,
    pub body: Bytes,
}

impl Client {
    pub fn new(timeout: Duration) -> Result<Client> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Client { http })
    }

    /// `GET /ping`: the peer's own identity record.
    pub async fn ping(&self, address: &str) -> Result<PeerInfo> {
        self.http
            .get(format!("http://{address}/ping"))
            .send()
            .await
            .map_err(|source| forward_error(address, source))?
            .json()
            .await
            .map_err(|source| forward_error(address, source))
    }

    /// `GET /peers`: the peer's full routing-table snapshot.
    pub async fn peers(&self, address: &str) -> Result<Vec<PeerInfo>> {
        self.http
            .get(format!("http://{address}/peers"))
            .send()
            .await
            .map_err(|source| forward_error(address, source))?
            .json()
            .await
            .map_err(|source| forward_error(address, source))
    }

    /// `POST /register`: announce a peer record. Returns the peer's status.
    pub async fn register(&self, address: &str, info: &PeerInfo) -> Result<StatusCode> {
        let resp = self
            .http
            .post(format!("http://{address}/register"))
            .json(info)
            .send()
            .await
            .map_err(|source| forward_error(address, source))?;
        Ok(resp.status())
    }

    /// `GET /find_node?target=..`: up to 3 peers the remote node knows
    /// closest to `target`.
    pub async fn find_node(&self, address: &str, target: &str) -> Result<Vec<PeerInfo>> {
        self.http
            .get(format!("http://{address}/find_node"))
            .query(&[("target", target)])
            .send()
            .await
            .map_err(|source| forward_error(address, source))?
            .json()
            .await
            .map_err(|source| forward_error(address, source))
    }

    /// Forward a PUT verbatim to the peer believed closest to its key.
    pub async fn forward_put(&self, address: &str, req: &PutRequest) -> Result<Relayed> {
        let resp = self
            .http
            .post(format!("http://{address}/put"))
            .json(req)
            .send()
            .await
            .map_err(|source| forward_error(address, source))?;

        relayed(address, resp).await
    }

    /// Forward a GET (by resolved key) to the peer believed closest to it.
    pub async fn forward_get(&self, address: &str, key: &str) -> Result<Relayed> {
        let resp = self
            .http
            .get(format!("http://{address}/get"))
            .query(&[("key", key)])
            .send()
            .await
            .map_err(|source| forward_error(address, source))?;

        relayed(address, resp).await
    }
}

async fn relayed(address: &str, resp: reqwest::Response) -> Result<Relayed> {
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|source| forward_error(address, source))?;

    Ok(Relayed { status, body })
}

fn forward_error(address: &str, source: reqwest::Error) -> Error {
    Error::Forward {
        address: address.to_string(),
        source,
    }
}
