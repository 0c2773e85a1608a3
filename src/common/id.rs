//! Node identifiers, lookup targets, and the XOR distance between them.

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use rand::Rng;
use sha1_smol::Sha1;

use crate::{Error, Result};

/// The size of node IDs in bytes.
pub const ID_SIZE: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A node Id: the first [ID_SIZE] bytes of the SHA-1 of the node's
/// advertised address, presented as lowercase hex.
pub struct Id(pub [u8; ID_SIZE]);

impl Id {
    /// Derive the Id for a node reachable at `address`.
    ///
    /// Deterministic for the same address. Collisions are not defended
    /// against.
    pub fn from_address(address: &str) -> Id {
        let mut hasher = Sha1::new();
        hasher.update(address.as_bytes());
        let digest = hasher.digest().bytes();

        let mut bytes = [0u8; ID_SIZE];
        bytes.copy_from_slice(&digest[..ID_SIZE]);

        Id(bytes)
    }

    pub fn random() -> Id {
        let mut rng = rand::thread_rng();
        Id(rng.gen())
    }

    /// Simplified XOR distance between this Id and another.
    ///
    /// Distance to self is 0, and `a.distance(b) == b.distance(a)`.
    pub fn distance(&self, other: &Id) -> u64 {
        self.distance_to(&other.0)
    }

    /// XOR distance between this Id and a raw lookup target.
    ///
    /// Folds the XOR of the common prefix (at most [ID_SIZE] bytes) into a
    /// big-endian u64. A target shorter than [ID_SIZE] bytes compares only
    /// that many bytes, so information past the shorter input is lost.
    pub fn distance_to(&self, target: &[u8]) -> u64 {
        let mut distance = 0u64;
        for (a, b) in self.0.iter().zip(target.iter().take(ID_SIZE)) {
            distance = (distance << 8) | u64::from(a ^ b);
        }
        distance
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Id> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidId(s.to_string()))?;
        if bytes.len() != ID_SIZE {
            return Err(Error::InvalidId(s.to_string()));
        }

        let mut tmp = [0u8; ID_SIZE];
        tmp.copy_from_slice(&bytes);

        Ok(Id(tmp))
    }
}

/// Derive the storage key for a human-readable name: the full SHA-1 of the
/// name, hex-encoded.
pub fn key_from_name(name: &str) -> String {
    sha1_hex(name.as_bytes())
}

/// Derive the storage key for raw content: the full SHA-1 of the bytes,
/// hex-encoded.
pub fn key_from_content(content: &[u8]) -> String {
    sha1_hex(content)
}

fn sha1_hex(input: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input);
    hex::encode(hasher.digest().bytes())
}

/// Decode a lookup target (a key or an id in hex) into raw bytes for
/// distance comparison.
///
/// Decoding is lenient: hex pairs are consumed from the front, stopping at
/// the first malformed pair, capped at [ID_SIZE] bytes. A target that does
/// not start with valid hex therefore compares zero bytes and sits at
/// distance 0 from every peer.
pub(crate) fn target_bytes(target: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(ID_SIZE);
    for pair in target.as_bytes().chunks_exact(2).take(ID_SIZE) {
        match (hex_val(pair[0]), hex_val(pair[1])) {
            (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
            _ => break,
        }
    }
    out
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
