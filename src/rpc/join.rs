//! One-shot bootstrap join sequence.

use tracing::{debug, info, warn};

use crate::common::{Node, PeerInfo};
use crate::routing_table::RoutingTable;
use crate::rpc::Client;

/// Join the network through `bootstrap`, merging whatever peers it reports
/// into `table`.
///
/// Best-effort and not atomic: each step logs its failure and the protocol
/// simply stops advancing, leaving the table in whatever partial state it
/// reached. Only the initial ping is fatal to the remaining steps. Runs once
/// per node lifetime; there are no retries and no periodic refresh.
pub async fn join(client: &Client, bootstrap: &str, local: &Node, table: &RoutingTable) {
    info!(bootstrap, "joining network");

    // Step 1: learn the bootstrap node's own identity. Without it nothing
    // further is meaningful.
    let bootstrap_node = match client.ping(bootstrap).await {
        Ok(info) => match Node::try_from(info) {
            Ok(node) => node,
            Err(err) => {
                warn!(bootstrap, %err, "bootstrap sent an invalid identity");
                return;
            }
        },
        Err(err) => {
            warn!(bootstrap, %err, "failed to ping bootstrap node");
            return;
        }
    };
    debug!(id = %bootstrap_node.id, address = %bootstrap_node.address, "added bootstrap peer");
    table.add(bootstrap_node);

    // Step 2: merge the bootstrap node's peer list, skipping ourselves.
    match client.peers(bootstrap).await {
        Ok(peers) => {
            debug!(count = peers.len(), "fetched peers from bootstrap node");
            merge(table, local, peers);
        }
        Err(err) => warn!(bootstrap, %err, "failed to fetch peers from bootstrap"),
    }

    // Step 3: announce ourselves so the bootstrap node (and transitively its
    // peers) learn of us.
    match client.register(bootstrap, &PeerInfo::from(local)).await {
        Ok(status) => debug!(%status, "announced self to bootstrap node"),
        Err(err) => warn!(bootstrap, %err, "failed to announce self to bootstrap"),
    }

    // Step 4: one refresh lookup for the nodes closest to our own id.
    match client.find_node(bootstrap, &local.id.to_string()).await {
        Ok(found) => {
            debug!(count = found.len(), "find_node returned peers");
            merge(table, local, found);
        }
        Err(err) => warn!(bootstrap, %err, "failed to look up own id on bootstrap"),
    }

    info!(peers = table.len(), "join complete");
}

fn merge(table: &RoutingTable, local: &Node, peers: Vec<PeerInfo>) {
    let local_id = local.id.to_string();
    for info in peers {
        if info.node_id == local_id || info.address == local.address {
            continue;
        }
        match Node::try_from(info) {
            Ok(node) => {
                table.add(node);
            }
            Err(err) => warn!(%err, "skipping peer with invalid id"),
        }
    }
}
