//! HTTP surface of a node.
//!
//! Thin axum wiring over [Dht]: handlers decode and validate at the
//! boundary, the routing decisions live in [crate::dht].

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::common::{GetResponse, Node, PeerInfo, PutRequest, PutResponse};
use crate::dht::{Dht, GetOutcome, PutOutcome};
use crate::rpc::Relayed;
use crate::Error;

/// The node's HTTP router.
pub fn app(dht: Arc<Dht>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/peers", get(peers))
        .route("/register", post(register))
        .route("/find_node", get(find_node))
        .route("/put", post(put))
        .route("/get", get(get_value))
        .layer(TraceLayer::new_for_http())
        .with_state(dht)
}

/// Serve the node on an already-bound listener until the process exits.
pub async fn serve(listener: TcpListener, dht: Arc<Dht>) -> std::io::Result<()> {
    axum::serve(listener, app(dht)).await
}

async fn ping(State(dht): State<Arc<Dht>>) -> Json<PeerInfo> {
    Json(PeerInfo::from(dht.local_node()))
}

async fn peers(State(dht): State<Arc<Dht>>) -> Json<Vec<PeerInfo>> {
    Json(dht.peers().iter().map(PeerInfo::from).collect())
}

async fn register(
    State(dht): State<Arc<Dht>>,
    payload: Result<Json<PeerInfo>, JsonRejection>,
) -> StatusCode {
    let Ok(Json(info)) = payload else {
        return StatusCode::BAD_REQUEST;
    };

    match Node::try_from(info) {
        Ok(node) => {
            dht.register(node);
            StatusCode::OK
        }
        Err(err) => {
            warn!(%err, "rejecting register request");
            StatusCode::BAD_REQUEST
        }
    }
}

#[derive(Debug, Deserialize)]
struct FindNodeParams {
    target: Option<String>,
}

async fn find_node(
    State(dht): State<Arc<Dht>>,
    Query(params): Query<FindNodeParams>,
) -> Response {
    match params.target.as_deref() {
        Some(target) if !target.is_empty() => {
            let closest: Vec<PeerInfo> = dht.find_node(target).iter().map(PeerInfo::from).collect();
            Json(closest).into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn put(
    State(dht): State<Arc<Dht>>,
    payload: Result<Json<PutRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = payload else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    match dht.put(req).await {
        Ok(PutOutcome::Stored { key }) => Json(PutResponse { key }).into_response(),
        Ok(PutOutcome::Forwarded(relayed)) => relay(relayed),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct GetParams {
    key: Option<String>,
    name: Option<String>,
}

async fn get_value(State(dht): State<Arc<Dht>>, Query(params): Query<GetParams>) -> Response {
    match dht.get(params.key.as_deref(), params.name.as_deref()).await {
        Ok(GetOutcome::Found { key, value }) => Json(GetResponse {
            key,
            value: Some(BASE64.encode(value)),
            found: true,
        })
        .into_response(),
        Ok(GetOutcome::Missing { key }) => Json(GetResponse {
            key,
            value: None,
            found: false,
        })
        .into_response(),
        Ok(GetOutcome::Forwarded(relayed)) => relay(relayed),
        Err(err) => error_response(err),
    }
}

/// Reproduce a peer's response byte-for-byte.
fn relay(relayed: Relayed) -> Response {
    (
        relayed.status,
        [(header::CONTENT_TYPE, "application/json")],
        relayed.body,
    )
        .into_response()
}

fn error_response(err: Error) -> Response {
    let status = match &err {
        Error::BadInput(_) | Error::InvalidId(_) => StatusCode::BAD_REQUEST,
        Error::UnknownName(_) => StatusCode::NOT_FOUND,
        Error::Forward { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        warn!(%err, "request failed");
    }

    (status, err.to_string()).into_response()
}
