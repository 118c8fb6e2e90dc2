//! The Webhook Bus (C6, §4.1). A `warp` HTTP front end that dispatches
//! `POST /webhook/{tag}` to whichever processor registered that tag, plus
//! `/health` and `/status` introspection routes. Grounded on the teacher's
//! `service::restful` module — CORS setup, rejection-to-JSON mapping, and
//! the listener spawn/shutdown-signal shape are carried over; the routing
//! table itself is new.

pub mod error;
mod routes;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::info;

pub use error::BusError;

use crate::config::BusConfig;
use crate::processor::{Processor, ProcessorRegistry};
use crate::util::time::now_unix_nanos;

/// Owns the processor registry and the warp listener's lifecycle. `start`
/// may only be called once per instance; a second call returns
/// `BusError::AlreadyRunning` rather than silently rebinding.
pub struct Bus {
    config: BusConfig,
    registry: ProcessorRegistry,
    running: AtomicBool,
    shutdown_tx: std::sync::Mutex<Option<oneshot::Sender<()>>>,
    started_at_nanos: std::sync::Mutex<Option<u128>>,
}

impl Bus {
    pub fn new(config: BusConfig) -> Self {
        Self {
            config,
            registry: ProcessorRegistry::new(),
            running: AtomicBool::new(false),
            shutdown_tx: std::sync::Mutex::new(None),
            started_at_nanos: std::sync::Mutex::new(None),
        }
    }

    pub fn register_processor(&self, processor: Arc<dyn Processor>) -> Result<(), BusError> {
        self.registry
            .register(processor)
            .map_err(|e| BusError::UnknownTag(e.to_string()))
    }

    pub fn unregister_processor(&self, tag: &str) -> Result<(), BusError> {
        self.registry.unregister(tag).map_err(|_| BusError::UnknownTag(tag.to_string()))
    }

    pub fn registered_processors(&self) -> Vec<String> {
        self.registry.registered_tags()
    }

    /// Binds the configured address and serves until `stop()` is called.
    /// Returns once the listener is bound; serving happens on a spawned
    /// task, matching the teacher's fire-and-forget listener spawn.
    pub async fn start(&self) -> Result<(), BusError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(BusError::AlreadyRunning);
        }

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| BusError::Bind(([0, 0, 0, 0], self.config.port).into(), std::io::Error::other("invalid bind address")))?;

        let routes = routes::build(self.registry.clone(), self.config.clone(), started_at_snapshot(&self.started_at_nanos));
        let (tx, rx) = oneshot::channel();
        *self.shutdown_tx.lock().unwrap() = Some(tx);
        *self.started_at_nanos.lock().unwrap() = Some(now_unix_nanos());

        let server = warp::serve(routes).bind(addr).await.graceful(async {
            rx.await.ok();
        });

        info!(%addr, "webhook bus listening");
        tokio::spawn(server.run());
        Ok(())
    }

    pub fn stop(&self) -> Result<(), BusError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(BusError::NotRunning);
        }
        if let Some(tx) = self.shutdown_tx.lock().unwrap().take() {
            let _ = tx.send(());
        }
        Ok(())
    }
}

fn started_at_snapshot(started_at: &std::sync::Mutex<Option<u128>>) -> u128 {
    started_at.lock().unwrap().unwrap_or_else(now_unix_nanos)
}

pub(crate) fn json_rejection(err: &BusError) -> (http::StatusCode, serde_json::Value) {
    use http::StatusCode;
    let status = match err {
        BusError::UnknownTag(_) => StatusCode::NOT_FOUND,
        BusError::PayloadTooLarge => StatusCode::BAD_REQUEST,
        BusError::MissingTag => StatusCode::BAD_REQUEST,
        BusError::AlreadyRunning | BusError::NotRunning | BusError::Bind(..) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, serde_json::json!({"success": false, "message": err.to_string()}))
}

pub(crate) async fn handle_rejection(err: warp::Rejection) -> Result<impl warp::Reply, Infallible> {
    use warp::http::StatusCode;

    let (status, body) = if let Some(bus_err) = err.find::<BusError>() {
        json_rejection(bus_err)
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, serde_json::json!({"success": false, "message": "invalid request body"}))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, serde_json::json!({"success": false, "message": "method not allowed"}))
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, serde_json::json!({"success": false, "message": "route not found"}))
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({"success": false, "message": "internal error"}))
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
