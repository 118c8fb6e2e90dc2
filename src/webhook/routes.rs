use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use serde_json::json;
use warp::Filter;

use crate::config::BusConfig;
use crate::ids;
use crate::model::WebhookRequest;
use crate::processor::ProcessorRegistry;
use crate::webhook::{handle_rejection, BusError};

const REQUEST_DEADLINE: Duration = Duration::from_secs(30);

pub fn build(
    registry: ProcessorRegistry,
    config: BusConfig,
    _started_at_nanos: u128,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    let cors = build_cors(&config.allowed_origins);

    let webhook_tag = warp::path("webhook").and(warp::path::param::<String>()).and(warp::path::end());

    let webhook = webhook_tag
        .and(warp::post())
        .and(warp::header::headers_cloned())
        .and(warp::body::content_length_limit(config.max_request_size as u64))
        .and(warp::body::json())
        .and(with_registry(registry.clone()))
        .and_then(handle_webhook);

    let webhook_missing_tag = warp::path("webhook").and(warp::path::end()).and_then(missing_tag);

    let registry_for_health = registry.clone();
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(move || {
            warp::reply::json(&json!({
                "status": "healthy",
                "timestamp": chrono::Utc::now(),
                "processors": registry_for_health.registered_tags().len(),
            }))
        });

    let registry_for_status = registry.clone();
    let config_for_status = config.clone();
    let status = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .map(move || {
            warp::reply::json(&json!({
                "webhook_manager": "running",
                "processors": registry_for_status.registered_descriptions(),
                "config": {
                    "host": config_for_status.host,
                    "port": config_for_status.port,
                    "max_request_size": config_for_status.max_request_size,
                },
                "timestamp": chrono::Utc::now(),
            }))
        });

    webhook
        .or(webhook_missing_tag)
        .or(health)
        .or(status)
        .with(cors)
        .recover(handle_rejection)
}

async fn missing_tag() -> Result<warp::reply::Json, warp::Rejection> {
    Err(warp::reject::custom(BusError::MissingTag))
}

fn build_cors(allowed_origins: &[String]) -> warp::cors::Builder {
    let cors = warp::cors()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type", "authorization"]);

    if allowed_origins.is_empty() {
        cors.allow_any_origin()
    } else {
        let origins: Vec<&str> = allowed_origins.iter().map(String::as_str).collect();
        cors.allow_origins(origins)
    }
}

fn with_registry(
    registry: ProcessorRegistry,
) -> impl Filter<Extract = (ProcessorRegistry,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || registry.clone())
}

async fn handle_webhook(
    tag: String,
    headers: warp::http::HeaderMap,
    body: serde_json::Value,
    registry: ProcessorRegistry,
) -> Result<impl warp::Reply, warp::Rejection> {
    let Some(processor) = registry.get(&tag) else {
        return Err(warp::reject::custom(BusError::UnknownTag(tag)));
    };

    let mut header_map = HashMap::new();
    for (name, value) in headers.iter() {
        if let Ok(value) = value.to_str() {
            header_map.insert(name.as_str().to_string(), value.to_string());
        }
    }

    let request_id = ids::request_id();
    let request = WebhookRequest::new(request_id.clone(), tag.clone(), tag, header_map, body);

    // Handler panics must not crash the bus (§7): catch them and downgrade to a 500-equivalent
    // error response, the way the teacher's dispatch loop guards against a misbehaving processor.
    let handler = AssertUnwindSafe(processor.process_webhook(request)).catch_unwind();

    let response = match tokio::time::timeout(REQUEST_DEADLINE, handler).await {
        Ok(Ok(response)) => response,
        Ok(Err(_panic)) => crate::model::WebhookResponse::err(request_id, "processor handler panicked"),
        Err(_) => crate::model::WebhookResponse::err(request_id, "processor did not respond within the request deadline"),
    };

    Ok(warp::reply::json(&response))
}
