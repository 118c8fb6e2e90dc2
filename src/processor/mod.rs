//! Channel Processors (C4, §4.3/§4.4). Each processor normalizes one
//! transport's payload into an `InputEvent`/domain vector, runs it past an
//! allow/deny policy, and — when the policy doesn't short-circuit — submits
//! it to the AI Community Client for a consensus verdict.
//!
//! The trait shape and the `dyn-clone`d trait-object registry are carried
//! over from the teacher's `Processor` trait
//! (`processor::mod::Processor`/`ProcessorRegistry`), generalized from
//! MQTT-message processors to webhook-tag processors.

pub mod discord;
pub mod esmtp;
pub mod identifier;
pub mod io_bus;
pub mod irc;
pub mod review;
pub mod sdcard;
pub mod sms;
pub mod threat_analysis;
pub mod threshold;
pub mod voice;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dyn_clone::DynClone;
use thiserror::Error;

use crate::model::{WebhookRequest, WebhookResponse};

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("no processor registered for tag '{0}'")]
    NotFound(String),
    #[error("processor '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// A single channel's webhook handler. `tag()` identifies the route segment
/// it answers (`POST /webhook/{tag}`); `process_webhook` does the
/// normalize → policy → review pipeline and never panics on malformed input
/// — it downgrades to a rejecting `WebhookResponse` instead (§7).
#[async_trait]
pub trait Processor: DynClone + Send + Sync {
    fn tag(&self) -> &str;

    fn description(&self) -> &str;

    async fn process_webhook(&self, request: WebhookRequest) -> WebhookResponse;
}

dyn_clone::clone_trait_object!(Processor);

/// Concurrent, single-writer-friendly registry (§4.1/§5): readers never
/// block behind a writer that's registering or unregistering a handler.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: Arc<DashMap<String, Arc<dyn Processor>>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, processor: Arc<dyn Processor>) -> Result<(), ProcessorError> {
        let tag = processor.tag().to_string();
        if self.processors.contains_key(&tag) {
            return Err(ProcessorError::AlreadyRegistered(tag));
        }
        self.processors.insert(tag, processor);
        Ok(())
    }

    pub fn unregister(&self, tag: &str) -> Result<(), ProcessorError> {
        self.processors
            .remove(tag)
            .map(|_| ())
            .ok_or_else(|| ProcessorError::NotFound(tag.to_string()))
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn Processor>> {
        self.processors.get(tag).map(|entry| entry.value().clone())
    }

    pub fn registered_tags(&self) -> Vec<String> {
        self.processors.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Tag -> description map exposed by the bus's `/status` route.
    pub fn registered_descriptions(&self) -> std::collections::HashMap<String, String> {
        self.processors
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().description().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct EchoProcessor;

    #[async_trait]
    impl Processor for EchoProcessor {
        fn tag(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "echoes back success"
        }

        async fn process_webhook(&self, request: WebhookRequest) -> WebhookResponse {
            WebhookResponse::ok(request.id, "echoed")
        }
    }

    #[test]
    fn register_then_lookup_round_trips() {
        let registry = ProcessorRegistry::new();
        registry.register(Arc::new(EchoProcessor)).unwrap();
        assert!(registry.get("echo").is_some());
        assert_eq!(registry.registered_tags(), vec!["echo".to_string()]);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = ProcessorRegistry::new();
        registry.register(Arc::new(EchoProcessor)).unwrap();
        let err = registry.register(Arc::new(EchoProcessor)).unwrap_err();
        assert!(matches!(err, ProcessorError::AlreadyRegistered(_)));
    }

    #[test]
    fn unregister_missing_tag_fails() {
        let registry = ProcessorRegistry::new();
        let err = registry.unregister("ghost").unwrap_err();
        assert!(matches!(err, ProcessorError::NotFound(_)));
    }

    #[test]
    fn registered_descriptions_maps_tag_to_description() {
        let registry = ProcessorRegistry::new();
        registry.register(Arc::new(EchoProcessor)).unwrap();
        let descriptions = registry.registered_descriptions();
        assert_eq!(descriptions.get("echo").map(String::as_str), Some("echoes back success"));
    }
}
