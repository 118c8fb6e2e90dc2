//! Map-value coercers (C2).
//!
//! Channel processors receive a `WebhookRequest.body` as an opaque decoded
//! JSON tree. Per the design notes, we never leak `serde_json::Map` through
//! the processor interface directly; instead every processor goes through
//! this small façade, the same shape as the teacher's `MetadataValue`
//! tagged union (`processor::message::MetadataValue`), but addressed by
//! JSON path instead of a flat metadata map.

use serde_json::Value as Json;

/// A thin wrapper around a decoded JSON body with typed-coercion helpers.
#[derive(Debug, Clone)]
pub struct Coercer<'a> {
    root: &'a Json,
}

impl<'a> Coercer<'a> {
    pub fn new(root: &'a Json) -> Self {
        Self { root }
    }

    fn get(&self, key: &str) -> Option<&'a Json> {
        self.root.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Json::as_str)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.str(key).map(str::to_owned)
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Json::as_bool)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.bool(key).unwrap_or(default)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Json::as_i64)
    }

    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.int(key).unwrap_or(default)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Json::as_f64)
    }

    pub fn float_or(&self, key: &str, default: f64) -> f64 {
        self.float(key).unwrap_or(default)
    }

    pub fn array(&self, key: &str) -> Option<&'a Vec<Json>> {
        self.get(key).and_then(Json::as_array)
    }

    pub fn string_array(&self, key: &str) -> Vec<String> {
        self.array(key)
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
            .unwrap_or_default()
    }

    pub fn object(&self, key: &str) -> Option<Coercer<'a>> {
        self.get(key).filter(|v| v.is_object()).map(Coercer::new)
    }

    pub fn string_map(&self, key: &str) -> std::collections::HashMap<String, String> {
        self.get(key)
            .and_then(Json::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn raw(&self) -> &'a Json {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_with_defaults() {
        let body = json!({"content": "hi", "count": 3, "flag": true});
        let c = Coercer::new(&body);
        assert_eq!(c.str("content"), Some("hi"));
        assert_eq!(c.int_or("count", 0), 3);
        assert_eq!(c.bool_or("flag", false), true);
        assert_eq!(c.string_or("missing", "default"), "default");
        assert_eq!(c.int_or("missing", -1), -1);
    }

    #[test]
    fn string_array_filters_non_strings() {
        let body = json!({"tags": ["a", 1, "b", null]});
        let c = Coercer::new(&body);
        assert_eq!(c.string_array("tags"), vec!["a".to_string(), "b".to_string()]);
    }
}
