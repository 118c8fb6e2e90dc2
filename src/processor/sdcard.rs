//! SD-card channel processor (§4.3, §6). Unlike the other channels, the
//! webhook body either names a mount point on the host running the bus (the
//! processor walks it directly) or carries the file list inline in the
//! body. Grounded on the pack's use of `walkdir` for directory traversal and
//! `sha2` for content hashing (neither the teacher repo needed either).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::ai::CommunityClient;
use crate::config::SdCardConfig;
use crate::model::{SdCardData, SdCardFile, WebhookRequest, WebhookResponse};
use crate::processor::threshold::ThresholdTable;
use crate::processor::{review, Processor};
use crate::value::Coercer;

/// Filename substrings that mark a file as following a pattern commonly
/// used to disguise or deploy malicious payloads (§4.3).
const SUSPICIOUS_NAME_KEYWORDS: [&str; 17] = [
    "autorun", "setup", "install", "update", "patch", "crack", "keygen", "serial", "license",
    "password", "pass", "pwd", "secret", "backup", "dump", "export", "extract",
];
const DOCUMENT_LIKE_EXTENSIONS: [&str; 5] = [".pdf", ".doc", ".docx", ".jpg", ".jpeg"];
const TEXT_EXTENSIONS: [&str; 8] = [".txt", ".log", ".cfg", ".conf", ".ini", ".json", ".xml", ".csv"];
const MAX_SNIPPET_SIZE: u64 = 10 * 1024;

pub struct SdCardProcessor {
    config: SdCardConfig,
    client: Arc<dyn CommunityClient>,
}

impl SdCardProcessor {
    pub fn new(config: SdCardConfig, client: Arc<dyn CommunityClient>) -> Self {
        Self { config, client }
    }

    fn hash_file(path: &Path) -> Option<String> {
        let bytes = std::fs::read(path).ok()?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Some(format!("{:x}", hasher.finalize()))
    }

    /// §4.3's `threat_flags` rule, shared by both the mount-point walk and
    /// the body-supplied file list.
    fn threat_flags(&self, name: &str, extension: &str, is_executable: bool) -> Vec<String> {
        let mut flags = Vec::new();
        if self.config.blocked_extensions.iter().any(|b| b.eq_ignore_ascii_case(extension)) {
            flags.push("blocked_extension".to_string());
        }

        let lower_name = name.to_lowercase();
        let double_extension = lower_name.matches('.').count() >= 2;
        let executable_with_document_extension = is_executable && DOCUMENT_LIKE_EXTENSIONS.iter().any(|e| lower_name.ends_with(e));
        let suspicious_keyword = SUSPICIOUS_NAME_KEYWORDS.iter().any(|kw| lower_name.contains(kw));
        if suspicious_keyword || double_extension || executable_with_document_extension {
            flags.push("suspicious_pattern".to_string());
        }

        flags
    }

    fn content_snippet(extension: &str, size: u64, read: impl FnOnce() -> Option<String>) -> Option<String> {
        if size > MAX_SNIPPET_SIZE || !TEXT_EXTENSIONS.iter().any(|e| extension.eq_ignore_ascii_case(e)) {
            return None;
        }
        read()
    }

    fn scan_mount_point(&self, mount_point: &str) -> Vec<SdCardFile> {
        let mut files = Vec::new();

        for entry in WalkDir::new(mount_point)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };

            let size = metadata.len();
            if size > self.config.max_file_size {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            let extension = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default();

            #[cfg(unix)]
            let is_executable = {
                use std::os::unix::fs::PermissionsExt;
                metadata.permissions().mode() & 0o111 != 0
            };
            #[cfg(not(unix))]
            let is_executable = false;

            let threat_flags = self.threat_flags(&name, &extension, is_executable);
            let hash = if self.config.hash_files { Self::hash_file(path) } else { None };
            let content_snippet = Self::content_snippet(&extension, size, || std::fs::read_to_string(path).ok());

            files.push(SdCardFile {
                path: path.to_string_lossy().to_string(),
                name: name.clone(),
                extension,
                size,
                mtime: metadata.modified().ok().map(chrono::DateTime::<chrono::Utc>::from),
                permissions: String::new(),
                is_hidden: name.starts_with('.'),
                is_executable,
                hash,
                content_snippet,
                threat_flags,
            });
        }

        files
    }

    fn files_from_body(&self, entries: &[serde_json::Value]) -> Vec<SdCardFile> {
        entries
            .iter()
            .map(|v| {
                let c = Coercer::new(v);
                let name = c.string_or("name", "");
                let extension = c
                    .string("extension")
                    .unwrap_or_else(|| Path::new(&name).extension().map(|e| format!(".{}", e.to_string_lossy().to_lowercase())).unwrap_or_default());
                let size = c.int_or("size", 0) as u64;
                let is_executable = c.bool_or("is_executable", false);
                let content = c.string("content");
                let threat_flags = self.threat_flags(&name, &extension, is_executable);
                let content_snippet = Self::content_snippet(&extension, size, || content.clone());

                SdCardFile {
                    path: c.string_or("path", &name),
                    name,
                    extension,
                    size,
                    mtime: None,
                    permissions: c.string_or("permissions", ""),
                    is_hidden: c.bool_or("is_hidden", false),
                    is_executable,
                    hash: c.string("hash"),
                    content_snippet,
                    threat_flags,
                }
            })
            .collect()
    }

    fn scan(&self, body: &Coercer, mount_point: Option<&str>) -> SdCardData {
        let files = match mount_point {
            Some(mp) => self.scan_mount_point(mp),
            None => self.files_from_body(&body.array("files").cloned().unwrap_or_default()),
        };
        let total_size: i64 = files.iter().map(|f| f.size as i64).sum();

        SdCardData {
            id: body.string("id"),
            device_path: body.string("device_path"),
            mount_point: mount_point.map(|s| s.to_string()),
            file_system: body.string("file_system"),
            total_size,
            used_size: total_size,
            files,
        }
    }
}

impl Clone for SdCardProcessor {
    fn clone(&self) -> Self {
        Self {
            config: SdCardConfig {
                policy: self.config.policy.clone(),
                community_topic: self.config.community_topic.clone(),
                hash_files: self.config.hash_files,
                max_file_size: self.config.max_file_size,
                blocked_extensions: self.config.blocked_extensions.clone(),
            },
            client: self.client.clone(),
        }
    }
}

#[async_trait]
impl Processor for SdCardProcessor {
    fn tag(&self) -> &str {
        "sdcard"
    }

    fn description(&self) -> &str {
        "Walks a mounted SD card's filesystem and reviews suspicious file indicators."
    }

    async fn process_webhook(&self, request: WebhookRequest) -> WebhookResponse {
        let body = Coercer::new(&request.body);
        let mount_point = body.string("mount_point");
        if mount_point.is_none() && body.array("files").is_none() {
            return WebhookResponse::err(&request.id, "sdcard request is missing 'mount_point' or 'files'");
        }

        let data = self.scan(&body, mount_point.as_deref());
        let flagged: Vec<&SdCardFile> = data.files.iter().filter(|f| !f.threat_flags.is_empty()).collect();

        if flagged.is_empty() {
            return WebhookResponse::ok(&request.id, format!("scanned {} files, no threat indicators found", data.files.len()));
        }

        let suspicious_files = flagged.iter().filter(|f| f.threat_flags.iter().any(|t| t == "suspicious_pattern")).count();
        let executable_files = data.files.iter().filter(|f| f.is_executable).count();
        let hidden_files = data.files.iter().filter(|f| f.is_hidden).count();

        let summary = flagged
            .iter()
            .map(|f| format!("{} [{}]", f.name, f.threat_flags.join(",")))
            .collect::<Vec<_>>()
            .join("; ");

        let samples = data
            .files
            .iter()
            .filter_map(|f| f.content_snippet.as_deref())
            .take(5)
            .map(|c| {
                if c.chars().count() > 500 {
                    format!("{}\u{2026}", c.chars().take(500).collect::<String>())
                } else {
                    c.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n---\n");

        let mut content = format!(
            "Flagged files on SD card ({suspicious_files} suspicious, {executable_files} executable, {hidden_files} hidden): {summary}"
        );
        if !samples.is_empty() {
            content.push_str("\n\nSample file contents:\n");
            content.push_str(&samples);
        }

        let mut response =
            review::review_and_respond(self.client.as_ref(), &self.config.community_topic, &self.config.policy, &ThresholdTable::DEFAULT, &request.id, &content)
                .await;

        if response.success {
            let mut data = response.data.take().unwrap_or_default();
            data.insert("suspicious_files".to_string(), json!(suspicious_files));
            data.insert("executable_files".to_string(), json!(executable_files));
            data.insert("hidden_files".to_string(), json!(hidden_files));
            response = response.with_data(data);
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubCommunityClient;
    use serde_json::json;

    #[tokio::test]
    async fn missing_mount_point_is_rejected() {
        let p = SdCardProcessor::new(SdCardConfig::default(), Arc::new(StubCommunityClient::new()));
        let req = WebhookRequest::new(
            "req_1".to_string(),
            "sdcard".to_string(),
            "sdcard".to_string(),
            Default::default(),
            json!({}),
        );
        let resp = p.process_webhook(req).await;
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn scanning_empty_directory_finds_nothing_to_flag() {
        let dir = std::env::temp_dir().join(format!("sentrybus_sdcard_test_{}", crate::ids::event_id()));
        std::fs::create_dir_all(&dir).unwrap();

        let p = SdCardProcessor::new(SdCardConfig::default(), Arc::new(StubCommunityClient::new()));
        let req = WebhookRequest::new(
            "req_2".to_string(),
            "sdcard".to_string(),
            "sdcard".to_string(),
            Default::default(),
            json!({"mount_point": dir.to_string_lossy()}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
        assert!(resp.message.contains("no threat indicators"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn blocked_extension_triggers_review() {
        let dir = std::env::temp_dir().join(format!("sentrybus_sdcard_test_{}", crate::ids::event_id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("payload.exe"), b"not really an exe").unwrap();

        let p = SdCardProcessor::new(SdCardConfig::default(), Arc::new(StubCommunityClient::new()));
        let req = WebhookRequest::new(
            "req_3".to_string(),
            "sdcard".to_string(),
            "sdcard".to_string(),
            Default::default(),
            json!({"mount_point": dir.to_string_lossy()}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
        assert!(resp.data.is_some());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn double_extension_name_is_flagged_suspicious() {
        let dir = std::env::temp_dir().join(format!("sentrybus_sdcard_test_{}", crate::ids::event_id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("invoice.pdf.exe"), b"x").unwrap();

        let p = SdCardProcessor::new(SdCardConfig::default(), Arc::new(StubCommunityClient::new()));
        let req = WebhookRequest::new(
            "req_4".to_string(),
            "sdcard".to_string(),
            "sdcard".to_string(),
            Default::default(),
            json!({"mount_point": dir.to_string_lossy()}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert!(data.get("suspicious_files").unwrap().as_u64().unwrap() >= 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn body_supplied_file_is_scanned_without_a_mount_point() {
        let p = SdCardProcessor::new(SdCardConfig::default(), Arc::new(StubCommunityClient::new()));
        let req = WebhookRequest::new(
            "req_5".to_string(),
            "sdcard".to_string(),
            "sdcard".to_string(),
            Default::default(),
            json!({"files": [{"name": "invoice.pdf.exe", "is_executable": true, "size": 10}]}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert!(data.get("suspicious_files").unwrap().as_u64().unwrap() >= 1);
    }
}
