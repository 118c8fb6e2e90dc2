//! Per-connection ESMTP session state machine (§4.2). Generic over the byte
//! stream so the same state machine drives both the plaintext listener and
//! the dedicated TLS listener without duplicating the protocol logic —
//! mirrors the teacher's pattern of writing connection handlers against
//! `AsyncRead + AsyncWrite` rather than a concrete socket type.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::config::EsmtpConfig;
use crate::esmtp::error::SmtpError;
use crate::model::EmailThreatVector;
use crate::processor::esmtp::EsmtpProcessor;
use crate::util::TruncateDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Greeted,
    HeloOk,
    MailOk,
    RcptOk,
}

pub struct Session<S> {
    stream: BufReader<S>,
    config: EsmtpConfig,
    processor: Arc<EsmtpProcessor>,
    state: SessionState,
    mail_from: Option<String>,
    rcpt_to: Vec<String>,
    /// Whether this connection arrived already wrapped in TLS — governs
    /// whether `STARTTLS` is refused (advertisement-only on the plain port;
    /// real upgrades happen by connecting to the dedicated TLS port).
    is_tls: bool,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: EsmtpConfig, is_tls: bool, processor: Arc<EsmtpProcessor>) -> Self {
        Self {
            stream: BufReader::new(stream),
            config,
            processor,
            state: SessionState::Greeted,
            mail_from: None,
            rcpt_to: Vec::new(),
            is_tls,
        }
    }

    /// STARTTLS is only worth advertising if the server actually has a
    /// certificate/key pair to upgrade with and this connection isn't
    /// already TLS-wrapped.
    fn should_advertise_starttls(&self) -> bool {
        !self.is_tls && self.config.enable_tls && self.config.cert_file.is_some() && self.config.key_file.is_some()
    }

    async fn write_line(&mut self, line: &str) -> Result<(), SmtpError> {
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\r\n").await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>, SmtpError> {
        let mut buf = String::new();
        let n = self.stream.read_line(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn reset_transaction(&mut self) {
        self.state = SessionState::HeloOk;
        self.mail_from = None;
        self.rcpt_to.clear();
    }

    /// Drives the session to completion, returning one parsed email vector
    /// per successful `DATA` transaction. A connection may submit more than
    /// one message before `QUIT`, so the caller loops on this.
    pub async fn run(&mut self) -> Result<Vec<EmailThreatVector>, SmtpError> {
        self.write_line(&format!("220 {} ESMTP sentrybus ready", self.config.hostname)).await?;
        let mut vectors = Vec::new();

        loop {
            let Some(line) = self.read_line().await? else {
                break;
            };
            if line.is_empty() {
                continue;
            }

            let mut parts = line.splitn(2, ' ');
            let verb = parts.next().unwrap_or("").to_uppercase();
            let rest = parts.next().unwrap_or("").trim();

            match verb.as_str() {
                "HELO" | "EHLO" => {
                    self.state = SessionState::HeloOk;
                    let domain = if rest.is_empty() { "there" } else { rest };
                    if verb == "EHLO" {
                        self.write_line(&format!("250-{} Hello {}", self.config.hostname, domain)).await?;
                        self.write_line("250-8BITMIME").await?;
                        self.write_line(&format!("250-SIZE {}", self.config.max_message_size)).await?;
                        if self.should_advertise_starttls() {
                            self.write_line("250-STARTTLS").await?;
                        }
                        self.write_line("250 HELP").await?;
                    } else {
                        self.write_line(&format!("250 {} Hello {}", self.config.hostname, domain)).await?;
                    }
                }
                "MAIL" => {
                    if self.state == SessionState::Greeted {
                        self.write_line("503 Bad sequence of commands, send HELO/EHLO first").await?;
                        continue;
                    }
                    match extract_address(rest, "FROM:") {
                        Some(addr) => {
                            self.mail_from = Some(addr);
                            self.rcpt_to.clear();
                            self.state = SessionState::MailOk;
                            self.write_line("250 OK").await?;
                        }
                        None => self.write_line("501 Syntax error in MAIL FROM").await?,
                    }
                }
                "RCPT" => {
                    if !matches!(self.state, SessionState::MailOk | SessionState::RcptOk) {
                        self.write_line("503 Bad sequence of commands, send MAIL FROM first").await?;
                        continue;
                    }
                    match extract_address(rest, "TO:") {
                        Some(addr) => {
                            self.rcpt_to.push(addr);
                            self.state = SessionState::RcptOk;
                            self.write_line("250 OK").await?;
                        }
                        None => self.write_line("501 Syntax error in RCPT TO").await?,
                    }
                }
                "DATA" => {
                    if self.state != SessionState::RcptOk {
                        self.write_line("503 Bad sequence of commands, need at least one RCPT TO").await?;
                        continue;
                    }
                    self.write_line("354 Start mail input; end with <CRLF>.<CRLF>").await?;
                    match self.read_data().await {
                        Ok(mut vector) => {
                            let request_id = crate::ids::request_id();
                            let response = self.processor.review_vector(&request_id, &mut vector).await;
                            if response.success {
                                self.write_line("250 OK: Message accepted for threat analysis").await?;
                                vectors.push(vector);
                            } else {
                                warn!(
                                    subject = %TruncateDisplay::new(&vector.subject, 80),
                                    message = %response.message,
                                    "email vector failed threat analysis submission"
                                );
                                self.write_line("451 Temporary failure - threat analysis error").await?;
                            }
                        }
                        Err(SmtpError::MessageTooLarge) => {
                            self.write_line("552 Message exceeds the maximum allowed size").await?;
                        }
                        Err(e) => return Err(e),
                    }
                    self.reset_transaction();
                }
                "RSET" => {
                    self.reset_transaction();
                    self.write_line("250 OK").await?;
                }
                "NOOP" => self.write_line("250 OK").await?,
                "STARTTLS" => {
                    if self.is_tls {
                        self.write_line("503 Connection is already using TLS").await?;
                    } else {
                        self.write_line("454 TLS not available on this port, connect to the TLS port instead").await?;
                    }
                }
                "QUIT" => {
                    self.write_line(&format!("221 {} closing connection", self.config.hostname)).await?;
                    break;
                }
                _ => self.write_line("502 Command not implemented").await?,
            }
        }

        Ok(vectors)
    }

    async fn read_data(&mut self) -> Result<EmailThreatVector, SmtpError> {
        let mut raw = String::new();
        loop {
            let Some(line) = self.read_line().await? else {
                break;
            };
            if line == "." {
                break;
            }
            let unstuffed = if let Some(stripped) = line.strip_prefix('.') { stripped } else { line.as_str() };
            raw.push_str(unstuffed);
            raw.push('\n');

            if raw.len() > self.config.max_message_size {
                return Err(SmtpError::MessageTooLarge);
            }
        }

        let (headers, body) = split_headers_and_body(&raw);
        let subject = headers.get("subject").cloned().unwrap_or_default();

        Ok(EmailThreatVector::new(
            self.mail_from.clone().unwrap_or_default(),
            self.rcpt_to.clone(),
            subject,
            body,
            headers,
            Vec::new(),
        ))
    }
}

/// Pulls the address out of `MAIL FROM:<addr>` / `RCPT TO:<addr>`, tolerant
/// of missing angle brackets and trailing ESMTP parameters.
fn extract_address(rest: &str, keyword: &str) -> Option<String> {
    let rest = rest.strip_prefix(keyword)?.trim();
    let addr_part = rest.split_whitespace().next().unwrap_or(rest);
    let addr = addr_part.trim_start_matches('<').trim_end_matches('>');
    if addr.is_empty() {
        None
    } else {
        Some(addr.to_string())
    }
}

fn split_headers_and_body(raw: &str) -> (HashMap<String, String>, String) {
    let mut headers = HashMap::new();
    let mut lines = raw.lines();
    let mut body_lines = Vec::new();

    for line in lines.by_ref() {
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }
    for line in lines {
        body_lines.push(line);
    }

    (headers, body_lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubCommunityClient;
    use tokio::io::duplex;

    fn config() -> EsmtpConfig {
        EsmtpConfig::default()
    }

    fn processor() -> Arc<EsmtpProcessor> {
        Arc::new(EsmtpProcessor::new(config(), Arc::new(StubCommunityClient::new())))
    }

    #[tokio::test]
    async fn happy_path_produces_one_vector() {
        let (client, server) = duplex(4096);
        let mut session = Session::new(server, config(), false, processor());
        let handle = tokio::spawn(async move { session.run().await });

        let mut client = BufReader::new(client);
        let mut line = String::new();
        client.read_line(&mut line).await.unwrap();
        assert!(line.starts_with("220"));

        client.write_all(b"HELO client.example\r\n").await.unwrap();
        client.read_line(&mut String::new()).await.unwrap();

        client.write_all(b"MAIL FROM:<a@example.com>\r\n").await.unwrap();
        client.read_line(&mut String::new()).await.unwrap();

        client.write_all(b"RCPT TO:<b@example.com>\r\n").await.unwrap();
        client.read_line(&mut String::new()).await.unwrap();

        client.write_all(b"DATA\r\n").await.unwrap();
        client.read_line(&mut String::new()).await.unwrap();

        client
            .write_all(b"Subject: hello\r\n\r\nThis is the body.\r\n.\r\n")
            .await
            .unwrap();
        let mut resp = String::new();
        client.read_line(&mut resp).await.unwrap();
        assert!(resp.starts_with("250"));

        client.write_all(b"QUIT\r\n").await.unwrap();
        client.read_line(&mut String::new()).await.unwrap();

        let vectors = handle.await.unwrap().unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].from, "a@example.com");
        assert_eq!(vectors[0].to, vec!["b@example.com".to_string()]);
        assert_eq!(vectors[0].subject, "hello");
        assert_eq!(vectors[0].body, "This is the body.");
    }

    #[tokio::test]
    async fn ehlo_advertises_size_and_8bitmime_but_not_starttls_when_disabled() {
        let (client, server) = duplex(4096);
        let mut session = Session::new(server, config(), false, processor());
        let handle = tokio::spawn(async move { session.run().await });

        let mut client = BufReader::new(client);
        client.read_line(&mut String::new()).await.unwrap();

        client.write_all(b"EHLO client.example\r\n").await.unwrap();
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            client.read_line(&mut line).await.unwrap();
            let done = line.starts_with("250 ");
            lines.push(line);
            if done {
                break;
            }
        }
        assert!(lines[0].contains("Hello client.example"));
        assert!(lines.iter().any(|l| l.contains("8BITMIME")));
        assert!(lines.iter().any(|l| l.contains("SIZE")));
        assert!(!lines.iter().any(|l| l.contains("STARTTLS")));
        assert!(lines.last().unwrap().starts_with("250 HELP"));

        client.write_all(b"QUIT\r\n").await.unwrap();
        client.read_line(&mut String::new()).await.unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn rcpt_before_mail_is_rejected() {
        let (client, server) = duplex(4096);
        let mut session = Session::new(server, config(), false, processor());
        let handle = tokio::spawn(async move { session.run().await });

        let mut client = BufReader::new(client);
        client.read_line(&mut String::new()).await.unwrap();

        client.write_all(b"HELO client.example\r\n").await.unwrap();
        client.read_line(&mut String::new()).await.unwrap();

        client.write_all(b"RCPT TO:<b@example.com>\r\n").await.unwrap();
        let mut resp = String::new();
        client.read_line(&mut resp).await.unwrap();
        assert!(resp.starts_with("503"));

        client.write_all(b"QUIT\r\n").await.unwrap();
        client.read_line(&mut String::new()).await.unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn starttls_on_plain_port_is_refused() {
        let (client, server) = duplex(4096);
        let mut session = Session::new(server, config(), false, processor());
        let handle = tokio::spawn(async move { session.run().await });

        let mut client = BufReader::new(client);
        client.read_line(&mut String::new()).await.unwrap();

        client.write_all(b"STARTTLS\r\n").await.unwrap();
        let mut resp = String::new();
        client.read_line(&mut resp).await.unwrap();
        assert!(resp.starts_with("454"));

        client.write_all(b"QUIT\r\n").await.unwrap();
        client.read_line(&mut String::new()).await.unwrap();
        handle.await.unwrap().unwrap();
    }
}
