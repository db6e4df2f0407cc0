//! Spool-directory notifier for a local mail transport.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::error::NotifyError;
use crate::models::config::AlertConfig;

use super::Notifier;

/// Writes each message as an RFC 5322 `.eml` file into a spool directory.
///
/// A mail transfer agent (or a cron job piping into `sendmail -t`) is
/// expected to pick the files up.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    dir: PathBuf,
    from: String,
    to: String,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Build from alert settings; all of outbox dir, sender and recipient are required.
    pub fn from_config(config: &AlertConfig) -> Result<Self, NotifyError> {
        let dir = config
            .outbox_dir
            .clone()
            .ok_or_else(|| NotifyError::NotConfigured("alerts.outbox_dir is not set".to_string()))?;
        let from = non_empty(config.from.as_deref())
            .ok_or_else(|| NotifyError::NotConfigured("alerts.from is not set".to_string()))?;
        let to = non_empty(config.to.as_deref()).unwrap_or(from);
        check_header("From", from)?;
        check_header("To", to)?;
        Ok(Self::new(dir, from, to))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render the full message text.
    pub fn render(&self, subject: &str, body: &str) -> String {
        let mut message = String::new();
        message.push_str(&format!("From: {}\r\n", self.from));
        message.push_str(&format!("To: {}\r\n", self.to));
        message.push_str(&format!("Subject: {}\r\n", subject));
        message.push_str(&format!("Date: {}\r\n", Utc::now().to_rfc2822()));
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("\r\n");
        for line in body.lines() {
            message.push_str(line);
            message.push_str("\r\n");
        }
        message
    }

    fn next_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6f");
        let mut n = 0;
        loop {
            let path = self.dir.join(format!("{}-{}.eml", stamp, n));
            if !path.exists() {
                return path;
            }
            n += 1;
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_header(name: &'static str, value: &str) -> Result<(), NotifyError> {
    if value.contains(['\r', '\n']) {
        return Err(NotifyError::InvalidHeader(name));
    }
    Ok(())
}

impl Notifier for OutboxNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        check_header("From", &self.from)?;
        check_header("To", &self.to)?;
        check_header("Subject", subject)?;
        fs::create_dir_all(&self.dir)?;
        let path = self.next_path();
        fs::write(&path, self.render(subject, body))?;
        debug!("Queued message {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_writes_message_file() {
        let dir = tempfile::tempdir().unwrap();
        let outbox = dir.path().join("outbox");
        let notifier = OutboxNotifier::new(&outbox, "pantry@example.com", "me@example.com");

        notifier.send("Smart Expiry Alert", "line one\nline two").unwrap();
        notifier.send("Smart Expiry Alert", "again").unwrap();

        let files: Vec<PathBuf> = fs::read_dir(&outbox)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().unwrap() == "eml"));

        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.starts_with("From: pantry@example.com\r\nTo: me@example.com\r\n"));
        assert!(content.contains("Subject: Smart Expiry Alert\r\n"));
        assert!(content.contains("\r\n\r\n"));
    }

    #[test]
    fn test_render_body_uses_crlf() {
        let notifier = OutboxNotifier::new("unused", "a@example.com", "b@example.com");
        let message = notifier.render("Hi", "first\nsecond");

        assert!(message.ends_with("\r\n\r\nfirst\r\nsecond\r\n"));
    }

    #[test]
    fn test_from_config_requires_sender_and_dir() {
        let mut config = AlertConfig::default();
        assert!(matches!(
            OutboxNotifier::from_config(&config),
            Err(NotifyError::NotConfigured(_))
        ));

        config.outbox_dir = Some(PathBuf::from("spool"));
        config.from = Some("  ".to_string());
        assert!(matches!(
            OutboxNotifier::from_config(&config),
            Err(NotifyError::NotConfigured(_))
        ));

        config.from = Some("pantry@example.com".to_string());
        let notifier = OutboxNotifier::from_config(&config).unwrap();
        assert_eq!(notifier.to, "pantry@example.com");
    }

    #[test]
    fn test_line_breaks_in_headers_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = AlertConfig {
            outbox_dir: Some(dir.path().join("outbox")),
            from: Some("pantry@example.com".to_string()),
            to: Some("me@example.com\r\nBcc: everyone@example.com".to_string()),
            ..AlertConfig::default()
        };
        assert!(matches!(
            OutboxNotifier::from_config(&config),
            Err(NotifyError::InvalidHeader("To"))
        ));

        let notifier = OutboxNotifier::new(dir.path().join("outbox"), "pantry@example.com", "me@example.com");
        assert!(matches!(
            notifier.send("Alert\nBcc: everyone@example.com", "body"),
            Err(NotifyError::InvalidHeader("Subject"))
        ));
        assert!(!dir.path().join("outbox").exists());
    }
}
