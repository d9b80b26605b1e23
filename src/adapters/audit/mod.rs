//! Audit traffic logger collaborator.
//!
//! Independently subscribes to the universal wildcard topic and appends one
//! JSON record per message to an append-only log file. Writes are
//! serialized by a single mutex, which is acceptable because they are off
//! the message-critical path. Per-record failures (disk full, permission)
//! are warnings only and never affect the gateway; only startup (opening
//! the file, subscribing) is fatal.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::{BrokerMessage, Topic};
use crate::ports::{Broker, BrokerError};

/// Errors that prevent the traffic logger from starting.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Log storage unavailable: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Wildcard subscription failed: {0}")]
    Subscribe(#[from] BrokerError),
}

/// One log record, marshaled as a single JSON line.
#[derive(Debug, Serialize)]
struct TrafficRecord<'a> {
    timestamp: DateTime<Utc>,
    topic: &'a str,
    data: String,
}

/// Wildcard subscriber recording all broker traffic to a file.
pub struct TrafficLogger {
    file: Arc<Mutex<File>>,
}

impl TrafficLogger {
    /// Opens the log file and starts recording all broker traffic.
    ///
    /// Creates the parent directory if needed and opens the file in
    /// append-only mode. The returned task runs until the broker shuts
    /// down.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the file cannot be opened or the
    /// wildcard subscription fails; callers treat this as startup-fatal.
    pub async fn start(
        broker: Arc<dyn Broker>,
        path: &Path,
    ) -> Result<JoinHandle<()>, AuditError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        info!(path = %path.display(), "logging traffic to file");

        let logger = Self {
            file: Arc::new(Mutex::new(file)),
        };

        let mut subscription = broker.subscribe(&Topic::wildcard_all()).await?;
        info!("subscribed to all topics for traffic logging");

        Ok(tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                if let Err(err) = logger.append(&message) {
                    warn!(error = %err, "failed to write traffic record");
                }
            }
            info!("traffic logger stopped");
        }))
    }

    /// Appends one record. The mutex serializes concurrent writers so
    /// records never interleave.
    fn append(&self, message: &BrokerMessage) -> Result<(), std::io::Error> {
        let record = TrafficRecord {
            timestamp: Utc::now(),
            topic: message.topic.as_str(),
            data: String::from_utf8_lossy(&message.payload).into_owned(),
        };

        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        file.write_all(&line)
    }
}
