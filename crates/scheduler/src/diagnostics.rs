//! Best-effort diagnostic sink for raw scraped HTML.
//!
//! When the matcher repeatedly finds nothing, the raw schedule partial is
//! the only evidence of what the portal actually served. Writes go through a
//! bounded channel so the processor never blocks on disk, and every failure
//! path logs instead of propagating.

use std::path::PathBuf;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug)]
pub struct DiagnosticEntry {
    pub label: String,
    pub content: String,
}

#[derive(Clone)]
pub struct DiagnosticSink {
    tx: mpsc::Sender<DiagnosticEntry>,
}

impl DiagnosticSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DiagnosticEntry>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue a dump. Fire-and-forget: a full or closed channel is logged and
    /// otherwise ignored.
    pub fn queue(&self, label: &str, content: String) {
        let entry = DiagnosticEntry {
            label: label.to_string(),
            content,
        };
        if let Err(e) = self.tx.try_send(entry) {
            warn!("Dropping diagnostic dump '{}': {}", label, e);
        }
    }
}

/// Drain the channel to timestamped files under `dir`.
pub fn spawn_writer(mut rx: mpsc::Receiver<DiagnosticEntry>, dir: PathBuf) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!("Could not create diagnostics dir {:?}: {}", dir, e);
        }

        while let Some(entry) = rx.recv().await {
            let filename = format!(
                "debug_{}_{}.html",
                entry.label,
                Utc::now().format("%Y%m%d_%H%M%S")
            );
            let path = dir.join(&filename);
            match tokio::fs::write(&path, &entry.content).await {
                Ok(()) => info!("Wrote diagnostic dump {}", filename),
                Err(e) => warn!("Failed to write diagnostic dump {}: {}", filename, e),
            }
        }
    })
}
