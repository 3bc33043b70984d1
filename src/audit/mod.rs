// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Audit Trail
//!
//! Every authenticated request produces one audit entry. Recording is
//! asynchronous and best-effort: the HTTP hot path only sanitizes the event
//! and pushes it onto a bounded in-memory queue; a background worker drains
//! the queue and persists entries. Audit failures never fail the request
//! that produced them.
//!
//! When the queue is full the configured [`AuditDropPolicy`] decides which
//! entry to sacrifice; every drop increments a counter that readiness
//! reporting can expose.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{AuditConfig, AuditDropPolicy, AuditPersistence};
use crate::models::AuditEntry;
use crate::storage::UserStore;

/// Metadata keys whose values are replaced before an entry leaves the
/// request handler. Matched case-insensitively as substrings.
const REDACTED_KEYS: &[&str] = &["password", "token", "secret", "creditcard"];

const REDACTED: &str = "[REDACTED]";

// =============================================================================
// Event Capture
// =============================================================================

/// Raw observation of one authenticated request, before sanitization.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Verified token subject of the caller.
    pub subject_id: String,
    pub method: String,
    pub path: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Parsed JSON request body, when one was sent.
    pub body: Option<Value>,
}

impl AuditEvent {
    /// Sanitize and freeze this event into a persistable entry.
    fn into_entry(self) -> AuditEntry {
        let mut metadata = serde_json::Map::new();
        metadata.insert("method".to_string(), Value::String(self.method.clone()));
        metadata.insert("path".to_string(), Value::String(self.path.clone()));

        // Request bodies on reads carry nothing worth keeping.
        if self.method != "GET" {
            if let Some(mut body) = self.body {
                redact(&mut body);
                metadata.insert("body".to_string(), body);
            }
        }

        AuditEntry {
            id: Uuid::new_v4().to_string(),
            user_id: self.subject_id,
            action: format!("{} {}", self.method, self.path),
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            metadata: Value::Object(metadata),
            timestamp: Utc::now(),
        }
    }
}

/// Replace sensitive values in-place, recursing through objects and arrays.
fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                let lowered = key.to_lowercase();
                if REDACTED_KEYS.iter().any(|needle| lowered.contains(needle)) {
                    *entry = Value::String(REDACTED.to_string());
                } else {
                    redact(entry);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact(item);
            }
        }
        _ => {}
    }
}

// =============================================================================
// Recorder
// =============================================================================

/// Cheap-to-clone handle that request handlers use to enqueue audit events.
#[derive(Clone)]
pub struct AuditRecorder {
    queue: Arc<Mutex<VecDeque<AuditEntry>>>,
    notify: Arc<Notify>,
    dropped: Arc<AtomicU64>,
    capacity: usize,
    drop_policy: AuditDropPolicy,
}

impl AuditRecorder {
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::with_capacity(config.queue_capacity))),
            notify: Arc::new(Notify::new()),
            dropped: Arc::new(AtomicU64::new(0)),
            capacity: config.queue_capacity.max(1),
            drop_policy: config.drop_policy,
        }
    }

    /// Sanitize and enqueue one event. Never blocks and never fails; on a
    /// full queue the drop policy decides which entry is lost.
    pub fn record(&self, event: AuditEvent) {
        let entry = event.into_entry();

        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= self.capacity {
            match self.drop_policy {
                AuditDropPolicy::DropOldest => {
                    queue.pop_front();
                    queue.push_back(entry);
                }
                AuditDropPolicy::DropNewest => {}
            }
            self.dropped.fetch_add(1, Ordering::Relaxed);
        } else {
            queue.push_back(entry);
        }
        drop(queue);

        self.notify.notify_one();
    }

    /// Entries lost to queue overflow since startup.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn drain(&self) -> Vec<AuditEntry> {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.drain(..).collect()
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Drain the queue until cancelled, persisting entries per the configured
/// sink. A final drain on shutdown flushes whatever is still queued.
pub fn spawn_worker(
    recorder: AuditRecorder,
    store: Arc<dyn UserStore>,
    persistence: AuditPersistence,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            persist_batch(recorder.drain(), &*store, persistence);

            tokio::select! {
                _ = recorder.notify.notified() => {}
                _ = shutdown.cancelled() => {
                    persist_batch(recorder.drain(), &*store, persistence);
                    tracing::debug!("audit worker stopped");
                    return;
                }
            }
        }
    })
}

fn persist_batch(entries: Vec<AuditEntry>, store: &dyn UserStore, persistence: AuditPersistence) {
    for entry in entries {
        match persistence {
            AuditPersistence::Durable => {
                if let Err(e) = store.insert_audit(&entry) {
                    tracing::warn!(error = %e, action = %entry.action, "failed to persist audit entry");
                }
            }
            AuditPersistence::Console => {
                tracing::info!(
                    user_id = %entry.user_id,
                    action = %entry.action,
                    metadata = %entry.metadata,
                    "audit"
                );
            }
        }
    }
}
