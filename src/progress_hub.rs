//! Per-job progress fan-out.
//!
//! Each job gets its own broadcast channel, created lazily on first publish
//! or subscribe and torn down once nobody can usefully subscribe to it
//! anymore. `connected` is never broadcast on the shared channel at all; it
//! is synthesized fresh for each subscriber the moment it subscribes, so a
//! reconnect sees it exactly once regardless of how many other subscribers
//! are already attached. A subscriber that attaches after the job already
//! reached a terminal event is hung the terminal event as a one-shot prefix
//! instead of a live receiver, since nothing further will ever arrive.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::models::event::ProgressEvent;

const CHANNEL_CAPACITY: usize = 256;

struct JobChannel {
    sender: broadcast::Sender<ProgressEvent>,
    /// Set once a terminal event has been published; replayed to late subscribers.
    terminal: Option<ProgressEvent>,
}

pub struct ProgressHub {
    channels: RwLock<HashMap<String, JobChannel>>,
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHub {
    pub fn new() -> Self {
        Self { channels: RwLock::new(HashMap::new()) }
    }

    /// Publish an event to every current subscriber of `job_id`. Slow
    /// subscribers whose bounded queue has filled simply miss events
    /// (`broadcast::Sender::send` never blocks the publisher on them); a
    /// subscriber that lags is detected on its own receive, not here.
    pub async fn publish(&self, job_id: &str, event: ProgressEvent) {
        let mut channels = self.channels.write().await;
        let channel = channels
            .entry(job_id.to_string())
            .or_insert_with(|| JobChannel { sender: broadcast::channel(CHANNEL_CAPACITY).0, terminal: None });

        let _ = channel.sender.send(event.clone());
        if event.is_terminal() {
            channel.terminal = Some(event);
        }
    }

    /// Subscribe to `job_id`. Returns a synthesized prefix the caller must
    /// yield before anything read off the receiver: always starts with
    /// `connected`, followed by the cached terminal event if the job already
    /// finished. The prefix is local to this call; it is never written back
    /// to the shared channel, so it can never reach any other subscriber.
    pub async fn subscribe(&self, job_id: &str) -> (Vec<ProgressEvent>, broadcast::Receiver<ProgressEvent>) {
        let mut channels = self.channels.write().await;
        let channel = channels
            .entry(job_id.to_string())
            .or_insert_with(|| JobChannel { sender: broadcast::channel(CHANNEL_CAPACITY).0, terminal: None });

        let receiver = channel.sender.subscribe();
        let mut prefix = vec![ProgressEvent::Connected];
        if let Some(terminal) = channel.terminal.clone() {
            prefix.push(terminal);
        }
        (prefix, receiver)
    }

    /// Drop a job's channel once nobody can usefully subscribe to it anymore.
    /// Called by the orchestrator a grace period after the terminal event,
    /// so slow subscribers still attached keep their already-issued receiver
    /// (dropping the map entry does not affect receivers created from it).
    pub async fn retire(&self, job_id: &str) {
        self.channels.write().await.remove(job_id);
    }
}

pub type SharedProgressHub = Arc<ProgressHub>;
