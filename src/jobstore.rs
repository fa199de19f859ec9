//! Job store: in-memory, bounded, TTL-evicted map of job-id -> job state.
//!
//! A single `RwLock<HashMap<...>>` behind an `Arc`, with eviction on two
//! independent axes: jobs past their TTL are hidden from readers (unless
//! still running), and the store as a whole never holds more than its
//! configured capacity, evicting the oldest non-running job to make room.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::models::job::{Job, JobStatus};

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("job '{0}' not found")]
    NotFound(String),
}

pub const DEFAULT_TTL_SECS: i64 = 1800;
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

pub struct JobStore {
    jobs: RwLock<HashMap<String, Job>>,
    ttl: Duration,
    max_sessions: usize,
}

impl JobStore {
    pub fn new(ttl_secs: i64, max_sessions: usize) -> Self {
        Self { jobs: RwLock::new(HashMap::new()), ttl: Duration::seconds(ttl_secs), max_sessions }
    }

    fn is_expired(job: &Job, ttl: Duration, now: DateTime<Utc>) -> bool {
        if matches!(job.status, JobStatus::Running) {
            return false;
        }
        now.signed_duration_since(job.created_at) >= ttl
    }

    /// Insert a new pending job, evicting the oldest non-running job first
    /// if the store is at capacity.
    pub async fn create(&self, job_id: String, user_id: String) -> Job {
        let now = Utc::now();
        let job = Job::new(job_id.clone(), user_id, now);

        let mut jobs = self.jobs.write().await;
        if jobs.len() >= self.max_sessions {
            let victim = jobs
                .values()
                .filter(|j| !matches!(j.status, JobStatus::Running))
                .min_by_key(|j| j.created_at)
                .map(|j| j.job_id.clone());
            if let Some(victim_id) = victim {
                jobs.remove(&victim_id);
            }
        }
        jobs.insert(job_id, job.clone());
        job
    }

    /// Returns `None` for a job past its TTL unless it is still running;
    /// running jobs never auto-evict regardless of age.
    pub async fn get(&self, job_id: &str) -> Option<Job> {
        let now = Utc::now();
        let jobs = self.jobs.read().await;
        let job = jobs.get(job_id)?;
        if Self::is_expired(job, self.ttl, now) {
            return None;
        }
        Some(job.clone())
    }

    pub async fn update<F: FnOnce(&mut Job)>(&self, job_id: &str, patch: F) -> Result<Job, JobStoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(job_id).ok_or_else(|| JobStoreError::NotFound(job_id.to_string()))?;
        patch(job);
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    pub async fn delete(&self, job_id: &str) {
        self.jobs.write().await.remove(job_id);
    }

    pub async fn list_by_user(&self, user_id: &str) -> Vec<Job> {
        let now = Utc::now();
        let jobs = self.jobs.read().await;
        jobs.values()
            .filter(|j| j.user_id == user_id && !Self::is_expired(j, self.ttl, now))
            .cloned()
            .collect()
    }
}

pub type SharedJobStore = Arc<JobStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = JobStore::new(DEFAULT_TTL_SECS, DEFAULT_MAX_SESSIONS);
        store.create("job-1".to_string(), "user-a".to_string()).await;
        let job = store.get("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn completed_job_past_ttl_returns_none() {
        let store = JobStore::new(0, DEFAULT_MAX_SESSIONS);
        store.create("job-1".to_string(), "user-a".to_string()).await;
        store.update("job-1", |j| j.status = JobStatus::Completed).await.unwrap();
        // ttl is 0 seconds, so this job is immediately expired.
        assert!(store.get("job-1").await.is_none());
    }

    #[tokio::test]
    async fn running_job_survives_past_ttl() {
        let store = JobStore::new(0, DEFAULT_MAX_SESSIONS);
        store.create("job-1".to_string(), "user-a".to_string()).await;
        store.update("job-1", |j| j.status = JobStatus::Running).await.unwrap();
        assert!(store.get("job-1").await.is_some());
    }

    #[tokio::test]
    async fn capacity_bound_evicts_oldest_non_running_job() {
        let store = JobStore::new(DEFAULT_TTL_SECS, 1);
        store.create("job-old".to_string(), "user-a".to_string()).await;
        store.create("job-new".to_string(), "user-a".to_string()).await;
        assert!(store.get("job-old").await.is_none());
        assert!(store.get("job-new").await.is_some());
    }

    #[tokio::test]
    async fn running_job_not_evicted_to_make_room() {
        let store = JobStore::new(DEFAULT_TTL_SECS, 1);
        store.create("job-running".to_string(), "user-a".to_string()).await;
        store.update("job-running", |j| j.status = JobStatus::Running).await.unwrap();
        store.create("job-new".to_string(), "user-a".to_string()).await;
        // both jobs should exist since the only eviction candidate is
        // excluded by virtue of being `running`.
        assert!(store.get("job-running").await.is_some());
        assert!(store.get("job-new").await.is_some());
    }
}
