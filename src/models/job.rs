//! Job lifecycle types (component I's payload).

use serde::{Deserialize, Serialize};

use crate::models::plan::GeneratedPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub phase: String,
    pub iteration: u32,
    pub max_iterations: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_agent: Option<String>,
}

impl Default for JobProgress {
    fn default() -> Self {
        Self { phase: "init".to_string(), iteration: 0, max_iterations: 0, current_agent: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub user_id: String,
    pub status: JobStatus,
    pub progress: JobProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GeneratedPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    pub fn new(job_id: String, user_id: String, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            job_id,
            user_id,
            status: JobStatus::Pending,
            progress: JobProgress::default(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
