// Wire types shared by the lock, problem and contest services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type LockId = String;
pub type ProblemId = u64;

/// Lock variants understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LockType {
    /// Held until explicitly removed
    Manual,
    /// Auto-expires at `timeout`
    Timer,
}

impl std::fmt::Display for LockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockType::Manual => write!(f, "manual"),
            LockType::Timer => write!(f, "timer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lock {
    pub lock_id: LockId,
    pub name: String,
    pub lock_type: LockType,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timeout: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
}

impl Lock {
    pub fn is_timer(&self) -> bool {
        self.lock_type == LockType::Timer
    }

    /// Timer lock whose timeout is still in the future
    pub fn is_active_timer(&self, now: DateTime<Utc>) -> bool {
        self.is_timer() && self.timeout.is_some_and(|timeout| timeout > now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLockRequest {
    pub name: String,
    pub description: String,
    pub lock_type: LockType,
    pub timeout: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateLockRequest {
    pub lock_id: LockId,
    pub name: String,
    pub description: String,
    pub lock_type: LockType,
    pub timeout: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_rollno: Option<String>,
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for LockFilters {
    fn default() -> Self {
        Self {
            lock_name: None,
            creator_user_name: None,
            creator_rollno: None,
            page_number: 1,
            page_size: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluator {
    Codeforces,
    Custom,
}

impl std::fmt::Display for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Evaluator::Codeforces => write!(f, "codeforces"),
            Evaluator::Custom => write!(f, "custom"),
        }
    }
}

/// Problem metadata as returned by the problem service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub difficulty: u32,
    pub evaluator: Evaluator,
    #[serde(default)]
    pub lock_id: Option<LockId>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Problem {
    pub fn is_unlocked(&self) -> bool {
        self.lock_id.as_deref().map_or(true, str::is_empty)
    }
}

/// Full-overwrite metadata update. Fields left out are nulled by the server,
/// so every update carries the complete set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemMetadataUpdate {
    pub title: String,
    pub difficulty: u32,
    pub evaluator: Evaluator,
    pub lock_id: Option<LockId>,
}

impl ProblemMetadataUpdate {
    /// Same metadata as `problem`, pointed at `lock_id`
    pub fn relock(problem: &Problem, lock_id: &str) -> Self {
        Self {
            title: problem.title.clone(),
            difficulty: problem.difficulty,
            evaluator: problem.evaluator,
            lock_id: Some(lock_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchProblemsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_ids: Option<Vec<ProblemId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_id: Option<LockId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluator: Option<Evaluator>,
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for SearchProblemsRequest {
    fn default() -> Self {
        Self {
            title: None,
            problem_ids: None,
            lock_id: None,
            evaluator: None,
            page_number: 1,
            page_size: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contest {
    pub contest_id: String,
    pub title: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
    pub is_published: bool,
    pub lock_id: Option<LockId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestDetails {
    pub title: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
    pub is_published: bool,
    pub lock_id: Option<LockId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestProblemEntry {
    pub problem_id: ProblemId,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateContestRequest {
    pub contest_details: ContestDetails,
    pub user_names: Vec<String>,
    pub problems: Vec<ContestProblemEntry>,
}

/// Error envelope: `{"success": false, "error": {"code", "message"}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lock_deserializes_with_missing_optional_fields() {
        let lock: Lock = serde_json::from_value(json!({
            "lock_id": "abc",
            "name": "Finals",
            "lock_type": "timer",
            "timeout": "2026-01-01T10:00:00Z"
        }))
        .unwrap();

        assert!(lock.is_timer());
        assert_eq!(lock.description, "");
        assert!(lock.created_at.is_none());
    }

    #[test]
    fn test_relock_preserves_metadata() {
        let problem = Problem {
            id: 7,
            title: "Two Sum".to_string(),
            difficulty: 800,
            evaluator: Evaluator::Codeforces,
            lock_id: None,
            created_by: "setter".to_string(),
            created_at: None,
            updated_at: None,
        };

        let update = ProblemMetadataUpdate::relock(&problem, "lock-1");
        assert_eq!(update.title, "Two Sum");
        assert_eq!(update.difficulty, 800);
        assert_eq!(update.evaluator, Evaluator::Codeforces);
        assert_eq!(update.lock_id.as_deref(), Some("lock-1"));
    }

    #[test]
    fn test_empty_lock_id_counts_as_unlocked() {
        let mut problem: Problem = serde_json::from_value(json!({
            "id": 1, "title": "A", "difficulty": 0, "evaluator": "custom", "lock_id": ""
        }))
        .unwrap();
        assert!(problem.is_unlocked());

        problem.lock_id = Some("l".to_string());
        assert!(!problem.is_unlocked());
    }

    #[test]
    fn test_lock_filters_skip_unset_fields() {
        let value = serde_json::to_value(LockFilters::default()).unwrap();
        assert_eq!(value, json!({"page_number": 1, "page_size": 20}));
    }
}
