// In-memory backend - no network, every call recorded
//
// Backs `create --dry-run` and the integration tests. Enforces the backend
// rules the submission flow has to route around.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::api::contests::ContestService;
use crate::api::errors::ApiError;
use crate::api::locks::LockService;
use crate::api::problems::ProblemService;
use crate::api::types::*;

/// A call received by the in-memory backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateLock {
        name: String,
        lock_type: LockType,
        timeout: Option<chrono::DateTime<Utc>>,
    },
    UpdateLock {
        lock_id: LockId,
        timeout: Option<chrono::DateTime<Utc>>,
    },
    SearchLocks,
    GetLock {
        lock_id: LockId,
    },
    DeleteLock {
        lock_id: LockId,
    },
    UpdateProblem {
        problem_id: ProblemId,
        lock_id: Option<LockId>,
    },
    SearchProblems,
    CreateContest {
        title: String,
    },
}

/// Operations that can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    CreateLock,
    UpdateLock,
    UpdateProblem,
    CreateContest,
}

#[derive(Debug, Default)]
struct Store {
    locks: BTreeMap<LockId, Lock>,
    problems: BTreeMap<ProblemId, Problem>,
    contests: Vec<Contest>,
    calls: Vec<BackendCall>,
    failing: HashSet<FailPoint>,
    next_id: u64,
}

impl Store {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:04}", self.next_id)
    }

    fn check(&self, point: FailPoint) -> Result<(), ApiError> {
        if self.failing.contains(&point) {
            return Err(ApiError::Server {
                status: 500,
                code: Some("INJECTED".to_string()),
                message: Some(format!("{point:?} failed")),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
    strict_timer_transitions: bool,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Backend that rejects unlocked → timer problem moves
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            strict_timer_transitions: true,
        }
    }

    /// Backend that accepts every lock transition
    pub fn permissive() -> Self {
        Self {
            strict_timer_transitions: false,
            ..Self::new()
        }
    }

    pub fn seeded(locks: Vec<Lock>, problems: Vec<Problem>) -> Self {
        let backend = Self::new();
        {
            let mut store = backend.store();
            for lock in locks {
                store.locks.insert(lock.lock_id.clone(), lock);
            }
            for problem in problems {
                store.problems.insert(problem.id, problem);
            }
        }
        backend
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        // A panic while holding the lock leaves the maps consistent; keep going.
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_lock(&self, lock: Lock) {
        self.store().locks.insert(lock.lock_id.clone(), lock);
    }

    pub fn insert_problem(&self, problem: Problem) {
        self.store().problems.insert(problem.id, problem);
    }

    pub fn fail_on(&self, point: FailPoint) {
        self.store().failing.insert(point);
    }

    pub fn clear_failures(&self) {
        self.store().failing.clear();
    }

    pub fn lock(&self, lock_id: &str) -> Option<Lock> {
        self.store().locks.get(lock_id).cloned()
    }

    pub fn locks(&self) -> Vec<Lock> {
        self.store().locks.values().cloned().collect()
    }

    pub fn problem(&self, problem_id: ProblemId) -> Option<Problem> {
        self.store().problems.get(&problem_id).cloned()
    }

    pub fn contests(&self) -> Vec<Contest> {
        self.store().contests.clone()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.store().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.store().calls.clear();
    }

    pub fn problem_updates(&self) -> Vec<(ProblemId, Option<LockId>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::UpdateProblem {
                    problem_id,
                    lock_id,
                } => Some((problem_id, lock_id)),
                _ => None,
            })
            .collect()
    }

    pub fn created_locks(&self) -> Vec<(String, LockType)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::CreateLock {
                    name, lock_type, ..
                } => Some((name, lock_type)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl LockService for InMemoryBackend {
    async fn create(&self, request: &CreateLockRequest) -> Result<Lock, ApiError> {
        let mut store = self.store();
        store.calls.push(BackendCall::CreateLock {
            name: request.name.clone(),
            lock_type: request.lock_type,
            timeout: request.timeout,
        });
        store.check(FailPoint::CreateLock)?;

        if request.lock_type == LockType::Timer && request.timeout.is_none() {
            return Err(ApiError::Server {
                status: 400,
                code: Some("VALIDATION".to_string()),
                message: Some("timer locks require a timeout".to_string()),
            });
        }

        let lock = Lock {
            lock_id: store.next_id("lock"),
            name: request.name.clone(),
            lock_type: request.lock_type,
            created_by: "dry-run".to_string(),
            created_at: Some(Utc::now()),
            timeout: request.timeout,
            description: request.description.clone(),
        };
        store.locks.insert(lock.lock_id.clone(), lock.clone());
        Ok(lock)
    }

    async fn update(&self, request: &UpdateLockRequest) -> Result<Lock, ApiError> {
        let mut store = self.store();
        store.calls.push(BackendCall::UpdateLock {
            lock_id: request.lock_id.clone(),
            timeout: request.timeout,
        });
        store.check(FailPoint::UpdateLock)?;

        let lock = store
            .locks
            .get_mut(&request.lock_id)
            .ok_or_else(|| ApiError::NotFound {
                resource: "lock",
                id: request.lock_id.clone(),
            })?;
        lock.name = request.name.clone();
        lock.description = request.description.clone();
        lock.lock_type = request.lock_type;
        lock.timeout = request.timeout;
        Ok(lock.clone())
    }

    async fn search(&self, filters: &LockFilters) -> Result<Vec<Lock>, ApiError> {
        let mut store = self.store();
        store.calls.push(BackendCall::SearchLocks);

        let needle = filters.lock_name.as_deref().map(str::to_lowercase);
        let page_size = filters.page_size.max(1) as usize;
        let skip = filters.page_number.saturating_sub(1) as usize * page_size;

        Ok(store
            .locks
            .values()
            .filter(|lock| {
                needle
                    .as_deref()
                    .map_or(true, |n| lock.name.to_lowercase().contains(n))
            })
            .skip(skip)
            .take(page_size)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, lock_id: &str) -> Result<Lock, ApiError> {
        let mut store = self.store();
        store.calls.push(BackendCall::GetLock {
            lock_id: lock_id.to_string(),
        });
        store
            .locks
            .get(lock_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: "lock",
                id: lock_id.to_string(),
            })
    }

    async fn delete(&self, lock_id: &str) -> Result<(), ApiError> {
        let mut store = self.store();
        store.calls.push(BackendCall::DeleteLock {
            lock_id: lock_id.to_string(),
        });

        match store.locks.get(lock_id) {
            None => Err(ApiError::NotFound {
                resource: "lock",
                id: lock_id.to_string(),
            }),
            Some(lock) if lock.is_timer() => Err(ApiError::Server {
                status: 403,
                code: Some("FORBIDDEN".to_string()),
                message: Some("timer locks cannot be deleted".to_string()),
            }),
            Some(_) => {
                store.locks.remove(lock_id);
                for problem in store.problems.values_mut() {
                    if problem.lock_id.as_deref() == Some(lock_id) {
                        problem.lock_id = None;
                    }
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ProblemService for InMemoryBackend {
    async fn update_metadata(
        &self,
        problem_id: ProblemId,
        update: &ProblemMetadataUpdate,
    ) -> Result<Problem, ApiError> {
        let mut store = self.store();
        store.calls.push(BackendCall::UpdateProblem {
            problem_id,
            lock_id: update.lock_id.clone(),
        });
        store.check(FailPoint::UpdateProblem)?;

        let target = match update.lock_id.as_deref().filter(|id| !id.is_empty()) {
            Some(lock_id) => Some(store.locks.get(lock_id).cloned().ok_or_else(|| {
                ApiError::NotFound {
                    resource: "lock",
                    id: lock_id.to_string(),
                }
            })?),
            None => None,
        };

        let strict = self.strict_timer_transitions;
        let problem = store
            .problems
            .get_mut(&problem_id)
            .ok_or_else(|| ApiError::NotFound {
                resource: "problem",
                id: problem_id.to_string(),
            })?;

        if strict && problem.is_unlocked() && target.as_ref().is_some_and(Lock::is_timer) {
            return Err(ApiError::Server {
                status: 400,
                code: Some("INVALID_TRANSITION".to_string()),
                message: Some(
                    "an unlocked problem cannot be moved directly to a timer lock".to_string(),
                ),
            });
        }

        problem.title = update.title.clone();
        problem.difficulty = update.difficulty;
        problem.evaluator = update.evaluator;
        problem.lock_id = target.map(|lock| lock.lock_id);
        problem.updated_at = Some(Utc::now());
        Ok(problem.clone())
    }

    async fn search(&self, request: &SearchProblemsRequest) -> Result<Vec<Problem>, ApiError> {
        let mut store = self.store();
        store.calls.push(BackendCall::SearchProblems);

        let needle = request.title.as_deref().map(str::to_lowercase);
        let page_size = request.page_size.max(1) as usize;
        let skip = request.page_number.saturating_sub(1) as usize * page_size;

        Ok(store
            .problems
            .values()
            .filter(|p| {
                request
                    .problem_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&p.id))
            })
            .filter(|p| {
                needle
                    .as_deref()
                    .map_or(true, |n| p.title.to_lowercase().contains(n))
            })
            .filter(|p| {
                request
                    .lock_id
                    .as_ref()
                    .map_or(true, |id| p.lock_id.as_ref() == Some(id))
            })
            .filter(|p| request.evaluator.map_or(true, |e| p.evaluator == e))
            .skip(skip)
            .take(page_size)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ContestService for InMemoryBackend {
    async fn create(&self, request: &CreateContestRequest) -> Result<Contest, ApiError> {
        let mut store = self.store();
        let details = &request.contest_details;
        store.calls.push(BackendCall::CreateContest {
            title: details.title.clone(),
        });
        store.check(FailPoint::CreateContest)?;

        if let Some(lock_id) = details.lock_id.as_deref() {
            if !store.locks.contains_key(lock_id) {
                return Err(ApiError::NotFound {
                    resource: "lock",
                    id: lock_id.to_string(),
                });
            }
        }
        if let Some(missing) = request
            .problems
            .iter()
            .find(|entry| !store.problems.contains_key(&entry.problem_id))
        {
            return Err(ApiError::NotFound {
                resource: "problem",
                id: missing.problem_id.to_string(),
            });
        }

        let now = Utc::now();
        let contest = Contest {
            contest_id: store.next_id("contest"),
            title: details.title.clone(),
            created_by: "dry-run".to_string(),
            created_at: Some(now),
            updated_at: Some(now),
            start_time: details.start_time,
            end_time: details.end_time,
            is_published: details.is_published,
            lock_id: details.lock_id.clone(),
        };
        store.contests.push(contest.clone());
        Ok(contest)
    }
}
