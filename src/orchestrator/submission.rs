use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, warn, Instrument};

use crate::api::errors::ApiError;
use crate::api::types::{
    Contest, ContestDetails, ContestProblemEntry, CreateContestRequest, CreateLockRequest, Lock,
    LockId, LockType, Problem, ProblemMetadataUpdate, SearchProblemsRequest, UpdateLockRequest,
};
use crate::api::Services;
use crate::config::WizardConfig;
use crate::orchestrator::bridge::{bridge_lock_request, plan_lock_sync, BridgePolicy};
use crate::telemetry::{create_submission_span, generate_correlation_id};
use crate::wizard::{ContestWizard, WizardAction, WizardState, WizardStep};

/// Phases of a submission, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    AutoLock,
    LockSync,
    ContestCreation,
    LockCorrection,
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionPhase::AutoLock => "auto lock generation",
            SubmissionPhase::LockSync => "problem lock sync",
            SubmissionPhase::ContestCreation => "contest creation",
            SubmissionPhase::LockCorrection => "lock correction",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Contest is not ready to submit from the {0} step")]
    NotReady(WizardStep),
    #[error("A submission is already running")]
    AlreadySubmitting,
    #[error("Start time is required")]
    MissingStartTime,
    #[error("End time is required")]
    MissingEndTime,
    #[error("{phase} failed: {source}")]
    Service {
        phase: SubmissionPhase,
        #[source]
        source: ApiError,
    },
}

impl SubmissionError {
    fn service(phase: SubmissionPhase) -> impl FnOnce(ApiError) -> Self {
        move |source| SubmissionError::Service { phase, source }
    }

    /// Text for the wizard's error banner
    pub fn user_message(&self) -> String {
        let message = match self {
            SubmissionError::Service { source, .. } => source.user_message(),
            other => other.to_string(),
        };
        message.replacen('\n', "", 1)
    }
}

/// What a successful submission did
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReport {
    pub correlation_id: String,
    pub contest: Contest,
    /// Lock the contest ended up under
    pub lock_id: Option<LockId>,
    pub auto_lock: Option<Lock>,
    pub bridge_lock: Option<Lock>,
    pub problems_relocked: usize,
    /// Whether the auto lock's timeout was moved to the real start time
    pub schedule_adjusted: bool,
}

/// Drives the multi-call contest creation.
///
/// The backend has no transaction spanning locks, problems and contests, so
/// the calls run as a fixed phase pipeline. A failure in phases 0-2 aborts
/// without rollback; a later attempt only touches problems still off-lock.
pub struct SubmissionOrchestrator {
    services: Services,
    policy: BridgePolicy,
    auto_lock_margin: Duration,
}

impl SubmissionOrchestrator {
    pub fn new(services: Services, config: &WizardConfig) -> Self {
        Self {
            services,
            policy: BridgePolicy::from(config),
            auto_lock_margin: Duration::hours(config.auto_lock_margin_hours),
        }
    }

    pub fn with_policy(mut self, policy: BridgePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &BridgePolicy {
        &self.policy
    }

    /// Submit from the review step, reporting progress and the outcome
    /// back into the wizard.
    pub async fn submit(
        &self,
        wizard: &mut ContestWizard,
    ) -> Result<SubmissionReport, SubmissionError> {
        if wizard.state().is_submitting {
            return Err(SubmissionError::AlreadySubmitting);
        }
        if !wizard.dispatch(WizardAction::SubmitStart).is_submitting {
            return Err(SubmissionError::NotReady(wizard.state().step));
        }

        let snapshot = wizard.state().clone();
        let result = self
            .execute(&snapshot, |message| {
                wizard.dispatch(WizardAction::SubmitUpdate(message));
            })
            .await;

        match &result {
            Ok(_) => wizard.dispatch(WizardAction::SubmitSuccess),
            Err(e) => wizard.dispatch(WizardAction::SubmitFail(e.user_message())),
        };
        result
    }

    /// Run all phases for `state`, calling `progress` before each one
    pub async fn execute<F>(
        &self,
        state: &WizardState,
        progress: F,
    ) -> Result<SubmissionReport, SubmissionError>
    where
        F: FnMut(String) + Send,
    {
        let correlation_id = generate_correlation_id();
        let span = create_submission_span(&state.config.title, &correlation_id);
        self.run(state, progress, correlation_id)
            .instrument(span)
            .await
    }

    async fn run<F>(
        &self,
        state: &WizardState,
        mut progress: F,
        correlation_id: String,
    ) -> Result<SubmissionReport, SubmissionError>
    where
        F: FnMut(String) + Send,
    {
        let config = &state.config;
        let needs_auto_lock = config.is_published && !config.has_lock();

        // Reject before any backend mutation
        if config.end_time.is_none() {
            return Err(SubmissionError::MissingEndTime);
        }
        let start_from_lock = config.is_timer_based && (config.has_lock() || needs_auto_lock);
        if !start_from_lock && config.start_time.is_none() {
            return Err(SubmissionError::MissingStartTime);
        }

        info!(
            problems = state.selected_problems.len(),
            users = state.user_names.len(),
            published = config.is_published,
            timer_based = config.is_timer_based,
            "Starting contest submission"
        );

        let result = self
            .run_phases(state, &mut progress, needs_auto_lock, correlation_id)
            .await;
        if let Err(e) = &result {
            error!(error = %e, "Contest submission aborted");
        }
        result
    }

    async fn run_phases<F>(
        &self,
        state: &WizardState,
        progress: &mut F,
        needs_auto_lock: bool,
        correlation_id: String,
    ) -> Result<SubmissionReport, SubmissionError>
    where
        F: FnMut(String) + Send,
    {
        let config = &state.config;

        // Phase 0
        let auto_lock = if needs_auto_lock {
            progress("Generating Access Lock...".to_string());
            Some(self.create_auto_lock(&config.title, Utc::now()).await?)
        } else {
            None
        };

        let final_lock_id: Option<LockId> = match &auto_lock {
            Some(lock) => Some(lock.lock_id.clone()),
            None => config.has_lock().then(|| config.lock_id.clone()),
        };

        // Phase 1. Besides the published/timer-mode flags, a selected timer
        // lock counts as a timer target even after timer mode is switched off.
        let target_is_timer = auto_lock.is_some()
            || config.is_published
            || config.is_timer_based
            || config.lock_type == Some(LockType::Timer);
        let (bridge_lock, problems_relocked) = match final_lock_id.as_deref() {
            Some(lock_id) => {
                progress("Securing problem set...".to_string());
                if state.selected_problems.is_empty() {
                    (None, 0)
                } else {
                    self.sync_problem_locks(state, lock_id, target_is_timer, progress)
                        .await?
                }
            }
            None => (None, 0),
        };

        // Phase 2
        progress("Creating contest...".to_string());
        let request = build_contest_request(state, final_lock_id.as_deref())?;
        let contest = self
            .services
            .contests
            .create(&request)
            .await
            .map_err(SubmissionError::service(SubmissionPhase::ContestCreation))?;
        info!(contest_id = %contest.contest_id, "Contest created");

        // Phase 3
        let schedule_adjusted = match (&auto_lock, config.start_time) {
            (Some(lock), Some(start_time)) => {
                progress("Adjusting schedule...".to_string());
                self.correct_auto_lock(lock, &config.title, start_time).await
            }
            (Some(lock), None) => {
                warn!(lock_id = %lock.lock_id, "No start time to pin on the auto lock");
                false
            }
            (None, _) => false,
        };

        Ok(SubmissionReport {
            correlation_id,
            contest,
            lock_id: final_lock_id,
            auto_lock,
            bridge_lock,
            problems_relocked,
            schedule_adjusted,
        })
    }

    async fn create_auto_lock(
        &self,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<Lock, SubmissionError> {
        let request = CreateLockRequest {
            name: auto_lock_name(title),
            description: "Auto-generated for contest.".to_string(),
            lock_type: LockType::Timer,
            timeout: Some(now + self.auto_lock_margin),
        };
        let lock = self
            .services
            .locks
            .create(&request)
            .await
            .map_err(SubmissionError::service(SubmissionPhase::AutoLock))?;
        info!(lock_id = %lock.lock_id, timeout = ?request.timeout, "Created auto lock");
        Ok(lock)
    }

    /// Phase 1. Returns the bridge lock, if one was needed, and the number of
    /// problems moved onto `lock_id`.
    async fn sync_problem_locks<F>(
        &self,
        state: &WizardState,
        lock_id: &str,
        target_is_timer: bool,
        progress: &mut F,
    ) -> Result<(Option<Lock>, usize), SubmissionError>
    where
        F: FnMut(String) + Send,
    {
        let phase = SubmissionPhase::LockSync;

        let cart = self
            .refresh_cart(state)
            .await
            .map_err(SubmissionError::service(phase))?;
        let plan = plan_lock_sync(&cart, lock_id, target_is_timer, &self.policy);
        if plan.is_empty() {
            debug!(lock_id, "Every problem already on the target lock");
            return Ok((None, 0));
        }

        let bridge_lock = if plan.needs_bridge() {
            progress("Applying security bridge...".to_string());
            let bridge = self
                .services
                .locks
                .create(&bridge_lock_request(Utc::now()))
                .await
                .map_err(SubmissionError::service(phase))?;
            info!(
                bridge_lock_id = %bridge.lock_id,
                problems = plan.bridged.len(),
                "Bridging unlocked problems"
            );

            let problems = &self.services.problems;
            let bridge_id = bridge.lock_id.as_str();
            try_join_all(plan.bridged.iter().map(|problem| {
                let update = ProblemMetadataUpdate::relock(problem, bridge_id);
                async move { problems.update_metadata(problem.id, &update).await }
            }))
            .await
            .map_err(SubmissionError::service(phase))?;

            tokio::time::sleep(self.policy.settle_delay).await;
            Some(bridge)
        } else {
            None
        };

        progress(format!("Securing {} problems...", plan.relocked.len()));
        for problem in &plan.relocked {
            let update = ProblemMetadataUpdate::relock(problem, lock_id);
            self.services
                .problems
                .update_metadata(problem.id, &update)
                .await
                .map_err(SubmissionError::service(phase))?;
            debug!(problem_id = problem.id, lock_id, "Problem locked");
        }

        Ok((bridge_lock, plan.relocked.len()))
    }

    /// Current server copy of each cart problem, in cart order. Problems the
    /// search does not return keep the metadata captured when they were added.
    async fn refresh_cart(&self, state: &WizardState) -> Result<Vec<Problem>, ApiError> {
        let ids: Vec<_> = state.selected_problems.iter().map(|p| p.meta.id).collect();
        let request = SearchProblemsRequest {
            page_size: ids.len().max(1) as u32,
            problem_ids: Some(ids),
            ..SearchProblemsRequest::default()
        };
        let mut current: HashMap<_, _> = self
            .services
            .problems
            .search(&request)
            .await?
            .into_iter()
            .map(|problem| (problem.id, problem))
            .collect();

        Ok(state
            .selected_problems
            .iter()
            .map(|selected| {
                current
                    .remove(&selected.meta.id)
                    .unwrap_or_else(|| selected.meta.clone())
            })
            .collect())
    }

    /// Phase 3. Failures are logged and swallowed: the contest already exists.
    async fn correct_auto_lock(&self, lock: &Lock, title: &str, start_time: DateTime<Utc>) -> bool {
        let request = UpdateLockRequest {
            lock_id: lock.lock_id.clone(),
            name: auto_lock_name(title),
            description: format!("Timer for contest {title}"),
            lock_type: LockType::Timer,
            timeout: Some(start_time),
        };
        match self.services.locks.update(&request).await {
            Ok(_) => {
                info!(lock_id = %lock.lock_id, %start_time, "Auto lock pinned to start time");
                true
            }
            Err(e) => {
                warn!(
                    lock_id = %lock.lock_id,
                    phase = %SubmissionPhase::LockCorrection,
                    error = %e,
                    "Failed to correct auto lock timeout"
                );
                false
            }
        }
    }
}

fn auto_lock_name(title: &str) -> String {
    format!("[Auto] {title}")
}

/// Phase 2 payload. The start time is left to the server when a timer
/// contest has a lock to derive it from.
pub fn build_contest_request(
    state: &WizardState,
    lock_id: Option<&str>,
) -> Result<CreateContestRequest, SubmissionError> {
    let config = &state.config;
    let end_time = config.end_time.ok_or(SubmissionError::MissingEndTime)?;
    let start_time = if config.is_timer_based && lock_id.is_some() {
        None
    } else {
        Some(config.start_time.ok_or(SubmissionError::MissingStartTime)?)
    };

    Ok(CreateContestRequest {
        contest_details: ContestDetails {
            title: config.title.clone(),
            start_time,
            end_time,
            is_published: config.is_published,
            lock_id: lock_id.map(str::to_string),
        },
        user_names: state.user_names.clone(),
        problems: state
            .selected_problems
            .iter()
            .map(|selected| ContestProblemEntry {
                problem_id: selected.meta.id,
                score: selected.custom_score,
            })
            .collect(),
    })
}
