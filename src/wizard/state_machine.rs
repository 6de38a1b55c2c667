use chrono::Duration;
use thiserror::Error;

use crate::api::types::{Lock, Problem, ProblemId};
use crate::config::WizardConfig;
use crate::wizard::types::*;

#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    UpdateConfig(ConfigUpdate),
    SelectLock(Option<Lock>),
    ToggleTimerMode,
    AddProblem(Problem),
    RemoveProblem(ProblemId),
    UpdateScore { problem_id: ProblemId, score: u32 },
    SetUsers(Vec<String>),
    NextStep,
    PrevStep,
    SubmitStart,
    SubmitUpdate(String),
    SubmitSuccess,
    SubmitFail(String),
}

/// Reasons `NextStep` refuses to leave the config step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    TitleRequired,
    #[error("End time is required")]
    EndTimeRequired,
    #[error("Timer based contests require a Lock")]
    LockRequired,
    #[error("Start time must be before End time")]
    StartNotBeforeEnd,
}

/// Tunables the reducer reads
#[derive(Debug, Clone, PartialEq)]
pub struct WizardRules {
    /// Added to a timer lock's timeout to derive the contest end
    pub timer_end_buffer: Duration,
    /// Score for problems without a difficulty
    pub default_problem_score: u32,
}

impl Default for WizardRules {
    fn default() -> Self {
        Self {
            timer_end_buffer: Duration::hours(2),
            default_problem_score: 100,
        }
    }
}

impl From<&WizardConfig> for WizardRules {
    fn from(config: &WizardConfig) -> Self {
        Self {
            timer_end_buffer: Duration::hours(config.timer_end_buffer_hours),
            default_problem_score: config.default_problem_score,
        }
    }
}

/// Pure transition function with the default rules
pub fn reduce(state: WizardState, action: WizardAction) -> WizardState {
    reduce_with(&WizardRules::default(), state, action)
}

pub fn reduce_with(rules: &WizardRules, mut state: WizardState, action: WizardAction) -> WizardState {
    // Terminal: a finished wizard only gets discarded
    if state.step == WizardStep::Success {
        return state;
    }

    match action {
        WizardAction::UpdateConfig(update) => {
            state.error = None;
            apply_config_update(&mut state.config, update);
            state
        }

        WizardAction::SelectLock(None) => {
            state.config.lock_id.clear();
            state.config.lock_type = None;
            state
        }

        WizardAction::SelectLock(Some(lock)) => {
            if lock.is_timer() {
                state.config.is_timer_based = true;
                if let Some(timeout) = lock.timeout {
                    state.config.end_time = Some(timeout + rules.timer_end_buffer);
                }
            }
            state.config.lock_type = Some(lock.lock_type);
            state.config.lock_id = lock.lock_id;
            state
        }

        WizardAction::ToggleTimerMode => {
            if !state.config.is_published {
                state.config.is_timer_based = !state.config.is_timer_based;
            }
            state
        }

        WizardAction::AddProblem(problem) => {
            if state.contains_problem(problem.id) {
                return state;
            }
            let custom_score = if problem.difficulty == 0 {
                rules.default_problem_score
            } else {
                problem.difficulty
            };
            state.selected_problems.push(SelectedProblem {
                meta: problem,
                custom_score,
            });
            state
        }

        WizardAction::RemoveProblem(problem_id) => {
            state
                .selected_problems
                .retain(|selected| selected.meta.id != problem_id);
            state
        }

        WizardAction::UpdateScore { problem_id, score } => {
            if let Some(selected) = state
                .selected_problems
                .iter_mut()
                .find(|selected| selected.meta.id == problem_id)
            {
                selected.custom_score = score;
            }
            state
        }

        WizardAction::SetUsers(names) => {
            state.user_names = normalize_user_names(names);
            state
        }

        WizardAction::NextStep => {
            if state.is_submitting {
                return state;
            }
            if state.step == WizardStep::Config {
                if let Err(e) = validate_config(&state.config) {
                    state.error = Some(e.to_string());
                    return state;
                }
            }
            if let Some(next) = state.step.next() {
                state.step = next;
                state.error = None;
            }
            state
        }

        WizardAction::PrevStep => {
            if state.is_submitting {
                return state;
            }
            if let Some(previous) = state.step.previous() {
                state.step = previous;
            }
            state
        }

        WizardAction::SubmitStart => {
            if state.step == WizardStep::Review {
                state.is_submitting = true;
                state.error = None;
                state.status_message = Some("Initiating...".to_string());
            }
            state
        }

        WizardAction::SubmitUpdate(message) => {
            if state.is_submitting {
                state.status_message = Some(message);
            }
            state
        }

        WizardAction::SubmitSuccess => {
            if state.is_submitting && state.step == WizardStep::Review {
                state.is_submitting = false;
                state.step = WizardStep::Success;
                state.status_message = None;
            }
            state
        }

        WizardAction::SubmitFail(error) => {
            state.is_submitting = false;
            state.error = Some(error);
            state.status_message = None;
            state
        }
    }
}

fn apply_config_update(config: &mut ContestConfig, update: ConfigUpdate) {
    match update {
        ConfigUpdate::Title(title) => config.title = title,
        ConfigUpdate::StartTime(start) => config.start_time = start,
        ConfigUpdate::EndTime(end) => config.end_time = end,
        ConfigUpdate::LockId(lock_id) => {
            // A bare id carries no type; only SelectLock knows it
            if lock_id.is_empty() || lock_id != config.lock_id {
                config.lock_type = None;
            }
            config.lock_id = lock_id;
        }
        ConfigUpdate::Published(published) => {
            config.is_published = published;
            if published {
                config.is_timer_based = true;
            }
        }
        ConfigUpdate::TimerBased(timer_based) => {
            // Publishing pins timer mode on
            config.is_timer_based = timer_based || config.is_published;
        }
    }
}

fn normalize_user_names(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !unique.iter().any(|existing| existing == name) {
            unique.push(name.to_string());
        }
    }
    unique
}

/// Checks applied when leaving the config step, in order
pub fn validate_config(config: &ContestConfig) -> Result<(), ValidationError> {
    if config.title.is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    let end_time = config.end_time.ok_or(ValidationError::EndTimeRequired)?;
    if config.is_timer_based && !config.has_lock() {
        return Err(ValidationError::LockRequired);
    }
    if !config.is_timer_based && !config.is_published {
        if let Some(start_time) = config.start_time {
            if start_time >= end_time {
                return Err(ValidationError::StartNotBeforeEnd);
            }
        }
    }
    Ok(())
}

/// Gate for the "Next" affordance, independent of [`validate_config`]
pub fn can_proceed(state: &WizardState) -> bool {
    match state.step {
        WizardStep::Config => !state.config.title.is_empty(),
        WizardStep::Problems => !state.selected_problems.is_empty(),
        _ => true,
    }
}
