// Core types for the contest wizard state machine

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

use crate::api::types::{LockType, Problem, ProblemId};

/// Wizard steps, in forward order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    Config,
    Problems,
    Users,
    Review,
    /// Terminal, reached only through a successful submission
    Success,
}

impl WizardStep {
    /// Steps an operator navigates between
    pub const FORM_STEPS: [WizardStep; 4] = [
        WizardStep::Config,
        WizardStep::Problems,
        WizardStep::Users,
        WizardStep::Review,
    ];

    pub fn next(self) -> Option<Self> {
        match self {
            WizardStep::Config => Some(WizardStep::Problems),
            WizardStep::Problems => Some(WizardStep::Users),
            WizardStep::Users => Some(WizardStep::Review),
            WizardStep::Review | WizardStep::Success => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            WizardStep::Problems => Some(WizardStep::Config),
            WizardStep::Users => Some(WizardStep::Problems),
            WizardStep::Review => Some(WizardStep::Users),
            WizardStep::Config | WizardStep::Success => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Config => "CONFIG",
            WizardStep::Problems => "PROBLEMS",
            WizardStep::Users => "USERS",
            WizardStep::Review => "REVIEW",
            WizardStep::Success => "SUCCESS",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Draft of the contest being created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestConfig {
    pub title: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Empty when no lock is selected
    pub lock_id: String,
    pub lock_type: Option<LockType>,
    pub is_published: bool,
    pub is_timer_based: bool,
}

impl ContestConfig {
    pub fn has_lock(&self) -> bool {
        !self.lock_id.is_empty()
    }
}

/// One field of [`ContestConfig`] with its new value
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigUpdate {
    Title(String),
    StartTime(Option<DateTime<Utc>>),
    EndTime(Option<DateTime<Utc>>),
    LockId(String),
    Published(bool),
    TimerBased(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedProblem {
    pub meta: Problem,
    pub custom_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: WizardStep,
    pub is_submitting: bool,
    pub status_message: Option<String>,
    pub error: Option<String>,
    pub config: ContestConfig,
    /// Unique by problem id; order is display order
    pub selected_problems: Vec<SelectedProblem>,
    pub user_names: Vec<String>,
}

impl WizardState {
    /// Fresh session: starts at the next whole hour, runs three hours
    pub fn new(now: DateTime<Utc>) -> Self {
        let start = now
            .duration_trunc(Duration::hours(1))
            .map(|hour| hour + Duration::hours(1))
            .unwrap_or(now);

        Self {
            step: WizardStep::Config,
            is_submitting: false,
            status_message: None,
            error: None,
            config: ContestConfig {
                title: String::new(),
                start_time: Some(start),
                end_time: Some(start + Duration::hours(3)),
                lock_id: String::new(),
                lock_type: None,
                is_published: false,
                is_timer_based: false,
            },
            selected_problems: Vec::new(),
            user_names: Vec::new(),
        }
    }

    pub fn contains_problem(&self, problem_id: ProblemId) -> bool {
        self.selected_problems
            .iter()
            .any(|selected| selected.meta.id == problem_id)
    }

    pub fn total_score(&self) -> u64 {
        self.selected_problems
            .iter()
            .map(|selected| u64::from(selected.custom_score))
            .sum()
    }
}

/// Display letter of the problem at `index`: A..Z, then AA, AB, ...
pub fn problem_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}
