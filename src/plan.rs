// Contest plan files
//
// A plan is a TOML description of a contest that gets replayed through the
// wizard exactly as an operator would fill it in:
//
//     title = "Spring Cup"
//     start_time = "2026-05-01T10:00:00Z"
//     end_time = "2026-05-01T13:00:00Z"
//     lock_id = "b2a1..."
//     published = false
//     timer_based = false
//     users = ["alice", "bob"]
//
//     [[problems]]
//     id = 12
//     score = 500
//
// Timestamps are RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::api::types::{Lock, Problem, ProblemId, SearchProblemsRequest};
use crate::api::{ApiError, Services};
use crate::wizard::{ConfigUpdate, ContestWizard, WizardAction, WizardStep};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestPlan {
    pub title: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub lock_id: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub timer_based: bool,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub problems: Vec<PlanProblem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanProblem {
    pub id: ProblemId,
    /// Overrides the difficulty-derived default
    pub score: Option<u32>,
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Failed to read plan {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid plan: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Problem {0} does not exist")]
    UnknownProblem(ProblemId),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Plan rejected at the {step} step: {reason}")]
    Rejected { step: WizardStep, reason: String },
}

/// Server-side entities a plan refers to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPlan {
    pub lock: Option<Lock>,
    /// In plan order
    pub problems: Vec<Problem>,
}

impl ContestPlan {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str(content)?)
    }

    fn lock_id(&self) -> Option<&str> {
        self.lock_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Fetch the lock and problems the plan names
    pub async fn resolve(&self, services: &Services) -> Result<ResolvedPlan, PlanError> {
        let lock = match self.lock_id() {
            Some(lock_id) => Some(services.locks.get_by_id(lock_id).await?),
            None => None,
        };

        let mut problems = Vec::with_capacity(self.problems.len());
        if !self.problems.is_empty() {
            let ids: Vec<_> = self.problems.iter().map(|p| p.id).collect();
            let request = SearchProblemsRequest {
                page_size: ids.len() as u32,
                problem_ids: Some(ids),
                ..SearchProblemsRequest::default()
            };
            let found = services.problems.search(&request).await?;
            for entry in &self.problems {
                let problem = found
                    .iter()
                    .find(|p| p.id == entry.id)
                    .ok_or(PlanError::UnknownProblem(entry.id))?;
                problems.push(problem.clone());
            }
        }

        Ok(ResolvedPlan { lock, problems })
    }

    /// Walk the wizard from CONFIG to REVIEW
    pub fn apply(&self, resolved: &ResolvedPlan, wizard: &mut ContestWizard) -> Result<(), PlanError> {
        wizard.dispatch(WizardAction::UpdateConfig(ConfigUpdate::Title(self.title.clone())));
        if self.start_time.is_some() {
            wizard.dispatch(WizardAction::UpdateConfig(ConfigUpdate::StartTime(self.start_time)));
        }
        if self.end_time.is_some() {
            wizard.dispatch(WizardAction::UpdateConfig(ConfigUpdate::EndTime(self.end_time)));
        }
        wizard.dispatch(WizardAction::UpdateConfig(ConfigUpdate::Published(self.published)));
        wizard.dispatch(WizardAction::UpdateConfig(ConfigUpdate::TimerBased(self.timer_based)));
        // Last, so a timer lock's derived end time wins
        wizard.dispatch(WizardAction::SelectLock(resolved.lock.clone()));
        advance(wizard)?;

        for (entry, problem) in self.problems.iter().zip(&resolved.problems) {
            wizard.dispatch(WizardAction::AddProblem(problem.clone()));
            if let Some(score) = entry.score {
                wizard.dispatch(WizardAction::UpdateScore {
                    problem_id: problem.id,
                    score,
                });
            }
        }
        advance(wizard)?;

        wizard.dispatch(WizardAction::SetUsers(self.users.clone()));
        advance(wizard)?;

        info!(title = %self.title, problems = resolved.problems.len(), "Plan applied");
        Ok(())
    }
}

fn advance(wizard: &mut ContestWizard) -> Result<(), PlanError> {
    if wizard.try_advance() {
        return Ok(());
    }
    let state = wizard.state();
    let reason = state.error.clone().unwrap_or_else(|| match state.step {
        WizardStep::Config => "Title is required".to_string(),
        WizardStep::Problems => "At least one problem is required".to_string(),
        step => format!("Cannot leave the {step} step"),
    });
    Err(PlanError::Rejected {
        step: state.step,
        reason,
    })
}
