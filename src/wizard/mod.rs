pub mod state_machine;
pub mod types;

pub use state_machine::{
    can_proceed, reduce, reduce_with, validate_config, ValidationError, WizardAction, WizardRules,
};
pub use types::{
    problem_letter, ConfigUpdate, ContestConfig, SelectedProblem, WizardState, WizardStep,
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use crate::config::WizardConfig;

/// One contest-creation session.
///
/// Owns the single [`WizardState`] and funnels every change through the
/// reducer. Observers get each new state through [`ContestWizard::subscribe`].
pub struct ContestWizard {
    state: WizardState,
    rules: WizardRules,
    updates: watch::Sender<WizardState>,
}

impl ContestWizard {
    pub fn new(config: &WizardConfig, now: DateTime<Utc>) -> Self {
        Self::with_rules(WizardRules::from(config), WizardState::new(now))
    }

    pub fn with_rules(rules: WizardRules, state: WizardState) -> Self {
        let (updates, _) = watch::channel(state.clone());
        Self {
            state,
            rules,
            updates,
        }
    }

    pub fn dispatch(&mut self, action: WizardAction) -> &WizardState {
        debug!(step = %self.state.step, ?action, "Wizard action");
        self.state = reduce_with(&self.rules, self.state.clone(), action);
        self.updates.send_replace(self.state.clone());
        &self.state
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn into_state(self) -> WizardState {
        self.state
    }

    pub fn rules(&self) -> &WizardRules {
        &self.rules
    }

    pub fn can_proceed(&self) -> bool {
        can_proceed(&self.state)
    }

    /// "Next" as an operator sees it: gated by [`can_proceed`], then by the
    /// reducer's own validation. Returns whether the step moved.
    pub fn try_advance(&mut self) -> bool {
        if !self.can_proceed() {
            return false;
        }
        let before = self.state.step;
        self.dispatch(WizardAction::NextStep).step != before
    }

    pub fn subscribe(&self) -> watch::Receiver<WizardState> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Evaluator, Problem};
    use chrono::TimeZone;

    fn wizard() -> ContestWizard {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 30, 0).unwrap();
        ContestWizard::new(&WizardConfig::default(), now)
    }

    #[test]
    fn test_try_advance_checks_both_gates() {
        let mut wizard = wizard();
        assert!(!wizard.try_advance());
        assert_eq!(wizard.state().error, None);

        wizard.dispatch(WizardAction::UpdateConfig(ConfigUpdate::Title("Cup".into())));
        wizard.dispatch(WizardAction::ToggleTimerMode);
        assert!(!wizard.try_advance());
        assert_eq!(
            wizard.state().error.as_deref(),
            Some("Timer based contests require a Lock")
        );

        wizard.dispatch(WizardAction::ToggleTimerMode);
        assert!(wizard.try_advance());
        assert_eq!(wizard.state().step, WizardStep::Problems);
        assert!(!wizard.try_advance());
    }

    #[test]
    fn test_rules_come_from_configuration() {
        let config = WizardConfig {
            timer_end_buffer_hours: 5,
            default_problem_score: 250,
            ..WizardConfig::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 30, 0).unwrap();
        let wizard = ContestWizard::new(&config, now);

        assert_eq!(wizard.rules().timer_end_buffer, chrono::Duration::hours(5));
        assert_eq!(wizard.rules().default_problem_score, 250);
    }

    #[test]
    fn test_subscribers_see_every_state() {
        let mut wizard = wizard();
        let mut rx = wizard.subscribe();

        wizard.dispatch(WizardAction::AddProblem(Problem {
            id: 5,
            title: "Five".into(),
            difficulty: 0,
            evaluator: Evaluator::Custom,
            lock_id: None,
            created_by: "setter".into(),
            created_at: None,
            updated_at: None,
        }));

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.selected_problems.len(), 1);
        assert_eq!(seen.selected_problems[0].custom_score, 100);
    }
}
