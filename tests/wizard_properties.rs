// Property-based tests for the wizard reducer
// Random action sequences must never break the step chain or the cart invariants

use chrono::{DateTime, Duration, TimeZone, Utc};
use flux_contests::api::types::{Evaluator, Lock, LockType, Problem};
use flux_contests::wizard::{
    can_proceed, reduce, ConfigUpdate, WizardAction, WizardState, WizardStep,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap()
}

fn problem_strategy() -> impl Strategy<Value = Problem> {
    (1u64..=6, 0u32..=3000, prop::option::of(Just("lock-a".to_string()))).prop_map(
        |(id, difficulty, lock_id)| Problem {
            id,
            title: format!("P{id}"),
            difficulty,
            evaluator: Evaluator::Codeforces,
            lock_id,
            created_by: "setter".to_string(),
            created_at: None,
            updated_at: None,
        },
    )
}

fn lock_strategy() -> impl Strategy<Value = Lock> {
    (prop::bool::ANY, -48i64..=96).prop_map(|(timer, offset_hours)| Lock {
        lock_id: if timer { "lock-t" } else { "lock-m" }.to_string(),
        name: "lock".to_string(),
        lock_type: if timer { LockType::Timer } else { LockType::Manual },
        created_by: "admin".to_string(),
        created_at: None,
        timeout: timer.then(|| base_time() + Duration::hours(offset_hours)),
        description: String::new(),
    })
}

fn time_strategy() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    prop::option::of((-24i64..=24).prop_map(|h| base_time() + Duration::hours(h)))
}

fn action_strategy() -> impl Strategy<Value = WizardAction> {
    prop_oneof![
        prop_oneof![Just(String::new()), Just("Cup".to_string())]
            .prop_map(|t| WizardAction::UpdateConfig(ConfigUpdate::Title(t))),
        time_strategy().prop_map(|t| WizardAction::UpdateConfig(ConfigUpdate::StartTime(t))),
        time_strategy().prop_map(|t| WizardAction::UpdateConfig(ConfigUpdate::EndTime(t))),
        prop::bool::ANY.prop_map(|b| WizardAction::UpdateConfig(ConfigUpdate::Published(b))),
        prop::bool::ANY.prop_map(|b| WizardAction::UpdateConfig(ConfigUpdate::TimerBased(b))),
        prop::option::of(lock_strategy()).prop_map(WizardAction::SelectLock),
        Just(WizardAction::ToggleTimerMode),
        problem_strategy().prop_map(WizardAction::AddProblem),
        (1u64..=6).prop_map(WizardAction::RemoveProblem),
        (1u64..=6, 0u32..=1000)
            .prop_map(|(problem_id, score)| WizardAction::UpdateScore { problem_id, score }),
        prop::collection::vec("[a-c ]{0,3}", 0..4).prop_map(WizardAction::SetUsers),
        Just(WizardAction::NextStep),
        Just(WizardAction::NextStep),
        Just(WizardAction::PrevStep),
        Just(WizardAction::SubmitStart),
        Just(WizardAction::SubmitUpdate("working".to_string())),
        Just(WizardAction::SubmitSuccess),
        Just(WizardAction::SubmitFail("boom".to_string())),
    ]
}

fn step_index(step: WizardStep) -> i32 {
    match step {
        WizardStep::Config => 0,
        WizardStep::Problems => 1,
        WizardStep::Users => 2,
        WizardStep::Review => 3,
        WizardStep::Success => 4,
    }
}

proptest! {
    #[test]
    fn step_moves_one_link_at_a_time(actions in prop::collection::vec(action_strategy(), 0..60)) {
        let mut state = WizardState::new(base_time());
        for action in actions {
            let before = state.step;
            let is_success = matches!(action, WizardAction::SubmitSuccess);
            state = reduce(state, action);

            let delta = step_index(state.step) - step_index(before);
            prop_assert!(delta.abs() <= 1, "{:?} -> {:?}", before, state.step);
            if state.step == WizardStep::Success && before != WizardStep::Success {
                prop_assert!(is_success);
                prop_assert_eq!(before, WizardStep::Review);
            }
        }
    }

    #[test]
    fn cart_never_holds_duplicates(actions in prop::collection::vec(action_strategy(), 0..60)) {
        let state = actions.into_iter().fold(WizardState::new(base_time()), reduce);
        let ids: HashSet<_> = state.selected_problems.iter().map(|p| p.meta.id).collect();
        prop_assert_eq!(ids.len(), state.selected_problems.len());
    }

    #[test]
    fn published_contests_stay_timer_based(actions in prop::collection::vec(action_strategy(), 0..60)) {
        let state = actions.into_iter().fold(WizardState::new(base_time()), reduce);
        if state.config.is_published {
            prop_assert!(state.config.is_timer_based);
            let toggled = reduce(state, WizardAction::ToggleTimerMode);
            prop_assert!(toggled.config.is_timer_based);
        }
    }

    #[test]
    fn timer_lock_fixes_end_time(
        prefix in prop::collection::vec(action_strategy(), 0..30),
        offset_hours in -48i64..=96,
    ) {
        let state = prefix.into_iter().fold(WizardState::new(base_time()), reduce);
        prop_assume!(state.step != WizardStep::Success);

        let timeout = base_time() + Duration::hours(offset_hours);
        let lock = Lock {
            lock_id: "lock-t".to_string(),
            name: "timer".to_string(),
            lock_type: LockType::Timer,
            created_by: "admin".to_string(),
            created_at: None,
            timeout: Some(timeout),
            description: String::new(),
        };
        let state = reduce(state, WizardAction::SelectLock(Some(lock)));

        prop_assert!(state.config.is_timer_based);
        prop_assert_eq!(state.config.end_time, Some(timeout + Duration::hours(2)));
    }

    #[test]
    fn clearing_lock_resets_selection(prefix in prop::collection::vec(action_strategy(), 0..30)) {
        let state = prefix.into_iter().fold(WizardState::new(base_time()), reduce);
        prop_assume!(state.step != WizardStep::Success);

        let state = reduce(state, WizardAction::SelectLock(None));
        prop_assert_eq!(state.config.lock_id.as_str(), "");
        prop_assert_eq!(state.config.lock_type, None);
    }

    #[test]
    fn empty_title_blocks_config_step(prefix in prop::collection::vec(action_strategy(), 0..30)) {
        let mut state = prefix.into_iter().fold(WizardState::new(base_time()), reduce);
        prop_assume!(state.step == WizardStep::Config && !state.is_submitting);
        state.config.title.clear();

        let next = reduce(state, WizardAction::NextStep);
        prop_assert_eq!(next.step, WizardStep::Config);
        prop_assert_eq!(next.error.as_deref(), Some("Title is required"));
        prop_assert!(!can_proceed(&next));
    }
}

#[test]
fn scenario_a_problems_step_waits_for_a_problem() {
    let t0 = base_time();
    let actions = vec![
        WizardAction::UpdateConfig(ConfigUpdate::Title("Cup".to_string())),
        WizardAction::UpdateConfig(ConfigUpdate::StartTime(Some(t0))),
        WizardAction::UpdateConfig(ConfigUpdate::EndTime(Some(t0 + Duration::hours(3)))),
        WizardAction::NextStep,
    ];
    let state = actions.into_iter().fold(WizardState::new(t0), reduce);
    assert_eq!(state.step, WizardStep::Problems);
    assert!(!can_proceed(&state));

    let state = reduce(
        state,
        WizardAction::AddProblem(Problem {
            id: 1,
            title: "A+B".to_string(),
            difficulty: 800,
            evaluator: Evaluator::Codeforces,
            lock_id: None,
            created_by: "setter".to_string(),
            created_at: None,
            updated_at: None,
        }),
    );
    assert!(can_proceed(&state));
}
