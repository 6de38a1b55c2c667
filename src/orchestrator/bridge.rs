// Bridge-lock workaround
//
// The backend refuses to move an unlocked problem straight onto a timer lock,
// while unlocked -> manual and locked -> anything are accepted. Unlocked
// problems headed for a timer lock therefore take a detour through a
// throwaway manual lock.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::api::types::{CreateLockRequest, LockType, Problem};
use crate::config::WizardConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgePolicy {
    pub enabled: bool,
    /// Pause between the bridge updates and the final pass
    pub settle_delay: Duration,
}

impl Default for BridgePolicy {
    fn default() -> Self {
        Self::from(&WizardConfig::default())
    }
}

impl From<&WizardConfig> for BridgePolicy {
    fn from(config: &WizardConfig) -> Self {
        Self {
            enabled: config.bridge_enabled,
            settle_delay: config.bridge_settle_delay(),
        }
    }
}

/// Problem updates needed to put a cart under one lock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockSyncPlan {
    /// Unlocked problems that go through the bridge lock first
    pub bridged: Vec<Problem>,
    /// Every problem not yet on the target lock, bridged ones included
    pub relocked: Vec<Problem>,
}

impl LockSyncPlan {
    pub fn is_empty(&self) -> bool {
        self.relocked.is_empty()
    }

    pub fn needs_bridge(&self) -> bool {
        !self.bridged.is_empty()
    }
}

pub fn plan_lock_sync<'a>(
    problems: impl IntoIterator<Item = &'a Problem>,
    target_lock_id: &str,
    target_is_timer: bool,
    policy: &BridgePolicy,
) -> LockSyncPlan {
    let relocked: Vec<Problem> = problems
        .into_iter()
        .filter(|problem| problem.lock_id.as_deref() != Some(target_lock_id))
        .cloned()
        .collect();

    let bridged = if target_is_timer && policy.enabled {
        relocked
            .iter()
            .filter(|problem| problem.is_unlocked())
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    LockSyncPlan { bridged, relocked }
}

pub fn bridge_lock_request(now: DateTime<Utc>) -> CreateLockRequest {
    CreateLockRequest {
        name: format!("Bridge {}", now.timestamp_millis()),
        description: "Temp transaction lock".to_string(),
        lock_type: LockType::Manual,
        timeout: None,
    }
}
