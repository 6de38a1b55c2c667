pub mod bridge;
pub mod submission;

pub use bridge::{bridge_lock_request, plan_lock_sync, BridgePolicy, LockSyncPlan};
pub use submission::{
    build_contest_request, SubmissionError, SubmissionOrchestrator, SubmissionPhase,
    SubmissionReport,
};
