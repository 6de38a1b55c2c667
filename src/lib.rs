// Flux contest tooling
// Wizard state machine, lock-aware submission pipeline and the judge API clients

pub mod api;
pub mod cli;
pub mod config;
pub mod lock_view;
pub mod orchestrator;
pub mod plan;
pub mod telemetry;
pub mod wizard;

// Re-export key types for easy access
pub use crate::api::{ApiError, InMemoryBackend, Services};
pub use crate::config::{config, init_config, FluxConfig};
pub use crate::lock_view::{describe_timeout, LockView};
pub use crate::orchestrator::{BridgePolicy, SubmissionError, SubmissionOrchestrator, SubmissionReport};
pub use crate::plan::{ContestPlan, PlanError};
pub use crate::telemetry::{generate_correlation_id, init_telemetry};
pub use crate::wizard::{
    can_proceed, problem_letter, reduce, ContestWizard, WizardAction, WizardState, WizardStep,
};
