use anyhow::{anyhow, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use super::{connect, Command};
use crate::api::{InMemoryBackend, Services};
use crate::config::FluxConfig;
use crate::orchestrator::{SubmissionOrchestrator, SubmissionReport};
use crate::plan::ContestPlan;
use crate::wizard::{problem_letter, ContestWizard, WizardState};

pub struct CreateCommand {
    config: FluxConfig,
    plan_path: PathBuf,
    dry_run: bool,
}

impl CreateCommand {
    pub fn new(config: FluxConfig, plan_path: PathBuf) -> Self {
        Self {
            config,
            plan_path,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Command for CreateCommand {
    async fn execute(&self) -> Result<()> {
        let plan = ContestPlan::load(&self.plan_path)?;
        println!("📝 Loaded plan '{}' from {}", plan.title, self.plan_path.display());

        let services = connect(&self.config).await?;
        let resolved = plan.resolve(&services).await?;

        let mut wizard = ContestWizard::new(&self.config.wizard, Utc::now());
        plan.apply(&resolved, &mut wizard)?;
        print_review(wizard.state());

        let (run_services, backend) = if self.dry_run {
            println!("🧪 DRY RUN: replaying against an in-memory copy, the server is not modified");
            let backend = Arc::new(InMemoryBackend::seeded(
                resolved.lock.clone().into_iter().collect(),
                resolved.problems.clone(),
            ));
            (Services::in_memory(backend.clone()), Some(backend))
        } else {
            (services, None)
        };

        let orchestrator = SubmissionOrchestrator::new(run_services, &self.config.wizard);

        // Only the latest status is kept by the channel; intermediate ones may be skipped
        let mut updates = wizard.subscribe();
        let printer = tokio::spawn(async move {
            let mut last = None;
            while updates.changed().await.is_ok() {
                let message = updates.borrow_and_update().status_message.clone();
                if message.is_some() && message != last {
                    if let Some(text) = &message {
                        println!("   ⏳ {text}");
                    }
                    last = message;
                }
            }
        });

        println!();
        println!("🚀 Submitting contest...");
        let result = orchestrator.submit(&mut wizard).await;
        let final_state = wizard.into_state();
        printer.await.ok();

        match result {
            Ok(report) => {
                print_report(&report);
                if let Some(backend) = backend {
                    println!();
                    println!("📋 BACKEND CALLS ({}):", backend.calls().len());
                    for call in backend.calls() {
                        println!("   • {call:?}");
                    }
                }
                Ok(())
            }
            Err(e) => {
                let message = final_state
                    .error
                    .unwrap_or_else(|| e.user_message());
                println!("❌ Contest creation failed: {message}");
                println!("   💡 Fix the cause and run the same plan again; problems already moved are skipped");
                Err(anyhow!(e))
            }
        }
    }
}

fn print_review(state: &WizardState) {
    let config = &state.config;
    println!();
    println!("🏁 REVIEW: {}", config.title);
    println!("────────────────────");
    match config.start_time {
        Some(start) if !(config.is_timer_based && config.has_lock()) => {
            println!("   📅 Starts: {}", start.to_rfc3339());
        }
        _ => println!("   📅 Starts: when the lock opens"),
    }
    if let Some(end) = config.end_time {
        println!("   🏁 Ends: {}", end.to_rfc3339());
    }
    if config.has_lock() {
        println!("   🔒 Lock: {}", config.lock_id);
    } else if config.is_published {
        println!("   🔒 Lock: generated on submit");
    }
    println!(
        "   👁️  Visibility: {}",
        if config.is_published { "published" } else { "private" }
    );

    println!("   🧩 Problems:");
    for (index, selected) in state.selected_problems.iter().enumerate() {
        println!(
            "      {}. {} ({} pts)",
            problem_letter(index),
            selected.meta.title,
            selected.custom_score
        );
    }
    println!("   🧮 Total score: {}", state.total_score());
    if !state.user_names.is_empty() {
        println!("   👥 Participants: {}", state.user_names.join(", "));
    }
}

fn print_report(report: &SubmissionReport) {
    println!();
    println!("✅ Contest '{}' created", report.contest.title);
    println!("   🆔 Contest ID: {}", report.contest.contest_id);
    if let Some(lock_id) = &report.lock_id {
        println!("   🔒 Lock: {lock_id}");
    }
    if let Some(lock) = &report.auto_lock {
        println!("   ⚙️  Auto-generated lock: {}", lock.name);
        if !report.schedule_adjusted {
            println!("   ⚠️  Lock timeout still holds the placeholder; set it to the start time by hand");
        }
    }
    if let Some(bridge) = &report.bridge_lock {
        println!("   🌉 Bridge lock used: {}", bridge.name);
    }
    println!("   🧩 Problems moved onto the lock: {}", report.problems_relocked);
    println!("   🔗 Correlation ID: {}", report.correlation_id);
}
