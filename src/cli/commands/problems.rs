use anyhow::Result;

use super::{connect, Command};
use crate::api::types::SearchProblemsRequest;
use crate::config::FluxConfig;

pub struct ProblemSearchCommand {
    config: FluxConfig,
    title: Option<String>,
}

impl ProblemSearchCommand {
    pub fn new(config: FluxConfig, title: Option<String>) -> Self {
        Self { config, title }
    }
}

impl Command for ProblemSearchCommand {
    async fn execute(&self) -> Result<()> {
        let services = connect(&self.config).await?;
        let request = SearchProblemsRequest {
            title: self.title.clone(),
            ..SearchProblemsRequest::default()
        };

        let problems = match services.problems.search(&request).await {
            Ok(problems) => problems,
            Err(e) => {
                println!("❌ Failed to search problems: {}", e.user_message());
                return Err(e.into());
            }
        };

        if problems.is_empty() {
            println!("🧩 No problems found");
            return Ok(());
        }

        println!();
        println!("🧩 PROBLEMS ({}):", problems.len());
        println!("────────────────────");
        for problem in &problems {
            let lock = match problem.lock_id.as_deref() {
                Some(lock_id) if !lock_id.is_empty() => format!("🔒 {lock_id}"),
                _ => "🔓 unlocked".to_string(),
            };
            println!(
                "  #{:<6} {} (difficulty {}, {}) {}",
                problem.id, problem.title, problem.difficulty, problem.evaluator, lock
            );
        }
        Ok(())
    }
}
