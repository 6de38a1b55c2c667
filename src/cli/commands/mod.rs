use anyhow::Result;

use crate::api::Services;
use crate::config::FluxConfig;

pub mod config;
pub mod create;
pub mod locks;
pub mod problems;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// HTTP services for the configured backend, logged in when credentials are set
pub async fn connect(config: &FluxConfig) -> Result<Services> {
    print!("🔄 Connecting to {}... ", config.api.base_url);
    std::io::Write::flush(&mut std::io::stdout())?;

    match Services::connect(&config.api).await {
        Ok(services) => {
            println!("✅");
            Ok(services)
        }
        Err(e) => {
            println!("❌ {e}");
            Err(e.into())
        }
    }
}

pub fn show_how_to_get_started() -> Result<()> {
    println!("🏁 Flux - Contest creation");
    println!();
    println!("To get started:");
    println!("  📝 flux create plan.toml --dry-run   # Preview a contest submission");
    println!("  🚀 flux create plan.toml             # Create the contest");
    println!("  🔒 flux locks search                 # Browse locks");
    println!("  ⏱️  flux locks create --name Finals --type timer --timeout 2026-11-01T18:00:00Z");
    println!("  🧩 flux problems search --title dp   # Find problems for the plan");
    println!("  ⚙️  flux config show                  # Effective configuration");
    println!();
    println!("💡 Run 'flux --help' for every option");
    Ok(())
}
