use anyhow::Result;

use super::Command;
use crate::config::FluxConfig;

pub struct ConfigShowCommand {
    config: FluxConfig,
}

impl ConfigShowCommand {
    pub fn new(config: FluxConfig) -> Self {
        Self { config }
    }
}

impl Command for ConfigShowCommand {
    async fn execute(&self) -> Result<()> {
        println!("⚙️  EFFECTIVE CONFIGURATION");
        println!("==========================");
        let shown = FluxConfig {
            api: self.config.api.redacted(),
            ..self.config.clone()
        };
        print!("{}", toml::to_string_pretty(&shown)?);
        Ok(())
    }
}
