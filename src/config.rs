use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the Flux contest tools
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FluxConfig {
    /// Backend API settings
    pub api: ApiConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Contest wizard and submission settings
    pub wizard: WizardConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Per-request timeout
    pub timeout_ms: u64,
    /// Existing `jwt_session` cookie value, e.g. copied from a browser session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
    /// Credentials for `POST /auth/login`, used when no session cookie is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_ms: 30_000,
            session_cookie: None,
            username: None,
            password: None,
        }
    }
}

impl ApiConfig {
    /// Copy safe to print: secrets are masked
    pub fn redacted(&self) -> Self {
        let mask = |value: &Option<String>| value.as_ref().map(|_| "********".to_string());
        Self {
            session_cookie: mask(&self.session_cookie),
            password: mask(&self.password),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON log lines instead of the compact format
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Route unlocked problems through a manual lock before a timer lock
    pub bridge_enabled: bool,
    /// Pause after the bridge updates so the backend store catches up
    pub bridge_settle_ms: u64,
    /// Placeholder timeout of auto-generated locks, in hours from now
    pub auto_lock_margin_hours: i64,
    /// Contest end derived from a timer lock: timeout plus this many hours
    pub timer_end_buffer_hours: i64,
    /// Score given to problems whose difficulty is zero
    pub default_problem_score: u32,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            bridge_enabled: true,
            bridge_settle_ms: 200,
            auto_lock_margin_hours: 26,
            timer_end_buffer_hours: 2,
            default_problem_score: 100,
        }
    }
}

impl WizardConfig {
    pub fn bridge_settle_delay(&self) -> Duration {
        Duration::from_millis(self.bridge_settle_ms)
    }
}

impl FluxConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (flux.toml, .flux-rc)
    /// 3. Environment variables (prefixed with FLUX__, e.g. FLUX__API__BASE_URL)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&FluxConfig::default())?);

        if Path::new("flux.toml").exists() {
            builder = builder.add_source(File::with_name("flux"));
        }

        if Path::new(".flux-rc").exists() {
            builder = builder.add_source(File::new(".flux-rc", config::FileFormat::Toml));
        }

        builder = builder.add_source(Self::environment());

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load from an explicit TOML file, still honouring environment overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Config::builder()
            .add_source(Config::try_from(&FluxConfig::default())?)
            .add_source(File::from(path).format(config::FileFormat::Toml))
            .add_source(Self::environment())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    fn environment() -> Environment {
        Environment::with_prefix("FLUX")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<FluxConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = FluxConfig::load_env_file();
        FluxConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static FluxConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = FluxConfig::default();
        assert_eq!(config.api.timeout_ms, 30_000);
        assert!(config.wizard.bridge_enabled);
        assert_eq!(config.wizard.bridge_settle_delay(), Duration::from_millis(200));
        assert_eq!(config.wizard.auto_lock_margin_hours, 26);
        assert_eq!(config.wizard.timer_end_buffer_hours, 2);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[api]\nbase_url = \"https://judge.example.org/api\"").unwrap();
        writeln!(file, "[wizard]\nbridge_enabled = false").unwrap();

        let config = FluxConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://judge.example.org/api");
        assert_eq!(config.api.timeout_ms, 30_000);
        assert!(!config.wizard.bridge_enabled);
        assert_eq!(config.wizard.bridge_settle_ms, 200);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flux.toml");

        let mut config = FluxConfig::default();
        config.wizard.bridge_settle_ms = 50;
        config.save_to_file(&path).unwrap();

        let loaded = FluxConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_redacted_masks_session_secrets() {
        let api = ApiConfig {
            session_cookie: Some("eyJhbGciOi".to_string()),
            username: Some("admin".to_string()),
            password: Some("hunter2".to_string()),
            ..ApiConfig::default()
        };

        let shown = api.redacted();
        assert_eq!(shown.session_cookie.as_deref(), Some("********"));
        assert_eq!(shown.password.as_deref(), Some("********"));
        assert_eq!(shown.username.as_deref(), Some("admin"));
        assert_eq!(ApiConfig::default().redacted(), ApiConfig::default());
    }
}
