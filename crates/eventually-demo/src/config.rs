use eventually_logging::LogFormat;
use eventually_poll::WaitConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Where the simulated session writes its events
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// SQLite file; the in-memory log is used when unset
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    /// Delay between steps of the simulated agent turn
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// Number of tool invocations in the turn
    #[serde(default = "default_tool_calls")]
    pub tool_calls: usize,
}

fn default_step_delay_ms() -> u64 {
    50
}

fn default_tool_calls() -> usize {
    2
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
            tool_calls: default_tool_calls(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub wait: WaitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl Config {
    /// Load configuration with layered approach:
    /// 1. `.env` file in the working directory
    /// 2. Local file: ./eventually-demo.toml (optional)
    /// 3. Environment variables with EVENTUALLY_DEMO__ prefix (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("eventually-demo").required(false))
            .add_source(config::Environment::with_prefix("EVENTUALLY_DEMO").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.wait.validate()?;
        Ok(config)
    }

    #[cfg(test)]
    fn from_toml(document: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
