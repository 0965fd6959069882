use std::env;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub calculation: CalculationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationSettings {
    pub model_version: String,
    pub environment_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

/// Per-process context handed to the calculation entry point.
///
/// Constructed once at startup and passed explicitly; the engine keeps no
/// global mutable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationContext {
    pub model_version: String,
    pub environment_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            calculation: CalculationSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for CalculationSettings {
    fn default() -> Self {
        CalculationSettings {
            model_version: "1.0.0".to_string(),
            environment_id: "local".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let _settings = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        Ok(Settings {
            calculation: CalculationSettings {
                model_version: env::var("MODEL_VERSION")
                    .unwrap_or_else(|_| "1.0.0".to_string()),
                environment_id: env::var("ENVIRONMENT_ID")
                    .unwrap_or_else(|_| "local".to_string()),
            },
            logging: LoggingSettings {
                level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }

    pub fn context(&self) -> CalculationContext {
        CalculationContext {
            model_version: self.calculation.model_version.clone(),
            environment_id: self.calculation.environment_id.clone(),
        }
    }
}
