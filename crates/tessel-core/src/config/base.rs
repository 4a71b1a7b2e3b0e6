use std::sync::Arc;

use super::{compilation::CompilationConfig, grid::GridConfig};

/// Static mutex holding the global configuration, initialized as `None`.
static TESSEL_GLOBAL_CONFIG: spin::Mutex<Option<Arc<GlobalConfig>>> = spin::Mutex::new(None);

/// Global configuration of tessel: compilation logging and launch grid capacities.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    /// Configuration for compilation settings.
    #[serde(default)]
    pub compilation: CompilationConfig,

    /// Capacities of the launch grid the kernels are lowered for.
    #[serde(default)]
    pub grid: GridConfig,
}

impl GlobalConfig {
    /// Retrieves the current global configuration, loading it from the current directory if not set.
    ///
    /// If no configuration is set, it attempts to load one from `tessel.toml` or `Tessel.toml` in the
    /// current directory or its parents. If no file is found, a default configuration is used.
    /// Environment variables are applied on top.
    pub fn get() -> Arc<Self> {
        let mut state = TESSEL_GLOBAL_CONFIG.lock();

        match state.as_ref() {
            Some(config) => config.clone(),
            None => {
                let config = Arc::new(Self::from_current_dir().override_from_env());
                *state = Some(config.clone());
                config
            }
        }
    }

    /// Sets the global configuration to the provided value.
    ///
    /// # Panics
    /// Panics if the configuration has already been set or read, as it cannot be overridden.
    ///
    /// # Warning
    /// This method must be called at the start of the program, before any calls to `get`.
    pub fn set(config: Self) {
        let mut state = TESSEL_GLOBAL_CONFIG.lock();
        if state.is_some() {
            panic!("Cannot set the global configuration multiple times.");
        }
        *state = Some(Arc::new(config));
    }

    /// Overrides configuration fields based on environment variables.
    ///
    /// - `TESSEL_DEBUG_LOG`: `stdout`, `stderr`, `1`/`true` (log to `/tmp/tessel.log`),
    ///   `0`/`false` (disable) or a file path.
    /// - `TESSEL_GRID_LIMITS`: `x,y,z` capacities.
    pub fn override_from_env(mut self) -> Self {
        use super::compilation::CompilationLogLevel;

        if let Ok(val) = std::env::var("TESSEL_DEBUG_LOG") {
            self.compilation.logger.level = CompilationLogLevel::Full;

            match val.as_str() {
                "stdout" => self.compilation.logger.stdout = true,
                "stderr" => self.compilation.logger.stderr = true,
                "1" | "true" => self.compilation.logger.file = Some("/tmp/tessel.log".into()),
                "0" | "false" => self.compilation.logger.level = CompilationLogLevel::Disabled,
                file_path => self.compilation.logger.file = Some(file_path.into()),
            }
        }

        if let Ok(val) = std::env::var("TESSEL_GRID_LIMITS") {
            match GridConfig::parse_limits(&val) {
                Some(limits) => self.grid.limits = limits,
                None => log::warn!("Ignoring malformed TESSEL_GRID_LIMITS={val:?}, expected x,y,z"),
            }
        }

        self
    }

    // Loads configuration from `tessel.toml` or `Tessel.toml` in the current directory or its parents.
    //
    // Traverses up the directory tree until a valid configuration file is found or the root is reached.
    // Returns a default configuration if no file is found.
    fn from_current_dir() -> Self {
        let Ok(mut dir) = std::env::current_dir() else {
            return Self::default();
        };

        loop {
            for name in ["tessel.toml", "Tessel.toml"] {
                if let Some(config) = Self::from_file_path(dir.join(name)) {
                    return config;
                }
            }

            if !dir.pop() {
                break;
            }
        }

        Self::default()
    }

    // Loads configuration from a specified file path.
    fn from_file_path<P: AsRef<std::path::Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).ok()?;

        match Self::from_toml(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("Ignoring {}: {err}", path.display());
                None
            }
        }
    }

    /// Parse a configuration from the content of a `tessel.toml` file.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridLimits, config::compilation::CompilationLogLevel};

    #[test]
    fn missing_sections_use_defaults() {
        let config = GlobalConfig::from_toml("").unwrap();

        assert_eq!(config.grid.limits, GridLimits::default());
        assert!(matches!(
            config.compilation.logger.level,
            CompilationLogLevel::Disabled
        ));
    }

    #[test]
    fn sections_are_read() {
        let config = GlobalConfig::from_toml(
            r#"
            [compilation.logger]
            level = "full"
            stdout = true

            [grid.limits]
            x = 1024
            y = 64
            z = 64
            "#,
        )
        .unwrap();

        assert_eq!(
            config.grid.limits,
            GridLimits {
                x: 1024,
                y: 64,
                z: 64
            }
        );
        assert!(config.compilation.logger.stdout);
        assert!(matches!(
            config.compilation.logger.level,
            CompilationLogLevel::Full
        ));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = GlobalConfig::default();
        let content = toml::to_string_pretty(&config).unwrap();

        let decoded = GlobalConfig::from_toml(&content).unwrap();
        assert_eq!(decoded.grid.limits, config.grid.limits);
    }
}
