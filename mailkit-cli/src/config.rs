use anyhow::{Context, Result};
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use mailkit_core::PipelineConfig;
use mailkit_core::config::{ImageOptions, InlineOptions, LintOptions, MjmlOptions, PathsConfig};

pub const DEFAULT_CONFIG_FILE: &str = "./mailkit.toml";

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MailkitConfig {
    /// Preview server settings
    pub server: ServerConfig,
    /// Source watcher settings
    pub watch: WatchConfig,
    /// Project layout
    pub paths: PathsConfig,
    pub images: ImageOptions,
    pub mjml: MjmlOptions,
    pub inline: InlineOptions,
    pub lint: LintOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host for dev server
    pub host: String,
    /// Port for dev server
    pub port: u16,
    /// Open browser automatically
    pub open: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period before a batch of changes triggers a rebuild
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

impl MailkitConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (MAILKIT_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let explicit = args.try_get_one::<String>("config").unwrap_or(None);
        let config_file = explicit.map_or(DEFAULT_CONFIG_FILE, String::as_str);

        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        builder = builder.add_source(ConfigBuilder::try_from(&Self::default())?);

        // 2. Add configuration file; only a file named on the command line must exist
        if explicit.is_some() || Path::new(config_file).exists() {
            builder = builder.add_source(File::with_name(config_file).required(explicit.is_some()));
        }

        // 3. Add environment variables with MAILKIT_ prefix
        builder = builder.add_source(
            Environment::with_prefix("MAILKIT")
                .prefix_separator("_")
                .separator("__"), // Use double underscore for nested keys
        );

        // 4. Override with CLI arguments that are defined for this command
        let mut cli_overrides = HashMap::new();
        if let Some(host) = args.try_get_one::<String>("host").unwrap_or(None) {
            cli_overrides.insert("server.host".to_string(), host.clone());
        }
        if let Some(port) = args.try_get_one::<u16>("port").unwrap_or(None) {
            cli_overrides.insert("server.port".to_string(), port.to_string());
        }
        if args.try_get_one::<bool>("open").unwrap_or(None) == Some(&true) {
            cli_overrides.insert("server.open".to_string(), "true".to_string());
        }

        for (key, value) in cli_overrides {
            builder = builder.set_override(key, value)?;
        }

        let config = builder
            .build()
            .with_context(|| format!("Failed to load configuration from {config_file}"))?;
        Ok(config.try_deserialize()?)
    }

    /// The sections mailkit-core consumes.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            paths: self.paths.clone(),
            images: self.images.clone(),
            mjml: self.mjml.clone(),
            inline: self.inline.clone(),
            lint: self.lint.clone(),
        }
    }
}
