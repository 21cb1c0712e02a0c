//! Gateway configuration.
//!
//! [`GatewayConfig`] is an immutable snapshot handed to the gateway at
//! construction time and swapped wholesale on reload. Nothing in the request
//! path reads configuration from anywhere else.
//!
//! # Example (TOML)
//!
//! ```toml
//! [gateway]
//! enabled = true
//! api_token = "0f9c...e1"
//!
//! [gateway.paths]
//! gated_segment = "/jsonapi/"
//! format_query_param = "_format"
//! exempt_prefixes = ["/admin/config/services/jsonapi/"]
//! login_path = "/user/login"
//!
//! [[gateway.applications]]
//! id = "a1b2c3d4"
//! name = "Mobile app"
//! method = "api_key"
//! mode = "header"
//! is_default = true
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::Application;

/// Root gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Global switch. When disabled, no request is ever gated.
    pub enabled: bool,

    /// Shared secret every credential envelope is compared against unless the
    /// selected application carries its own token.
    pub api_token: Option<String>,

    /// Which request paths are gated.
    pub paths: PathRules,

    /// Applications imported into an empty registry on first boot.
    pub applications: Vec<Application>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_token: None,
            paths: PathRules::default(),
            applications: Vec::new(),
        }
    }
}

/// Path applicability rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathRules {
    /// Requests whose URI contains this segment are gated.
    pub gated_segment: String,

    /// Requests carrying this query parameter are gated.
    pub format_query_param: String,

    /// URI prefixes that are never gated, even when otherwise matching.
    pub exempt_prefixes: Vec<String>,

    /// Login endpoint, always let through.
    pub login_path: String,
}

impl Default for PathRules {
    fn default() -> Self {
        Self {
            gated_segment: "/jsonapi/".to_string(),
            format_query_param: "_format".to_string(),
            exempt_prefixes: vec!["/admin/config/services/jsonapi/".to_string()],
            login_path: "/user/login".to_string(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl GatewayConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `api_token` is set but blank
    /// - the gated segment or format parameter is empty
    /// - the login path is not absolute
    /// - seeded applications have blank or duplicate ids
    /// - more than one seeded application is flagged default
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(token) = &self.api_token
            && token.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue(
                "api_token cannot be blank".to_string(),
            ));
        }

        if self.paths.gated_segment.is_empty() {
            return Err(ConfigError::InvalidValue(
                "paths.gated_segment cannot be empty".to_string(),
            ));
        }

        if self.paths.format_query_param.is_empty() {
            return Err(ConfigError::InvalidValue(
                "paths.format_query_param cannot be empty".to_string(),
            ));
        }

        if !self.paths.login_path.starts_with('/') {
            return Err(ConfigError::InvalidValue(format!(
                "paths.login_path must start with '/': '{}'",
                self.paths.login_path
            )));
        }

        let mut seen = HashSet::new();
        for app in &self.applications {
            if app.id.trim().is_empty() {
                return Err(ConfigError::Missing(format!(
                    "id for seeded application '{}'",
                    app.name
                )));
            }
            if !seen.insert(app.id.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "duplicate application id: '{}'",
                    app.id
                )));
            }
        }

        let defaults = self.applications.iter().filter(|a| a.is_default).count();
        if defaults > 1 {
            return Err(ConfigError::InvalidValue(format!(
                "{defaults} seeded applications are flagged default; at most one is allowed"
            )));
        }

        Ok(())
    }
}
