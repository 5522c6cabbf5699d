//! Settings models that aggregate the tool location and form defaults.

use qs_protocol::config_models::Configuration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::invocation::tool::DEFAULT_PROGRAM;

/// Where to find the external cuesheet tool.
///
/// # Example
///
/// ```toml
/// [tool]
/// program = "agent-orange"
/// path = "/opt/agent-orange/bin/agent-orange"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolSettings {
    /// Executable name looked up next to the binary and on `PATH`.
    #[serde(default = "default_program")]
    pub program: String,

    /// Explicit executable path. Takes precedence over every other lookup.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_program() -> String {
    DEFAULT_PROGRAM.to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            path: None,
        }
    }
}

/// Unified settings loaded from `.qsrunner/config.toml`.
///
/// # Example
///
/// ```rust,no_run
/// use qs_core::config::loader::load_settings;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = load_settings(Path::new(".")).await?;
/// println!("Tool program: {}", settings.tool.program);
/// # Ok(())
/// # }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub tool: ToolSettings,

    /// Initial form values; every field is optional in the file.
    #[serde(default)]
    pub defaults: Configuration,
}
