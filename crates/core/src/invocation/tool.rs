//! Lookup of the external cuesheet executable.

use crate::config::models::ToolSettings;
use crate::invocation::error::{InvocationError, InvocationResult};
use std::path::{Path, PathBuf};

/// Executable name of the cuesheet tool.
pub const DEFAULT_PROGRAM: &str = "agent-orange";

/// Environment variable that may point at the tool.
pub const TOOL_ENV_VAR: &str = "QSRUNNER_TOOL";

/// Finds the external tool.
///
/// Lookup order:
/// 1. explicit path from settings
/// 2. `$QSRUNNER_TOOL`
/// 3. a file named `program` next to the running executable (bundled layout)
/// 4. `program` on `PATH`
///
/// An explicit path or environment value is final: if it does not name a
/// file, lookup fails instead of falling back to another copy of the tool.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    program: String,
    explicit_path: Option<PathBuf>,
    consult_env: bool,
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl ToolLocator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            explicit_path: None,
            consult_env: true,
        }
    }

    /// Build a locator from the `[tool]` settings table.
    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self {
            program: settings.program.clone(),
            explicit_path: settings.path.clone(),
            consult_env: true,
        }
    }

    /// Use this path before anything else.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// Skip the environment variable lookup.
    pub fn without_env(mut self) -> Self {
        self.consult_env = false;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Resolve the executable path.
    ///
    /// Has no side effects and does not depend on the requested output mode.
    ///
    /// # Errors
    ///
    /// `InvocationError::ToolNotFound` if a configured path is not a file or
    /// no candidate exists.
    pub fn resolve(&self) -> InvocationResult<PathBuf> {
        if let Some(path) = &self.explicit_path {
            return self.configured(path, "configured path");
        }

        if self.consult_env {
            if let Some(path) = std::env::var_os(TOOL_ENV_VAR).filter(|v| !v.is_empty()) {
                return self.configured(Path::new(&path), &format!("${TOOL_ENV_VAR}"));
            }
        }

        if let Some(path) = self.bundled_path() {
            return Ok(path);
        }

        which::which(&self.program).map_err(|_| InvocationError::ToolNotFound {
            program: self.program.clone(),
            reason: format!(
                "checked ${TOOL_ENV_VAR}, the directory of this executable and PATH"
            ),
        })
    }

    /// Accept a path the user named, or fail naming it.
    fn configured(&self, path: &Path, source: &str) -> InvocationResult<PathBuf> {
        if is_file(path) {
            return Ok(path.to_path_buf());
        }
        Err(InvocationError::ToolNotFound {
            program: self.program.clone(),
            reason: format!("{source} {} is not a file", path.display()),
        })
    }

    fn bundled_path(&self) -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        let candidate = exe.parent()?.join(&self.program);
        is_file(&candidate).then_some(candidate)
    }
}

fn is_file(path: &Path) -> bool {
    path.is_file()
}
