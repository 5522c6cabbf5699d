//! Settings file loader for the `.qsrunner/` directory.
//!
//! The only file read today is `.qsrunner/config.toml`, holding:
//! - `[tool]`: program name and optional explicit path of the external tool
//! - `[defaults]`: initial values for the form configuration

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppSettings;
use crate::invocation::arguments::check_parameters;
use std::path::Path;

/// Name of the settings directory looked up under the root.
pub const SETTINGS_DIR: &str = ".qsrunner";

/// Loads settings from `<root>/.qsrunner/config.toml`.
///
/// # Arguments
///
/// * `root` - Directory containing the `.qsrunner/` folder
///
/// # Returns
///
/// The parsed settings. A missing directory or file yields the built-in
/// defaults rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML
/// - The file names an empty program or form defaults the tool rejects
pub async fn load_settings(root: &Path) -> ConfigResult<AppSettings> {
    let config_path = root.join(SETTINGS_DIR).join("config.toml");

    if !config_path.exists() {
        return Ok(AppSettings::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let settings: AppSettings =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    if settings.tool.program.trim().is_empty() {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "tool.program must not be empty".to_string(),
        });
    }

    check_parameters(&settings.defaults).map_err(|e| ConfigError::InvalidConfig {
        path: config_path.clone(),
        reason: e.to_string(),
    })?;

    tracing::debug!(path = %config_path.display(), "Loaded settings");

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qs_protocol::config_models::{PaperSize, ToolKind, Track};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_settings(root: &Path, content: &str) {
        let dir = root.join(SETTINGS_DIR);
        fs::create_dir_all(&dir).expect("Failed to create .qsrunner");
        fs::write(dir.join("config.toml"), content).expect("Failed to write config.toml");
    }

    #[tokio::test]
    async fn test_load_settings_full_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_settings(
            dir.path(),
            r#"
[tool]
program = "ao"
path = "/opt/ao/bin/agent-orange"

[defaults]
paper_size = "LEGAL"
tool_kind = "text"
strips_per_page = 12.0
blend_duration = 0.5
shade_option_index = 2
interpret_tags = true
open_when_finished = true

[[defaults.tracks]]
id = "1"
label = "Music"
"#,
        );

        let settings = load_settings(dir.path()).await.expect("Failed to load settings");

        assert_eq!(settings.tool.program, "ao");
        assert_eq!(
            settings.tool.path,
            Some(PathBuf::from("/opt/ao/bin/agent-orange"))
        );
        assert_eq!(settings.defaults.paper_size, PaperSize::Legal);
        assert_eq!(settings.defaults.tool_kind, ToolKind::Text);
        assert_eq!(settings.defaults.strips_per_page, 12.0);
        assert_eq!(settings.defaults.blend_duration, 0.5);
        assert_eq!(settings.defaults.shade_option_index, 2);
        assert!(settings.defaults.interpret_tags);
        assert!(settings.defaults.open_when_finished);
        assert!(!settings.defaults.print_frames);
        assert_eq!(settings.defaults.tracks, vec![Track::new("1", "Music")]);
    }

    /// A root without `.qsrunner/` gives built-in defaults.
    #[tokio::test]
    async fn test_load_settings_missing_directory() {
        let dir = tempdir().expect("Failed to create temp dir");

        let settings = load_settings(dir.path())
            .await
            .expect("Should handle missing .qsrunner");

        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.tool.program, "agent-orange");
        assert!(settings.tool.path.is_none());
    }

    #[tokio::test]
    async fn test_load_settings_partial_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_settings(dir.path(), "[defaults]\nprint_frames = true\n");

        let settings = load_settings(dir.path())
            .await
            .expect("Should handle partial settings");

        assert_eq!(settings.tool.program, "agent-orange");
        assert!(settings.defaults.print_frames);
        assert_eq!(settings.defaults.paper_size, PaperSize::Letter);
    }

    #[tokio::test]
    async fn test_load_settings_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_settings(dir.path(), "[tool\nprogram = ");

        let result = load_settings(dir.path()).await;

        if let Err(ConfigError::TomlParse { path, .. }) = result {
            assert!(path.ends_with("config.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_settings_unknown_paper_size() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_settings(dir.path(), "[defaults]\npaper_size = \"FOLIO\"\n");

        let result = load_settings(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
    }

    #[tokio::test]
    async fn test_load_settings_rejects_empty_program() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_settings(dir.path(), "[tool]\nprogram = \"  \"\n");

        let result = load_settings(dir.path()).await;

        if let Err(ConfigError::InvalidConfig { reason, .. }) = result {
            assert!(reason.contains("tool.program"));
        } else {
            panic!("Expected InvalidConfig error");
        }
    }

    #[tokio::test]
    async fn test_load_settings_rejects_bad_defaults() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_settings(dir.path(), "[defaults]\nstrips_per_page = 0.0\n");

        let result = load_settings(dir.path()).await;

        if let Err(ConfigError::InvalidConfig { reason, .. }) = result {
            assert!(reason.contains("strips"));
        } else {
            panic!("Expected InvalidConfig error");
        }
    }
}
