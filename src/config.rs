//! Locating and loading `tablecalc.toml`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tablecalc_engine::EngineConfig;
use tracing::debug;

pub(crate) fn default_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tablecalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("tablecalc.toml");
    Some(path)
}

/// Parse engine settings from TOML text. Missing keys keep their defaults.
pub(crate) fn parse_config(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content)?;
    if config.max_nesting_depth == 0 {
        anyhow::bail!("max_nesting_depth must be at least 1");
    }
    Ok(config)
}

pub(crate) fn load_config_file(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("invalid config {}", path.display()))
}

/// An explicit `--config` file wins; otherwise the user config is read when
/// present and not disabled.
pub(crate) fn load_config(explicit: Option<&Path>, no_default_config: bool) -> Result<EngineConfig> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }
    if no_default_config {
        return Ok(EngineConfig::default());
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            debug!(path = %path.display(), "loading user config");
            load_config_file(&path)
        }
        _ => Ok(EngineConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablecalc_engine::{EmptyExtremum, EmptyProduct};

    #[test]
    fn default_config_path_names_the_config_file() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("tablecalc.toml"));
            assert_eq!(default_config_path(), Some(path));
        }
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config("strict_references = true\n").unwrap();
        assert!(config.strict_references);
        assert_eq!(config.max_nesting_depth, 32);
        assert_eq!(config.empty_product, EmptyProduct::Zero);
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            "max_nesting_depth = 8\nempty_min_max = \"error\"\nempty_product = \"one\"\n",
        )
        .unwrap();
        assert_eq!(config.max_nesting_depth, 8);
        assert_eq!(config.empty_min_max, EmptyExtremum::Error);
        assert_eq!(config.empty_product, EmptyProduct::One);
    }

    #[test]
    fn test_bad_config_is_rejected() {
        assert!(parse_config("max_nesting_depth = 0").is_err());
        assert!(parse_config("empty_product = \"maybe\"").is_err());
        assert!(parse_config("max_nesting_depth = \"deep\"").is_err());
    }

    #[test]
    fn test_explicit_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "max_nesting_depth = 4\n").unwrap();
        let config = load_config(Some(&path), true).unwrap();
        assert_eq!(config.max_nesting_depth, 4);
        assert!(load_config(Some(&dir.path().join("missing.toml")), false).is_err());
    }

    #[test]
    fn test_no_default_config() {
        assert_eq!(load_config(None, true).unwrap(), EngineConfig::default());
    }
}
