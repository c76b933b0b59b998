//! Configuration system

use std::path::Path;

pub use serde::{Serialize, Deserialize};

/// Configuration trait
///
/// The file format is picked from the extension: `.toml` or `.ron`.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => Self::from_toml_str(&contents),
            ConfigFormat::Ron => Self::from_ron_str(&contents),
        }
    }

    /// Load configuration from file, or `None` if there is no file at `path`
    ///
    /// Does not log, so it can run before the logger is initialized.
    fn load_if_present(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Load configuration from file, falling back to defaults if it is missing
    fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        Ok(Self::load_if_present(path)?.unwrap_or_else(|| {
            log::info!("No config at {}, using defaults", path.display());
            Self::default()
        }))
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => self.to_toml_string()?,
            ConfigFormat::Ron => self.to_ron_string()?,
        };

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from RON text
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to pretty TOML
    fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Serialize configuration to pretty RON
    fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        name: String,
        level: u32,
    }

    impl Config for Sample {}

    fn scratch_path(file: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("rpg_engine_config_{}_{file}", std::process::id()))
    }

    #[test]
    fn test_extension_selects_format() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")).unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("dir/b.ron")).unwrap(), ConfigFormat::Ron);
        assert!(matches!(
            ConfigFormat::from_path(Path::new("c.json")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(ConfigFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let sample = Sample::from_toml_str("level = 7").unwrap();
        assert_eq!(sample, Sample { name: String::new(), level: 7 });
    }

    #[test]
    fn test_malformed_input_is_parse_error() {
        assert!(matches!(Sample::from_toml_str("level = ["), Err(ConfigError::Parse(_))));
        assert!(matches!(Sample::from_ron_str("(level: )"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_and_load_toml_file() {
        let path = scratch_path("sample.toml");
        let sample = Sample { name: "mira".into(), level: 3 };
        sample.save_to_file(&path).unwrap();
        let loaded = Sample::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_save_and_load_ron_file() {
        let path = scratch_path("sample.ron");
        let sample = Sample { name: "oswin".into(), level: 12 };
        sample.save_to_file(&path).unwrap();
        let loaded = Sample::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_missing_file() {
        let path = scratch_path("absent.toml");
        assert!(matches!(Sample::load_from_file(&path), Err(ConfigError::Io(_))));
        assert_eq!(Sample::load_or_default(&path).unwrap(), Sample::default());
        assert_eq!(Sample::load_if_present(&path).unwrap(), None);
    }

    #[test]
    fn test_load_if_present_reads_existing_file() {
        let path = scratch_path("present.toml");
        let sample = Sample { name: "tamsin".into(), level: 5 };
        sample.save_to_file(&path).unwrap();
        let loaded = Sample::load_if_present(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.unwrap(), Some(sample));
    }
}
