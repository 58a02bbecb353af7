use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};
use crate::layer::LayerBuilder;

pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// layer manifest stored as TOML
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// compression applied when writing the layer to disk
    #[serde(default)]
    pub compression: Compression,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zstd_level: Option<i32>,
    /// source groups, in registration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntryConfig>,
}

/// one registration: files and the extraction path they land at
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfig {
    pub files: Vec<PathBuf>,
    pub path: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Zstd,
}

impl EntryConfig {
    pub fn new(files: Vec<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            files,
            path: path.into(),
        }
    }
}

impl LayerConfig {
    /// load a manifest, resolving relative source paths against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let mut config: LayerConfig = toml::from_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }

    /// make relative source paths relative to `base`
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for entry in &mut self.entries {
            for file in &mut entry.files {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
    }

    pub fn add_entry(&mut self, files: Vec<PathBuf>, path: impl Into<String>) {
        self.entries.push(EntryConfig::new(files, path));
    }

    /// effective zstd level, if the layer is to be compressed
    pub fn zstd_level(&self) -> Option<i32> {
        match self.compression {
            Compression::None => None,
            Compression::Zstd => Some(self.zstd_level.unwrap_or(DEFAULT_ZSTD_LEVEL)),
        }
    }

    /// register every entry, in order, on a fresh builder
    pub fn to_builder(&self) -> Result<LayerBuilder> {
        self.entries
            .iter()
            .try_fold(LayerBuilder::new(), |builder, entry| {
                builder.register(entry.files.iter().cloned(), &entry.path)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::tempdir;

    #[test]
    fn test_config_toml_roundtrip() {
        let mut config = LayerConfig {
            compression: Compression::Zstd,
            zstd_level: Some(9),
            entries: vec![],
        };
        config.add_entry(vec!["/build/app.jar".into()], "/app");
        config.add_entry(vec!["/build/lib".into(), "/build/res".into()], "/app/lib");

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: LayerConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_minimal_toml() {
        let toml_str = r#"
[[entries]]
files = ["app.jar"]
path = "/app"
"#;
        let config: LayerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.compression, Compression::None);
        assert_eq!(config.zstd_level(), None);
        assert_eq!(config.entries.len(), 1);
    }

    #[test]
    fn test_zstd_level_default() {
        let config: LayerConfig = toml::from_str("compression = \"zstd\"").unwrap();
        assert_eq!(config.zstd_level(), Some(DEFAULT_ZSTD_LEVEL));
    }

    #[test]
    fn test_unknown_compression_rejected() {
        let err = toml::from_str::<LayerConfig>("compression = \"gzip\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("layer.toml");
        std::fs::write(
            &manifest,
            r#"
[[entries]]
files = ["target/app.jar", "/abs/lib"]
path = "/app"
"#,
        )
        .unwrap();

        let config = LayerConfig::load(&manifest).unwrap();
        assert_eq!(
            config.entries[0].files,
            vec![dir.path().join("target/app.jar"), PathBuf::from("/abs/lib")]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("layer.toml");
        let mut config = LayerConfig::default();
        config.add_entry(vec!["/x/y".into()], "/z");

        config.save(&manifest).unwrap();
        assert_eq!(LayerConfig::load(&manifest).unwrap(), config);
    }

    #[test]
    fn test_to_builder_keeps_order() {
        let mut config = LayerConfig::default();
        config.add_entry(vec!["/b".into()], "/one");
        config.add_entry(vec!["/a".into()], "/two");

        let builder = config.to_builder().unwrap();
        assert_eq!(
            builder.source_files(),
            vec![PathBuf::from("/b"), PathBuf::from("/a")]
        );
    }

    #[test]
    fn test_to_builder_rejects_bad_path() {
        let mut config = LayerConfig::default();
        config.add_entry(vec!["/b".into()], "relative");
        assert!(matches!(config.to_builder(), Err(Error::InvalidPath(_))));
    }
}
