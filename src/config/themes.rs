use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::ThemeMode;

const TMP_EXTENSION: &str = "toml.tmp";

#[derive(Debug, Serialize, Deserialize)]
struct ThemeRecord {
    mode: ThemeMode,
}

/// Remembers the last theme the user picked across sessions.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
    fallback: ThemeMode,
}

impl ThemeStore {
    pub fn new(path: PathBuf, fallback: ThemeMode) -> Self {
        Self { path, fallback }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored preference, or the configured default when nothing usable
    /// has been saved yet.
    pub fn load(&self) -> ThemeMode {
        match self.read() {
            Ok(Some(mode)) => mode,
            Ok(None) => self.fallback,
            Err(err) => {
                tracing::warn!(?err, "ignoring unreadable theme preference");
                self.fallback
            }
        }
    }

    pub fn save(&self, mode: ThemeMode) -> Result<()> {
        let raw = toml::to_string(&ThemeRecord { mode }).context("serialising theme preference")?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating state dir {}", parent.display()))?;
        }
        let tmp_path = self.path.with_extension(TMP_EXTENSION);
        fs::write(&tmp_path, raw)
            .with_context(|| format!("writing theme preference {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("persisting theme preference {}", self.path.display()))?;
        tracing::debug!(%mode, "theme preference saved");
        Ok(())
    }

    fn read(&self) -> Result<Option<ThemeMode>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading theme preference {}", self.path.display()))
            }
        };
        let record: ThemeRecord = toml::from_str(&raw)
            .with_context(|| format!("parsing theme preference {}", self.path.display()))?;
        Ok(Some(record.mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::temp_paths;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_fallback() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        let store = ThemeStore::new(paths.theme_file, ThemeMode::Dark);
        assert_eq!(store.load(), ThemeMode::Dark);
        Ok(())
    }

    #[test]
    fn saved_choice_survives_reload() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        let store = ThemeStore::new(paths.theme_file.clone(), ThemeMode::Light);
        store.save(ThemeMode::Dark)?;
        assert!(!paths.theme_file.with_extension(TMP_EXTENSION).exists());

        let reopened = ThemeStore::new(paths.theme_file, ThemeMode::Light);
        assert_eq!(reopened.load(), ThemeMode::Dark);
        Ok(())
    }

    #[test]
    fn corrupt_file_falls_back() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;
        fs::write(&paths.theme_file, "mode = \"sepia\"")?;
        let store = ThemeStore::new(paths.theme_file, ThemeMode::Light);
        assert_eq!(store.load(), ThemeMode::Light);
        Ok(())
    }
}
