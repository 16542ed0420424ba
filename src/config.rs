// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use crate::error::SyncError;

/// How a run treats its target directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Allocate `<root>/<collection name>/` and fill it
    Create,
    /// Add missing items to the existing bundle at `root`
    Append,
}

/// Everything one sync run needs to know
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Parent directory for `Create`, the bundle directory for `Append`
    pub root: PathBuf,
    /// Playlist reference handed to the fetcher
    pub reference: String,
    pub mode: SyncMode,
}

impl SyncConfig {
    pub fn create(root: impl Into<PathBuf>, reference: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            reference: reference.into(),
            mode: SyncMode::Create,
        }
    }

    pub fn append(bundle_dir: impl Into<PathBuf>, reference: impl Into<String>) -> Self {
        Self {
            root: bundle_dir.into(),
            reference: reference.into(),
            mode: SyncMode::Append,
        }
    }

    /// Reject configurations that cannot run before touching anything
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.reference.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "playlist reference is empty".to_string(),
            ));
        }

        if self.root.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig("target path is empty".to_string()));
        }

        if self.mode == SyncMode::Append && !self.root.is_dir() {
            return Err(SyncError::InvalidConfig(format!(
                "bundle directory {} does not exist",
                self.root.display()
            )));
        }

        Ok(())
    }
}

/// Locations of the external executables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            yt_dlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_config_accepts_missing_root() {
        let dir = tempdir().unwrap();
        let config = SyncConfig::create(dir.path().join("new"), "https://x/?list=PL1");
        assert_eq!(config.mode, SyncMode::Create);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_reference_is_rejected() {
        let dir = tempdir().unwrap();
        let config = SyncConfig::create(dir.path(), "   ");
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn append_requires_existing_bundle() {
        let dir = tempdir().unwrap();

        let missing = SyncConfig::append(dir.path().join("absent"), "https://x/?list=PL1");
        assert!(missing.validate().is_err());

        let present = SyncConfig::append(dir.path(), "https://x/?list=PL1");
        assert!(present.validate().is_ok());
    }

    #[test]
    fn default_tools_resolve_on_path() {
        let tools = ToolPaths::default();
        assert_eq!(tools.yt_dlp, PathBuf::from("yt-dlp"));
        assert_eq!(tools.ffmpeg, PathBuf::from("ffmpeg"));
    }
}
