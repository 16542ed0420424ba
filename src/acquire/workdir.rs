// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::AcquisitionError;

const WORK_DIR_PREFIX: &str = ".plsync-";
const SIDECAR_SUFFIX: &str = ".description";

/// Suffixes of files a fetch leaves behind while still in progress
const INCOMPLETE_SUFFIXES: [&str; 2] = [".part", ".ytdl"];

/// Temporary directory that receives raw items for one run
///
/// The directory and everything left in it is deleted when the value is
/// dropped, whichever way the run ends.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Create a fresh work directory inside `parent`
    pub fn create_in(parent: &Path) -> Result<Self, AcquisitionError> {
        let dir = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| AcquisitionError::WorkDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// List the raw items currently in the directory, sorted by file name
    pub fn scan(&self) -> Result<RawItems<'_>, AcquisitionError> {
        let read_failed = |e: std::io::Error| AcquisitionError::WorkDirFailed {
            path: self.path().to_path_buf(),
            source: e,
        };

        let mut items = Vec::new();
        for entry in std::fs::read_dir(self.path()).map_err(read_failed)? {
            let entry = entry.map_err(read_failed)?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if INCOMPLETE_SUFFIXES
                .iter()
                .any(|suffix| file_name.ends_with(suffix))
            {
                continue;
            }

            items.push(RawItem {
                file_name: file_name.to_string(),
                path,
            });
        }

        items.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        Ok(RawItems { _dir: self, items })
    }
}

/// A file produced by the remote fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub path: PathBuf,
    pub file_name: String,
}

impl RawItem {
    /// Sidecars are the `.description` text files; everything else is audio
    pub fn is_sidecar(&self) -> bool {
        self.file_name.ends_with(SIDECAR_SUFFIX)
    }
}

/// Raw items of one work directory; cannot outlive it
#[derive(Debug)]
pub struct RawItems<'w> {
    _dir: &'w WorkDir,
    items: Vec<RawItem>,
}

impl<'w> RawItems<'w> {
    pub fn audio(&self) -> impl Iterator<Item = &RawItem> {
        self.items.iter().filter(|item| !item.is_sidecar())
    }

    pub fn sidecars(&self) -> impl Iterator<Item = &RawItem> {
        self.items.iter().filter(|item| item.is_sidecar())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
