// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::StateError;
use crate::metadata::read_track_identity;
use crate::naming::TARGET_EXTENSION;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// A track already present in a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingTrack {
    pub path: PathBuf,
    pub title: String,
    pub token: String,
    pub size: u64,
}

/// State of a bundle's tracks directory
#[derive(Debug, Clone)]
pub struct BundleState {
    pub tracks_dir: PathBuf,
    /// Tracks in file name order
    pub tracks: Vec<ExistingTrack>,
}

impl BundleState {
    /// Build the fetch-time filter that skips every track already present
    pub fn exclusion_filter(&self) -> ExclusionFilter {
        ExclusionFilter::from_tokens(self.tracks.iter().map(|track| track.token.clone()))
    }
}

/// Set of item tokens the remote fetch must skip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionFilter {
    tokens: BTreeSet<String>,
}

impl ExclusionFilter {
    pub fn from_tokens<I: IntoIterator<Item = String>>(tokens: I) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when an item with this token would be skipped
    pub fn excludes(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Render as a yt-dlp `--match-filter` expression
    ///
    /// The expression holds for items whose id is none of the collected
    /// tokens. An empty filter renders as `None` (fetch everything).
    pub fn to_match_filter(&self) -> Option<String> {
        if self.tokens.is_empty() {
            return None;
        }

        let conditions: Vec<String> = self
            .tokens
            .iter()
            .map(|token| format!("id!={}", token.replace('&', "\\&")))
            .collect();

        Some(conditions.join(" & "))
    }
}

fn is_track_file(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| !name.starts_with('.'));

    let audio = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TARGET_EXTENSION));

    visible && audio && path.is_file()
}

/// Scan a bundle's tracks directory and recover every track's identity
///
/// Creates the directory when it does not exist yet. Any track without a
/// readable identity token fails the whole scan: an append cannot
/// deduplicate against a track it cannot identify.
pub fn scan_tracks_dir(
    tracks_dir: &Path,
    reporter: &SharedProgressReporter,
) -> Result<BundleState, StateError> {
    reporter.report(ProgressEvent::ScanningBundle {
        tracks_dir: tracks_dir.to_path_buf(),
    });

    if !tracks_dir.exists() {
        std::fs::create_dir_all(tracks_dir).map_err(|e| StateError::CreateDirectoryFailed {
            path: tracks_dir.to_path_buf(),
            source: e,
        })?;

        reporter.report(ProgressEvent::ExistingTracksFound { count: 0 });

        return Ok(BundleState {
            tracks_dir: tracks_dir.to_path_buf(),
            tracks: Vec::new(),
        });
    }

    let entries = std::fs::read_dir(tracks_dir).map_err(|e| StateError::ReadDirectoryFailed {
        path: tracks_dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StateError::ReadDirectoryFailed {
            path: tracks_dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if is_track_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut tracks = Vec::with_capacity(paths.len());
    for path in paths {
        let identity = read_track_identity(&path)?;
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let title = identity.title.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        tracks.push(ExistingTrack {
            path,
            title,
            token: identity.token,
            size,
        });
    }

    reporter.report(ProgressEvent::ExistingTracksFound {
        count: tracks.len(),
    });

    Ok(BundleState {
        tracks_dir: tracks_dir.to_path_buf(),
        tracks,
    })
}
