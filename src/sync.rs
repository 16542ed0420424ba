// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use crate::acquire::{Collection, Reconciliation, WorkDir, reconcile};
use crate::config::{SyncConfig, SyncMode};
use crate::convert::convert_items;
use crate::error::{StateError, SyncError};
use crate::identity::extract_playlist_token;
use crate::manifest::{ManifestEntry, write_description, write_manifest};
use crate::metadata::write_collection_metadata;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::state::{ExclusionFilter, ExistingTrack, scan_tracks_dir};
use crate::tool::{FetchRequest, Fetcher, Transcoder};

/// Name of the directory holding a bundle's tracks
pub const TRACKS_DIR: &str = "tracks";

/// Result of a sync operation
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Bundle directory that was written
    pub bundle_dir: PathBuf,
    pub collection: Collection,
    /// Number of tracks added by this run
    pub added: usize,
    /// Number of tracks that were already in the bundle
    pub existing: usize,
    /// Number of items that were skipped or failed
    pub failed: usize,
    /// Details of failed items (title or file name, error message)
    pub failed_items: Vec<(String, String)>,
    /// Bytes added to the bundle by this run
    pub added_bytes: u64,
}

fn create_dir(path: &Path) -> Result<PathBuf, StateError> {
    std::fs::create_dir_all(path).map_err(|e| StateError::CreateDirectoryFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    std::fs::canonicalize(path).map_err(|e| StateError::ReadDirectoryFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// True when `path` exists and is not an empty directory
fn is_occupied(path: &Path) -> bool {
    match std::fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => path.exists(),
    }
}

/// Synchronize a remote playlist into a local bundle
///
/// This is the main entry point for the library. It:
/// 1. Derives the playlist token (aborting on a malformed reference)
/// 2. In append mode, scans the bundle and builds the exclusion filter
/// 3. Fetches raw items into a temporary work directory
/// 4. Reconciles audio items with their sidecars
/// 5. Transcodes and tags each item, then moves it into the bundle's tracks
///    directory, so only fully tagged tracks ever appear there
/// 6. Writes the manifest, description and collection record
///
/// Item-level problems are reported and collected in the result; only
/// problems that make the whole run unsafe are returned as errors. The work
/// directory is removed on every exit path.
pub async fn sync_playlist<F: Fetcher, T: Transcoder>(
    fetcher: &F,
    transcoder: &T,
    config: &SyncConfig,
    reporter: SharedProgressReporter,
) -> Result<SyncResult, SyncError> {
    config.validate()?;
    let playlist_token = extract_playlist_token(&config.reference)?;

    let root = create_dir(&config.root)?;

    // An unidentifiable track must abort the append before anything is fetched
    let (existing, exclusion): (Vec<ExistingTrack>, ExclusionFilter) = match config.mode {
        SyncMode::Append => {
            let state = scan_tracks_dir(&root.join(TRACKS_DIR), &reporter)?;
            let exclusion = state.exclusion_filter();
            (state.tracks, exclusion)
        }
        SyncMode::Create => (Vec::new(), ExclusionFilter::default()),
    };

    let work_dir = WorkDir::create_in(&root)?;

    reporter.report(ProgressEvent::Fetching {
        reference: config.reference.clone(),
        excluded: exclusion.len(),
    });

    fetcher
        .fetch(&FetchRequest {
            reference: &config.reference,
            destination: work_dir.path(),
            exclusion: (!exclusion.is_empty()).then_some(&exclusion),
        })
        .await?;

    let raw = work_dir.scan()?;

    reporter.report(ProgressEvent::Fetched {
        audio_items: raw.audio().count(),
        sidecar_items: raw.sidecars().count(),
    });

    let Reconciliation {
        items,
        collection,
        skipped,
    } = reconcile(&raw, &playlist_token, &reporter)?;

    let bundle_dir = match config.mode {
        SyncMode::Create => {
            let bundle_dir = root.join(&collection.name);
            if is_occupied(&bundle_dir) {
                return Err(SyncError::BundleExists { path: bundle_dir });
            }
            create_dir(&bundle_dir)?
        }
        SyncMode::Append => root,
    };
    let tracks_dir = create_dir(&bundle_dir.join(TRACKS_DIR))?;

    let conversion = convert_items(
        transcoder,
        items,
        &collection,
        work_dir.path(),
        &tracks_dir,
        &reporter,
    )
    .await;

    // Every raw source has been consumed; release the work directory
    drop(raw);
    drop(work_dir);

    let mut failed_items = skipped;
    failed_items.extend(conversion.failed);

    let added_bytes = conversion.total_bytes;
    let added: Vec<ManifestEntry> = conversion
        .converted
        .into_iter()
        .map(|item| ManifestEntry {
            path: item.path,
            title: item.title,
            token: item.token,
            size: item.size,
        })
        .collect();

    let existing_count = existing.len();
    let added_count = added.len();

    let entries: Vec<ManifestEntry> = existing
        .into_iter()
        .map(ManifestEntry::from)
        .chain(added)
        .collect();

    write_manifest(&bundle_dir, &collection, &entries)?;
    write_description(&bundle_dir, &collection, &entries)?;
    write_collection_metadata(&collection, entries.len(), &bundle_dir)?;

    reporter.report(ProgressEvent::BundleWritten {
        bundle_dir: bundle_dir.clone(),
        track_count: entries.len(),
    });

    reporter.report(ProgressEvent::SyncCompleted {
        added_count,
        existing_count,
        failed_count: failed_items.len(),
    });

    Ok(SyncResult {
        bundle_dir,
        collection,
        added: added_count,
        existing: existing_count,
        failed: failed_items.len(),
        failed_items,
        added_bytes,
    })
}
