// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;

/// Events emitted during a playlist sync for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// An existing bundle's tracks directory is being scanned for identities
    ScanningBundle { tracks_dir: PathBuf },

    /// The bundle scan finished
    ExistingTracksFound { count: usize },

    /// The remote fetch is running
    Fetching {
        reference: String,
        /// Number of item tokens excluded from the fetch
        excluded: usize,
    },

    /// The remote fetch finished and the work directory was listed
    Fetched {
        audio_items: usize,
        sidecar_items: usize,
    },

    /// Collection name and token are known
    CollectionResolved { name: String, token: String },

    /// No collection-level sidecar was found; defaults are used
    CollectionSidecarMissing { token: String },

    /// An audio item has no sidecar description
    ItemSidecarMissing { title: String, token: String },

    /// A raw item was dropped before conversion
    ItemSkipped { filename: String, reason: String },

    /// Transcoding of an item is starting
    ConversionStarting {
        title: String,
        /// Index of this item in the conversion queue
        index: usize,
        /// Total number of items to convert
        total: usize,
    },

    /// An item was transcoded
    ConversionCompleted { title: String, bytes: u64 },

    /// Transcoding of an item failed; its raw source is kept
    ConversionFailed { title: String, error: String },

    /// The converted item exists but its raw source could not be deleted
    SourceCleanupFailed { title: String, error: String },

    /// Tagging a converted item or moving it into the bundle failed
    TaggingFailed { title: String, error: String },

    /// Manifest and description files were written
    BundleWritten { bundle_dir: PathBuf, track_count: usize },

    /// Sync operation completed
    SyncCompleted {
        added_count: usize,
        existing_count: usize,
        failed_count: usize,
    },
}

/// Trait for reporting progress events during synchronization.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
