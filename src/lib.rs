// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod acquire;
pub mod config;
pub mod convert;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod metadata;
pub mod naming;
pub mod progress;
pub mod state;
pub mod sync;
pub mod tool;

// Re-export main types for convenience
pub use acquire::{Collection, MatchedItem, RawItem, RawItems, WorkDir, reconcile};
pub use config::{SyncConfig, SyncMode, ToolPaths};
pub use error::{
    AcquisitionError, ConversionError, IdentityError, MetadataError, StateError, SyncError,
    TagError,
};
pub use identity::{
    decode_identity, encode_identity, extract_item_token, extract_playlist_token,
    strip_item_token,
};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use state::{BundleState, ExclusionFilter, scan_tracks_dir};
pub use sync::{SyncResult, sync_playlist};
pub use tool::{FetchRequest, Fetcher, Ffmpeg, Transcoder, YtDlp};
