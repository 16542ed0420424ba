// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::acquire::Collection;
use crate::error::MetadataError;
use crate::identity::playlist_url;

const COLLECTION_METADATA_FILENAME: &str = "collection.json";

/// Serializable summary of a bundle, rewritten after every sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub name: String,
    pub token: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub track_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl CollectionRecord {
    /// Create a record for a collection holding `track_count` tracks
    pub fn from_collection(collection: &Collection, track_count: usize) -> Self {
        Self {
            name: collection.name.clone(),
            token: collection.token.clone(),
            url: playlist_url(&collection.token),
            description: Some(collection.description.clone()).filter(|d| !d.is_empty()),
            track_count,
            updated_at: Utc::now(),
        }
    }
}

/// Write the collection record to the bundle directory
pub fn write_collection_metadata(
    collection: &Collection,
    track_count: usize,
    bundle_dir: &Path,
) -> Result<(), MetadataError> {
    let record = CollectionRecord::from_collection(collection, track_count);
    let path = bundle_dir.join(COLLECTION_METADATA_FILENAME);

    let json = serde_json::to_string_pretty(&record)?;
    std::fs::write(&path, json).map_err(|e| MetadataError::WriteFailed { path, source: e })
}

/// Read the collection record from the bundle directory
#[cfg(test)]
pub(crate) fn read_collection_metadata(bundle_dir: &Path) -> Result<CollectionRecord, MetadataError> {
    let path = bundle_dir.join(COLLECTION_METADATA_FILENAME);

    let content = std::fs::read_to_string(&path).map_err(|e| MetadataError::ReadFailed {
        path: path.clone(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| MetadataError::JsonParseFailed { path, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_collection(description: &str) -> Collection {
        Collection {
            name: "My Mix".to_string(),
            description: description.to_string(),
            token: "PLX".to_string(),
        }
    }

    #[test]
    fn from_collection_converts_fields() {
        let record = CollectionRecord::from_collection(&make_collection("Great tunes"), 4);

        assert_eq!(record.name, "My Mix");
        assert_eq!(record.token, "PLX");
        assert_eq!(record.url, "https://youtube.com/playlist?list=PLX");
        assert_eq!(record.description.as_deref(), Some("Great tunes"));
        assert_eq!(record.track_count, 4);
    }

    #[test]
    fn empty_description_is_omitted() {
        let record = CollectionRecord::from_collection(&make_collection(""), 0);
        assert!(record.description.is_none());
        assert!(!serde_json::to_string(&record).unwrap().contains("description"));
    }

    #[test]
    fn write_and_read_roundtrip() {
        let dir = tempdir().unwrap();

        write_collection_metadata(&make_collection("Great tunes"), 2, dir.path()).unwrap();
        let read_back = read_collection_metadata(dir.path()).unwrap();

        assert_eq!(read_back.name, "My Mix");
        assert_eq!(read_back.track_count, 2);
        assert!(read_back.updated_at <= Utc::now());
    }

    #[test]
    fn read_nonexistent_returns_error() {
        let dir = tempdir().unwrap();
        assert!(read_collection_metadata(dir.path()).is_err());
    }
}
